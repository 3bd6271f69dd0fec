/*!
# Message Transport

Abstraction over the inter-island communication layer. Islands push raw
clustering vectors to their peers without blocking, drain incoming buffers
without blocking, and use a small set of collectives (all-reduce, broadcast) to
agree on the pool size and the final winner.

Two implementations ship with the crate: [`SingleProcess`], the degenerate
single-island case where every operation is an identity, and
[`ChannelTransport`], which connects islands running on threads of one process
through crossbeam channels. A networked backend (for example MPI) can be
plugged in by implementing [`MessageTransport`].
*/

use crossbeam::channel::{Receiver, Sender, unbounded};

/// Communication endpoint of one island.
///
/// Collectives must be called by all islands in the same order; point-to-point
/// sends and receives never block.
pub trait MessageTransport {
    /// Rank of this island in `[0, size)`.
    fn rank(&self) -> usize;

    /// Number of islands.
    fn size(&self) -> usize;

    /// Sends a buffer to `peer` without blocking.
    fn send_nonblocking(&mut self, peer: usize, buf: Vec<u32>);

    /// Receives one pending buffer from `peer`, if any. Never blocks.
    fn probe_and_recv(&mut self, peer: usize) -> Option<Vec<u32>>;

    /// True when the previous send to `peer` has completed and a new one may
    /// be issued.
    fn send_complete(&self, _peer: usize) -> bool {
        true
    }

    /// All-reduce MAX over one f64 value.
    fn all_reduce_max(&mut self, value: f64) -> f64;

    /// All-reduce MIN over one u64 value.
    fn all_reduce_min(&mut self, value: u64) -> u64;

    /// Broadcasts `buf` from `root` to every island.
    fn broadcast(&mut self, root: usize, buf: &mut Vec<u32>);
}

/// Degenerate transport for a single island.
#[derive(Debug, Default)]
pub struct SingleProcess;

impl MessageTransport for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn size(&self) -> usize {
        1
    }

    fn send_nonblocking(&mut self, _peer: usize, _buf: Vec<u32>) {}

    fn probe_and_recv(&mut self, _peer: usize) -> Option<Vec<u32>> {
        None
    }

    fn all_reduce_max(&mut self, value: f64) -> f64 {
        value
    }

    fn all_reduce_min(&mut self, value: u64) -> u64 {
        value
    }

    fn broadcast(&mut self, _root: usize, _buf: &mut Vec<u32>) {}
}

enum CollectiveMessage {
    Value(u64),
    Buffer(Vec<u32>),
}

/// In-process transport connecting islands through unbounded channels.
///
/// Migrant buffers and collective messages travel on separate per-peer
/// channels, so draining migrants can never consume a collective message.
pub struct ChannelTransport {
    rank: usize,
    data_senders: Vec<Option<Sender<Vec<u32>>>>,
    data_receivers: Vec<Option<Receiver<Vec<u32>>>>,
    collective_senders: Vec<Option<Sender<CollectiveMessage>>>,
    collective_receivers: Vec<Option<Receiver<CollectiveMessage>>>,
}

impl ChannelTransport {
    /// Creates a fully connected group of `size` endpoints.
    pub fn create_group(size: usize) -> Vec<ChannelTransport> {
        let mut data_senders = vec![Vec::new(); size];
        let mut data_receivers: Vec<Vec<Option<Receiver<Vec<u32>>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();
        let mut collective_senders = vec![Vec::new(); size];
        let mut collective_receivers: Vec<Vec<Option<Receiver<CollectiveMessage>>>> =
            (0..size).map(|_| (0..size).map(|_| None).collect()).collect();

        for from in 0..size {
            for to in 0..size {
                if from == to {
                    data_senders[from].push(None);
                    collective_senders[from].push(None);
                    continue;
                }
                let (data_tx, data_rx) = unbounded();
                data_senders[from].push(Some(data_tx));
                data_receivers[to][from] = Some(data_rx);

                let (coll_tx, coll_rx) = unbounded();
                collective_senders[from].push(Some(coll_tx));
                collective_receivers[to][from] = Some(coll_rx);
            }
        }

        let mut group = Vec::with_capacity(size);
        for rank in 0..size {
            group.push(ChannelTransport {
                rank,
                data_senders: std::mem::take(&mut data_senders[rank]),
                data_receivers: std::mem::take(&mut data_receivers[rank]),
                collective_senders: std::mem::take(&mut collective_senders[rank]),
                collective_receivers: std::mem::take(&mut collective_receivers[rank]),
            });
        }
        group
    }

    fn recv_collective(&self, peer: usize) -> CollectiveMessage {
        self.collective_receivers[peer]
            .as_ref()
            .expect("no channel to self")
            .recv()
            .expect("transport peer disconnected during a collective")
    }
}

impl MessageTransport for ChannelTransport {
    fn rank(&self) -> usize {
        self.rank
    }

    fn size(&self) -> usize {
        self.data_senders.len()
    }

    fn send_nonblocking(&mut self, peer: usize, buf: Vec<u32>) {
        if let Some(sender) = &self.data_senders[peer] {
            // a closed peer just drops the migrant
            let _ = sender.send(buf);
        }
    }

    fn probe_and_recv(&mut self, peer: usize) -> Option<Vec<u32>> {
        self.data_receivers[peer]
            .as_ref()
            .and_then(|receiver| receiver.try_recv().ok())
    }

    fn all_reduce_max(&mut self, value: f64) -> f64 {
        for peer in 0..self.size() {
            if let Some(sender) = &self.collective_senders[peer] {
                sender
                    .send(CollectiveMessage::Value(value.to_bits()))
                    .expect("transport peer disconnected during a collective");
            }
        }
        let mut result = value;
        for peer in 0..self.size() {
            if peer == self.rank {
                continue;
            }
            match self.recv_collective(peer) {
                CollectiveMessage::Value(bits) => result = result.max(f64::from_bits(bits)),
                CollectiveMessage::Buffer(_) => {
                    panic!("collective sequence mismatch: expected a value, got a buffer")
                }
            }
        }
        result
    }

    fn all_reduce_min(&mut self, value: u64) -> u64 {
        for peer in 0..self.size() {
            if let Some(sender) = &self.collective_senders[peer] {
                sender
                    .send(CollectiveMessage::Value(value))
                    .expect("transport peer disconnected during a collective");
            }
        }
        let mut result = value;
        for peer in 0..self.size() {
            if peer == self.rank {
                continue;
            }
            match self.recv_collective(peer) {
                CollectiveMessage::Value(other) => result = result.min(other),
                CollectiveMessage::Buffer(_) => {
                    panic!("collective sequence mismatch: expected a value, got a buffer")
                }
            }
        }
        result
    }

    fn broadcast(&mut self, root: usize, buf: &mut Vec<u32>) {
        if self.rank == root {
            for peer in 0..self.size() {
                if let Some(sender) = &self.collective_senders[peer] {
                    sender
                        .send(CollectiveMessage::Buffer(buf.clone()))
                        .expect("transport peer disconnected during a collective");
                }
            }
        } else {
            match self.recv_collective(root) {
                CollectiveMessage::Buffer(received) => *buf = received,
                CollectiveMessage::Value(_) => {
                    panic!("collective sequence mismatch: expected a buffer, got a value")
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_process_identities() {
        let mut transport = SingleProcess;
        assert_eq!(transport.size(), 1);
        assert_eq!(transport.all_reduce_max(0.25), 0.25);
        assert_eq!(transport.all_reduce_min(9), 9);
        assert!(transport.probe_and_recv(0).is_none());
    }

    #[test]
    fn test_channel_group_point_to_point() {
        let mut group = ChannelTransport::create_group(2);
        let mut b = group.pop().expect("two endpoints");
        let mut a = group.pop().expect("two endpoints");

        a.send_nonblocking(1, vec![1, 2, 3]);
        assert_eq!(b.probe_and_recv(0), Some(vec![1, 2, 3]));
        assert_eq!(b.probe_and_recv(0), None);
    }
}
