/*!
# Exchange Bus

Gossip of the locally best clustering between islands. Pushes are cheap and
non-blocking: an island only pushes when its best improved since the last push,
and only to peers whose previous send has completed. Incoming migrants are
re-evaluated on the local graph (objective and fingerprint are never trusted
from the wire) and offered to the population, where the diversity filter may
still reject them.
*/

use crate::core::graph::{Clustering, CsrGraph};
use crate::evolution::individual::Individual;
use crate::evolution::population::Population;
use crate::transport::MessageTransport;
use tracing::{debug, warn};

/// Per-island exchange state.
#[derive(Debug)]
pub struct Exchanger {
    previous_best_objective: f64,
}

impl Exchanger {
    pub fn new() -> Self {
        Exchanger {
            previous_best_objective: f64::NEG_INFINITY,
        }
    }

    /// Pushes the best individual to all peers, if it improved since the last
    /// push. Peers with an incomplete previous send are skipped.
    pub fn push_best<T: MessageTransport>(&mut self, transport: &mut T, population: &Population) {
        let Some(best) = population.best() else {
            return;
        };
        if best.objective <= self.previous_best_objective {
            return;
        }

        let buffer: Vec<u32> = best.partition_map.iter().map(|&c| c as u32).collect();
        for peer in 0..transport.size() {
            if peer == transport.rank() || !transport.send_complete(peer) {
                continue;
            }
            transport.send_nonblocking(peer, buffer.clone());
        }
        self.previous_best_objective = best.objective;
        debug!(objective = best.objective, "pushed best to peers");
    }

    /// Drains all pending migrants and inserts them into the population.
    pub fn recv_incoming<T: MessageTransport>(
        &mut self,
        transport: &mut T,
        graph: &mut CsrGraph,
        population: &mut Population,
    ) {
        for peer in 0..transport.size() {
            if peer == transport.rank() {
                continue;
            }
            while let Some(buffer) = transport.probe_and_recv(peer) {
                if buffer.len() != graph.number_of_nodes() {
                    warn!(
                        peer,
                        len = buffer.len(),
                        "dropping migrant with wrong clustering length"
                    );
                    continue;
                }
                let clustering: Clustering = buffer.into_iter().map(|c| c as usize).collect();
                let migrant = Individual::from_clustering(graph, &clustering);
                debug!(peer, objective = migrant.objective, "received migrant");
                population.insert(migrant);
            }
        }
    }
}

impl Default for Exchanger {
    fn default() -> Self {
        Self::new()
    }
}
