/*!
# Balanced k-way Partitioning Seam

The partitioning-guided combine and the mutation operator need a balanced k-way
partition of a (sub)graph as a diversification signal. Clustering quality does
not depend on this partition being optimal, so the engine only fixes the seam:
a [`KwayPartitioner`] produces a block assignment for `(k, epsilon)`. A heavy
multilevel partitioner can be plugged in from outside; the shipped default grows
regions by breadth-first search until they hit the imbalance-adjusted block
weight.
*/

use crate::core::graph::{CsrGraph, NodeId};
use crate::core::random::random_permutation;
use rand::rngs::StdRng;
use std::collections::VecDeque;

/// Produces balanced k-way block assignments.
pub trait KwayPartitioner {
    /// Partitions `graph` into up to `k` blocks with imbalance `epsilon`.
    ///
    /// Returns one block id in `[0, k)` per node. Implementations may return
    /// fewer than `k` non-empty blocks on small or disconnected graphs.
    fn partition(&self, graph: &CsrGraph, k: usize, epsilon: f64, rng: &mut StdRng) -> Vec<usize>;
}

/// Default partitioner: randomized breadth-first region growing.
#[derive(Debug, Default)]
pub struct RegionGrowingPartitioner;

impl KwayPartitioner for RegionGrowingPartitioner {
    fn partition(&self, graph: &CsrGraph, k: usize, epsilon: f64, rng: &mut StdRng) -> Vec<usize> {
        let n = graph.number_of_nodes();
        if n == 0 {
            return Vec::new();
        }
        if k <= 1 {
            return vec![0; n];
        }

        let total_weight = graph.total_node_weight().max(1);
        let block_limit = (((1.0 + epsilon) * total_weight as f64) / k as f64)
            .ceil()
            .max(1.0) as i64;

        let seeds = random_permutation(n, rng);
        let mut assignment = vec![usize::MAX; n];
        let mut queue: VecDeque<NodeId> = VecDeque::new();
        let mut seed_cursor = 0;
        let mut block = 0;
        let mut block_weight: i64 = 0;

        loop {
            let node = loop {
                match queue.pop_front() {
                    Some(candidate) if assignment[candidate] == usize::MAX => break Some(candidate),
                    Some(_) => continue,
                    None => {
                        while seed_cursor < n && assignment[seeds[seed_cursor]] != usize::MAX {
                            seed_cursor += 1;
                        }
                        break (seed_cursor < n).then(|| seeds[seed_cursor]);
                    }
                }
            };
            let Some(node) = node else { break };

            // close the block once it is full, unless it is the last one
            if block + 1 < k && block_weight > 0 && block_weight + graph.node_weight(node) > block_limit
            {
                block += 1;
                block_weight = 0;
                queue.clear();
            }

            assignment[node] = block;
            block_weight += graph.node_weight(node);
            for edge in graph.out_edges(node) {
                let target = graph.edge_target(edge);
                if assignment[target] == usize::MAX {
                    queue.push_back(target);
                }
            }
        }

        assignment
    }
}
