/*!
# Label Propagation

Fast pre-coarsening for the Louvain method. The unconstrained variant moves each
node to the neighboring cluster it has the most edge weight to; the
size-constrained variant additionally rejects moves that would push the target
cluster's weighted size above a bound, which keeps the quotient graph balanced
enough for further coarsening.
*/

use crate::core::config::ClusteringConfig;
use crate::core::graph::{Clustering, CsrGraph, EdgeWeight, canonicalize};
use crate::core::random::random_permutation;
use rand::prelude::*;
use rand::rngs::StdRng;
use tracing::debug;

/// One level of unconstrained label propagation on the graph's partition.
///
/// Visits nodes in a fresh random permutation for up to
/// `lm_number_of_label_propagation_iterations` iterations, terminating early
/// when an iteration moves nothing. Ties between equally heavy clusters break
/// uniformly at random.
///
/// # Returns
/// The total number of node moves.
pub fn perform_label_propagation(
    config: &ClusteringConfig,
    graph: &mut CsrGraph,
    rng: &mut StdRng,
) -> usize {
    let n = graph.number_of_nodes();
    let permutation = random_permutation(n, rng);
    let mut number_of_moves = 0;

    // In the worst case a node has edges to all other clusters. A flat array
    // used as a hash map beats a real map here, the allocations inside the
    // loop dominate otherwise.
    let mut edge_weights_to_clusters: Vec<EdgeWeight> =
        vec![0; graph.partition_count_compute()];

    for _ in 0..config.lm_number_of_label_propagation_iterations {
        let moves_before = number_of_moves;

        for &node in &permutation {
            let old_cluster = graph.partition_index(node);
            let mut best_cluster = old_cluster;
            let mut best_weight: EdgeWeight = 0;

            // determine edge weights to neighboring clusters
            for edge in graph.out_edges(node) {
                let neighbor_cluster = graph.partition_index(graph.edge_target(edge));
                edge_weights_to_clusters[neighbor_cluster] += graph.edge_weight(edge);
            }

            // find the neighboring cluster we have the most weighted edges to
            for edge in graph.out_edges(node) {
                let neighbor_cluster = graph.partition_index(graph.edge_target(edge));
                let weight_to_cluster = edge_weights_to_clusters[neighbor_cluster];

                if weight_to_cluster > best_weight
                    || (weight_to_cluster == best_weight && rng.random_bool(0.5))
                {
                    best_weight = weight_to_cluster;
                    best_cluster = neighbor_cluster;
                }

                // reset for the next node
                edge_weights_to_clusters[neighbor_cluster] = 0;
            }

            if old_cluster != best_cluster {
                graph.set_partition_index(node, best_cluster);
                number_of_moves += 1;
            }
        }

        if moves_before == number_of_moves {
            break;
        }
    }

    debug!(moves = number_of_moves, "label propagation level finished");
    number_of_moves
}

/// Size-constrained label propagation.
///
/// Starts from singletons and only accepts a move when the target cluster's
/// weighted size (sum of member node weights) stays within `cluster_upperbound`.
/// The graph's own partition is left untouched.
///
/// # Returns
/// The canonicalized clustering and its number of clusters.
pub fn size_constrained_label_propagation(
    graph: &CsrGraph,
    cluster_upperbound: i64,
    iterations: u32,
    rng: &mut StdRng,
) -> (Clustering, usize) {
    let n = graph.number_of_nodes();
    let mut labels: Clustering = (0..n).collect();
    let mut cluster_weights: Vec<i64> = (0..n).map(|node| graph.node_weight(node)).collect();
    let permutation = random_permutation(n, rng);
    let mut edge_weights_to_clusters: Vec<EdgeWeight> = vec![0; n];

    for _ in 0..iterations {
        let mut moved = false;

        for &node in &permutation {
            let old_cluster = labels[node];
            let node_weight = graph.node_weight(node);
            let mut best_cluster = old_cluster;
            let mut best_weight: EdgeWeight = 0;

            for edge in graph.out_edges(node) {
                let neighbor_cluster = labels[graph.edge_target(edge)];
                edge_weights_to_clusters[neighbor_cluster] += graph.edge_weight(edge);
            }

            for edge in graph.out_edges(node) {
                let neighbor_cluster = labels[graph.edge_target(edge)];
                let weight_to_cluster = edge_weights_to_clusters[neighbor_cluster];
                let fits = neighbor_cluster == old_cluster
                    || cluster_weights[neighbor_cluster] + node_weight <= cluster_upperbound;

                if fits
                    && (weight_to_cluster > best_weight
                        || (weight_to_cluster == best_weight && rng.random_bool(0.5)))
                {
                    best_weight = weight_to_cluster;
                    best_cluster = neighbor_cluster;
                }

                edge_weights_to_clusters[neighbor_cluster] = 0;
            }

            if old_cluster != best_cluster {
                cluster_weights[old_cluster] -= node_weight;
                cluster_weights[best_cluster] += node_weight;
                labels[node] = best_cluster;
                moved = true;
            }
        }

        if !moved {
            break;
        }
    }

    let number_of_clusters = canonicalize(&mut labels);
    (labels, number_of_clusters)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builders::clique_pair_graph;
    use rand::SeedableRng;

    #[test]
    fn test_size_constraint_is_respected() {
        let g = clique_pair_graph(5).expect("valid size");
        let mut rng = StdRng::seed_from_u64(3);
        let (labels, k) = size_constrained_label_propagation(&g, 3, 5, &mut rng);

        assert_eq!(labels.len(), 10);
        assert!(k >= 4, "bound 3 forces at least 4 clusters, got {}", k);
        let mut sizes = vec![0i64; k];
        for &c in &labels {
            sizes[c] += 1;
        }
        assert!(sizes.iter().all(|&s| s <= 3));
    }
}
