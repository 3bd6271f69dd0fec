/*!
# Louvain Multilevel Optimizer

The Louvain method in two back-to-back multilevel phases. Phase A applies a
configurable number of label propagation levels to shrink the graph quickly;
phase B repeats modularity-maximizing node-move passes and contracts after each
level until a pass moves nothing. Uncoarsening projects the clustering back
level by level, refining with further node-move passes, and finally
canonicalizes the cluster ids on the finest graph.

The module also hosts [`local_search`], the single-graph optimizer shared by the
recombination operators, which can restrict moves to nodes sharing the frozen
secondary partition index.
*/

use crate::clustering::coarsening::{GraphHierarchy, contract_by_partition, current_level};
use crate::clustering::label_propagation::{
    perform_label_propagation, size_constrained_label_propagation,
};
use crate::clustering::modularity::ModularityMetric;
use crate::clustering::neighborhood::Neighborhood;
use crate::core::config::ClusteringConfig;
use crate::core::graph::{Clustering, CsrGraph};
use crate::core::random::random_permutation;
use rand::rngs::StdRng;
use std::collections::HashMap;
use tracing::{debug, warn};

/// Pass threshold of [`local_search`].
pub const LOCAL_SEARCH_EPS: f64 = 1e-4;

/// Runs the full multilevel Louvain method on the graph's partition.
///
/// With `start_with_singletons` every level resets each node to its own
/// cluster first; without it the current partition seeds the optimization
/// (used by operators that warm-start from a parent clustering).
///
/// # Returns
/// The number of clusters of the final, canonicalized partition.
pub fn perform_clustering(
    config: &ClusteringConfig,
    graph: &mut CsrGraph,
    start_with_singletons: bool,
    rng: &mut StdRng,
) -> usize {
    let mut hierarchy = GraphHierarchy::new();

    // phase A: a few levels of label propagation make the graph rapidly smaller
    for _ in 0..config.lm_number_of_label_propagation_levels {
        let level = current_level(&mut hierarchy, graph);
        if start_with_singletons {
            initialize_singleton_clusters(level);
        }

        let number_of_moves = if config.lm_cluster_coarsening_factor > 0 {
            let bound = config.effective_cluster_upperbound(level.total_node_weight());
            let (cluster_ids, _) = size_constrained_label_propagation(
                level,
                bound,
                config.lm_number_of_label_propagation_iterations,
                rng,
            );
            level.apply_partition(&cluster_ids);
            // the constrained variant always yields a usable clustering
            1
        } else {
            perform_label_propagation(config, level, rng)
        };

        if number_of_moves == 0 {
            break;
        }
        let (coarse, mapping) = contract_by_partition(level);
        hierarchy.push(mapping, coarse);
    }

    // phase B: the standard Louvain loop, maximize modularity then contract
    loop {
        let level = current_level(&mut hierarchy, graph);
        if start_with_singletons {
            initialize_singleton_clusters(level);
        }

        let number_of_moves = perform_node_moves(config, level, rng);
        if number_of_moves == 0 {
            break;
        }
        let (coarse, mapping) = contract_by_partition(level);
        hierarchy.push(mapping, coarse);
    }

    // uncoarsening: apply the clustering to the finer levels and refine
    while !hierarchy.is_empty() {
        hierarchy.pop_and_project(graph);
        let level = current_level(&mut hierarchy, graph);
        perform_node_moves(config, level, rng);
    }

    let number_of_clusters = graph.canonicalize_partition();
    debug!(clusters = number_of_clusters, "louvain finished");
    number_of_clusters
}

/// Resets every node to its own cluster.
pub fn initialize_singleton_clusters(graph: &mut CsrGraph) {
    let n = graph.number_of_nodes();
    for node in 0..n {
        graph.set_partition_index(node, node);
    }
    graph.set_partition_count(n);
}

/// Modularity-maximizing node-move passes over one graph.
///
/// Visits nodes in a random order (drawn once); a node is detached, all
/// neighboring clusters are scored with the modularity gain, and the node is
/// inserted into the best one, at worst back into its old cluster. Passes
/// repeat while the quality improves by more than
/// `lm_minimum_quality_improvement`.
///
/// # Returns
/// The number of node moves across all passes.
pub fn perform_node_moves(
    config: &ClusteringConfig,
    graph: &mut CsrGraph,
    rng: &mut StdRng,
) -> usize {
    graph.set_partition_count(graph.partition_count_compute());

    let permutation = random_permutation(graph.number_of_nodes(), rng);
    let mut neighborhood = Neighborhood::new();
    neighborhood.initialize(graph.partition_count());
    let mut objective = ModularityMetric::new(graph);
    let mut number_of_moves = 0;

    let mut current_quality = objective.quality();
    loop {
        let old_quality = current_quality;

        for &node in &permutation {
            neighborhood.update(graph, node);

            // only when other clusters exist can a move gain anything
            if neighborhood.number_of_neighboring_clusters() <= 1 {
                continue;
            }

            let old_cluster = graph.partition_index(node);
            let self_loop = graph.self_loop_weight(node);
            objective.remove_node(
                graph,
                node,
                old_cluster,
                neighborhood.edge_weight_to_cluster(old_cluster),
                self_loop,
            );

            let mut best_cluster = old_cluster;
            let mut best_gain = 0.0;
            for i in 0..neighborhood.number_of_neighboring_clusters() {
                let candidate = neighborhood.cluster_id(i);
                // the gain is not normalized, it is not the real improvement
                let gain =
                    objective.gain(node, candidate, neighborhood.edge_weight_to_cluster(candidate));
                if gain > best_gain {
                    best_gain = gain;
                    best_cluster = candidate;
                }
            }

            objective.insert_node(
                graph,
                node,
                best_cluster,
                neighborhood.edge_weight_to_cluster(best_cluster),
                self_loop,
            );
            if best_cluster != old_cluster {
                number_of_moves += 1;
            }
        }

        current_quality = objective.quality();
        // small numeric differences are possible on large graphs
        if current_quality < old_quality && (old_quality - current_quality) > f64::EPSILON {
            warn!(
                old_quality,
                current_quality, "modularity decreased during a node-move pass"
            );
        }
        if current_quality - old_quality <= config.lm_minimum_quality_improvement {
            break;
        }
    }

    number_of_moves
}

/// Node-move local search driven by an explicit clustering vector.
///
/// Applies `clustering` to the graph, optimizes with repeated passes until the
/// quality gain of a pass drops to `eps`, and writes the canonicalized result
/// back into `clustering`. With `constrained` set, a node only considers
/// neighbors that share its secondary partition index, which confines the
/// search to the overlap cluster the node is frozen into.
///
/// # Returns
/// The final modularity.
pub fn local_search(
    graph: &mut CsrGraph,
    clustering: &mut Clustering,
    constrained: bool,
    eps: f64,
    rng: &mut StdRng,
) -> f64 {
    assert_eq!(
        graph.number_of_nodes(),
        clustering.len(),
        "clustering length must match the node count"
    );

    graph.apply_partition(clustering);
    let mut metric = ModularityMetric::new(graph);
    let order = random_permutation(graph.number_of_nodes(), rng);

    let mut quality = metric.quality();
    loop {
        for &node in &order {
            let current_cluster = graph.partition_index(node);

            let mut neighborhood_edges: HashMap<usize, i64> = HashMap::new();
            neighborhood_edges.insert(current_cluster, 0);
            for edge in graph.out_edges(node) {
                let neighbor = graph.edge_target(edge);
                if constrained
                    && graph.secondary_partition_index(node)
                        != graph.secondary_partition_index(neighbor)
                {
                    continue;
                }
                *neighborhood_edges
                    .entry(graph.partition_index(neighbor))
                    .or_insert(0) += graph.edge_weight(edge);
            }

            let self_loop = graph.self_loop_weight(node);
            let weight_to_current = neighborhood_edges[&current_cluster];
            metric.remove_node(graph, node, current_cluster, weight_to_current, self_loop);

            let mut best_cluster = current_cluster;
            let mut best_weight = weight_to_current;
            let mut best_increase = 0.0;
            for (&candidate, &weight) in &neighborhood_edges {
                let increase = metric.gain(node, candidate, weight);
                if increase > best_increase {
                    best_increase = increase;
                    best_cluster = candidate;
                    best_weight = weight;
                }
            }

            metric.insert_node(graph, node, best_cluster, best_weight, self_loop);
        }

        let previous_quality = quality;
        quality = metric.quality();
        if quality - previous_quality <= eps {
            break;
        }
    }

    *clustering = graph.extract_canonical_partition();
    quality
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clustering::modularity::modularity;
    use crate::core::builders::clique_pair_graph;
    use rand::SeedableRng;

    #[test]
    fn test_louvain_splits_clique_pair() {
        let mut g = clique_pair_graph(5).expect("valid size");
        let mut rng = StdRng::seed_from_u64(1);
        let config = ClusteringConfig::default();

        let k = perform_clustering(&config, &mut g, true, &mut rng);
        assert_eq!(k, 2);
        assert!(modularity(&g) > 0.3);
    }
}
