/*!
# Mutation

Diversifies a parent clustering by splitting a random selection of its clusters.
Each picked cluster is extracted as an induced subgraph and bisected with a
random imbalance; one side keeps the old cluster id, the other becomes a fresh
cluster. A local search pass then repairs the borders. Splits that fail (blocks
too small, or a degenerate bisection) simply leave the cluster untouched, so a
bad split never costs the round.
*/

use crate::clustering::louvain::{LOCAL_SEARCH_EPS, local_search};
use crate::core::config::ClusteringConfig;
use crate::core::graph::{Clustering, CsrGraph};
use crate::core::subgraphs::extract_block;
use crate::evolution::combine::combine_improved_multilevel;
use crate::evolution::individual::Individual;
use crate::evolution::partitioning::KwayPartitioner;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::BTreeSet;
use tracing::debug;

/// Splits a random fraction of the parent's clusters by 2-way partitioning.
pub fn mutate_random(
    config: &ClusteringConfig,
    graph: &mut CsrGraph,
    parent: &Individual,
    partitioner: &dyn KwayPartitioner,
    rng: &mut StdRng,
) -> Individual {
    let mut clustering: Clustering = parent.partition_map.clone();
    let cluster_count = clustering.iter().max().map_or(0, |&c| c + 1);
    if cluster_count == 0 {
        return Individual::from_clustering(graph, &clustering);
    }

    let fraction = rng.random_range(0.01..=config.mh_mutate_fraction.max(0.01));
    let clusters_to_select =
        ((fraction * cluster_count as f64).ceil() as usize).min(cluster_count);
    debug!(fraction, clusters_to_select, "mutating");

    let mut selected_clusters = BTreeSet::new();
    while selected_clusters.len() < clusters_to_select {
        selected_clusters.insert(rng.random_range(0..cluster_count));
    }

    graph.apply_partition(&clustering);
    let mut next_cluster_id = cluster_count;

    for &cluster in &selected_clusters {
        let (block, mapping) = extract_block(graph, cluster);
        if block.number_of_nodes() >= 2 {
            let epsilon = rng.random_range(0.10..=0.50);
            let blocks = partitioner.partition(&block, 2, epsilon, rng);
            for (local, &side) in blocks.iter().enumerate() {
                if side == 1 {
                    clustering[mapping[local]] = next_cluster_id;
                }
            }
        }
        next_cluster_id += 1;
    }

    local_search(graph, &mut clustering, false, LOCAL_SEARCH_EPS, rng);
    Individual::from_clustering(graph, &clustering)
}

/// Full mutation operator: mutate both parents, then recombine the mutants with
/// the multilevel combine.
pub fn mutate(
    config: &ClusteringConfig,
    graph: &mut CsrGraph,
    first: &Individual,
    second: &Individual,
    partitioner: &dyn KwayPartitioner,
    rng: &mut StdRng,
) -> Individual {
    let mutant_a = mutate_random(config, graph, first, partitioner, rng);
    let mutant_b = mutate_random(config, graph, second, partitioner, rng);
    combine_improved_multilevel(graph, &mutant_a, &mutant_b, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builders::clique_pair_graph;
    use crate::evolution::partitioning::RegionGrowingPartitioner;
    use rand::SeedableRng;

    #[test]
    fn test_mutation_yields_valid_individual() {
        let mut g = clique_pair_graph(4).expect("valid size");
        let parent = Individual::from_clustering(&mut g, &vec![0, 0, 0, 0, 1, 1, 1, 1]);
        let mut rng = StdRng::seed_from_u64(11);
        let config = ClusteringConfig::default();

        let child = mutate_random(&config, &mut g, &parent, &RegionGrowingPartitioner, &mut rng);
        assert_eq!(child.partition_map.len(), 8);
        assert!(child.objective >= -1.0 && child.objective <= 1.0);
        // canonical ids
        let k = child.partition_map.iter().max().map_or(0, |&c| c + 1);
        assert!(child.partition_map.iter().all(|&c| c < k));
    }
}
