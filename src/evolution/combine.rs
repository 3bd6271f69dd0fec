/*!
# Recombination Operators

The combine operators all share one kernel: build the *maximum overlap* of two
parent clusterings (their coarsest common refinement), contract the graph by the
overlap, reoptimize on the much smaller quotient graph, and lift the result
back. Because the overlap refines both parents, every parent cluster border
survives contraction, so the child can keep whatever both parents agree on and
renegotiate the rest cheaply.

Five variants are provided, from the flat rerun on the quotient graph up to the
multilevel variant that alternates constrained local search with contraction
before reoptimizing.
*/

use crate::clustering::coarsening::{GraphHierarchy, contract_by_partition, current_level};
use crate::clustering::label_propagation::size_constrained_label_propagation;
use crate::clustering::louvain::{LOCAL_SEARCH_EPS, local_search, perform_clustering};
use crate::clustering::modularity::modularity;
use crate::core::config::ClusteringConfig;
use crate::core::graph::{Clustering, CsrGraph, canonicalize};
use crate::evolution::individual::Individual;
use crate::evolution::partitioning::KwayPartitioner;
use rand::prelude::*;
use rand::rngs::StdRng;
use std::collections::HashMap;

/// Improvement threshold of the constrained multilevel loop.
const MULTILEVEL_EPS: f64 = 1e-3;

/// Maximum overlap of two clusterings of equal length.
///
/// Every ordered pair `(a[v], b[v])` is hashed to a fresh consecutive id in
/// first-seen order, so the result is canonical and refines both inputs.
pub fn maximum_overlap(a: &[usize], b: &[usize]) -> Clustering {
    assert_eq!(a.len(), b.len(), "clusterings of unequal length");

    let mut mapping: HashMap<(usize, usize), usize> = HashMap::new();
    let mut overlap = Vec::with_capacity(a.len());

    for vertex in 0..a.len() {
        let next_id = mapping.len();
        let id = *mapping.entry((a[vertex], b[vertex])).or_insert(next_id);
        overlap.push(id);
    }
    overlap
}

/// Projects a fine clustering onto the quotient graph of an overlap.
///
/// `overlap` must refine `fine`: whenever `overlap[v] == overlap[u]`, the fine
/// clustering agrees on `v` and `u`. The result has one entry per overlap
/// cluster, `coarse[overlap[v]] = fine[v]`.
pub fn apply_fine_to_coarse(fine: &[usize], overlap: &[usize], coarse_len: usize) -> Clustering {
    assert_eq!(fine.len(), overlap.len(), "clusterings of unequal length");

    let mut coarse: Clustering = (0..coarse_len).collect();
    for vertex in 0..fine.len() {
        if fine[vertex] != overlap[vertex] {
            coarse[overlap[vertex]] = fine[vertex];
        }
    }
    coarse
}

/// Replaces each cluster of `clustering` by its cluster in the coarse result.
///
/// `new_coarse` must have an entry for every cluster id of `clustering`; it is
/// canonicalized first, so the composed clustering is canonical too.
pub fn update_clustering(clustering: &mut Clustering, new_coarse: &mut Clustering) {
    canonicalize(new_coarse);
    for cluster in clustering.iter_mut() {
        *cluster = new_coarse[*cluster];
    }
}

/// Contracts a copy of the graph by an explicit clustering.
pub fn contract_by_clustering(graph: &CsrGraph, clustering: &[usize]) -> CsrGraph {
    let mut copy = graph.clone();
    copy.apply_partition(clustering);
    let (coarse, _mapping) = contract_by_partition(&mut copy);
    coarse
}

/// Runs the Louvain method on a quotient graph, optionally from a seed.
///
/// Draws a random number of label propagation levels; without a seed the
/// optimization starts from singletons, with one it warm-starts from the seed.
///
/// # Returns
/// The canonical clustering and its modularity.
fn do_louvain(
    config: &ClusteringConfig,
    graph: &mut CsrGraph,
    seed: Option<&Clustering>,
    rng: &mut StdRng,
) -> (Clustering, f64) {
    let mut louvain_config = config.clone();
    louvain_config.lm_number_of_label_propagation_levels = rng.random_range(0..=5);
    louvain_config.lm_cluster_coarsening_factor = 0;

    if let Some(seed) = seed {
        graph.apply_partition(seed);
    }
    perform_clustering(&louvain_config, graph, seed.is_none(), rng);

    (graph.extract_canonical_partition(), modularity(graph))
}

/// Overlap, contract, rerun Louvain from singletons, lift back.
pub fn combine_basic_flat(
    config: &ClusteringConfig,
    graph: &mut CsrGraph,
    first: &Individual,
    second: &Individual,
    rng: &mut StdRng,
) -> Individual {
    let mut output = maximum_overlap(&first.partition_map, &second.partition_map);
    let mut contracted = contract_by_clustering(graph, &output);

    let (mut contracted_clustering, _quality) = do_louvain(config, &mut contracted, None, rng);
    update_clustering(&mut output, &mut contracted_clustering);

    Individual::from_clustering(graph, &output)
}

/// Like [`combine_basic_flat`], but the quotient graph is seeded with the
/// better parent projected through the overlap, and Louvain keeps that seed
/// instead of resetting to singletons.
pub fn combine_improved_flat(
    config: &ClusteringConfig,
    graph: &mut CsrGraph,
    first: &Individual,
    second: &Individual,
    rng: &mut StdRng,
) -> Individual {
    let good = if first.objective > second.objective {
        &first.partition_map
    } else {
        &second.partition_map
    };

    let mut output = maximum_overlap(&first.partition_map, &second.partition_map);
    let mut contracted = contract_by_clustering(graph, &output);
    let seed = apply_fine_to_coarse(good, &output, contracted.number_of_nodes());

    let (mut contracted_clustering, _quality) =
        do_louvain(config, &mut contracted, Some(&seed), rng);
    update_clustering(&mut output, &mut contracted_clustering);

    Individual::from_clustering(graph, &output)
}

/// Crosses the parent with a fresh size-constrained label propagation
/// clustering drawn with a random cluster bound.
pub fn combine_improved_flat_with_sclp(
    config: &ClusteringConfig,
    graph: &mut CsrGraph,
    first: &Individual,
    rng: &mut StdRng,
) -> Individual {
    let n = graph.number_of_nodes();
    let lower = 10.min(n.max(1));
    let cluster_upperbound = rng.random_range(lower..=n.max(lower)) as i64;
    let (partner, _blocks) = size_constrained_label_propagation(
        graph,
        cluster_upperbound,
        config.lm_number_of_label_propagation_iterations,
        rng,
    );

    combine_with_partner(config, graph, first, &partner, rng)
}

/// Crosses the parent with a balanced k-way partition for random `k` and
/// imbalance, injecting block borders as recombination signal.
pub fn combine_improved_flat_with_partitioning(
    config: &ClusteringConfig,
    graph: &mut CsrGraph,
    first: &Individual,
    partitioner: &dyn KwayPartitioner,
    rng: &mut StdRng,
) -> Individual {
    let k = rng.random_range(2..=64);
    let epsilon = rng.random_range(3..=50) as f64 / 100.0;
    let partner = partitioner.partition(graph, k, epsilon, rng);

    combine_with_partner(config, graph, first, &partner, rng)
}

/// Improved-flat kernel against a synthetic partner clustering; the parent
/// always provides the seed.
fn combine_with_partner(
    config: &ClusteringConfig,
    graph: &mut CsrGraph,
    first: &Individual,
    partner: &[usize],
    rng: &mut StdRng,
) -> Individual {
    let mut output = maximum_overlap(&first.partition_map, partner);
    let mut contracted = contract_by_clustering(graph, &output);
    let seed = apply_fine_to_coarse(&first.partition_map, &output, contracted.number_of_nodes());

    let (mut contracted_clustering, _quality) =
        do_louvain(config, &mut contracted, Some(&seed), rng);
    update_clustering(&mut output, &mut contracted_clustering);

    Individual::from_clustering(graph, &output)
}

/// The multilevel combine.
///
/// Iterates constrained local search (moves confined to the current overlap
/// cluster) and contraction while the quality keeps improving, then seeds the
/// coarsest graph with the better parent contracted through the iterated
/// overlap and uncoarsens with unconstrained local search at every level.
///
/// Unlike the flat operators this one never runs the full Louvain method, only
/// local search with fixed thresholds, so it takes no configuration.
pub fn combine_improved_multilevel(
    graph: &mut CsrGraph,
    first: &Individual,
    second: &Individual,
    rng: &mut StdRng,
) -> Individual {
    let overlap = maximum_overlap(&first.partition_map, &second.partition_map);

    let mut root = graph.clone();
    let mut hierarchy = GraphHierarchy::new();
    let mut contracted_overlap = overlap.clone();
    let mut quality = -1.0;

    loop {
        let level = current_level(&mut hierarchy, &mut root);
        let mut current_clustering: Clustering = (0..level.number_of_nodes()).collect();
        level.set_secondary_partition(&contracted_overlap);

        let previous_quality = quality;
        quality = local_search(level, &mut current_clustering, true, LOCAL_SEARCH_EPS, rng);
        if quality - previous_quality <= MULTILEVEL_EPS {
            break;
        }

        level.apply_partition(&current_clustering);
        let (coarse, mapping) = contract_by_partition(level);
        let coarse_len = coarse.number_of_nodes();
        hierarchy.push(mapping, coarse);

        contracted_overlap =
            apply_fine_to_coarse(&contracted_overlap, &current_clustering, coarse_len);
    }

    // seed the coarsest level with the better parent, expressed in overlap ids
    let good = if first.objective > second.objective {
        &first.partition_map
    } else {
        &second.partition_map
    };
    let contracted_good = contract_clustering_by_overlap(&overlap, &contracted_overlap, good);
    {
        let level = current_level(&mut hierarchy, &mut root);
        level.apply_partition(&contracted_good);
    }

    // uncoarsen with unconstrained local search at every level
    while !hierarchy.is_empty() {
        hierarchy.pop_and_project(&mut root);
        let level = current_level(&mut hierarchy, &mut root);
        let mut clustering = level.extract_canonical_partition();
        local_search(level, &mut clustering, false, LOCAL_SEARCH_EPS, rng);
    }

    let final_clustering = root.extract_canonical_partition();
    Individual::from_clustering(graph, &final_clustering)
}

/// Expresses the better parent's clustering on the iterated overlap.
///
/// `overlap` refines `better`, so each overlap cluster maps to exactly one of
/// the better parent's clusters; the contracted overlap is translated through
/// that map.
fn contract_clustering_by_overlap(
    overlap: &[usize],
    contracted_overlap: &[usize],
    better: &[usize],
) -> Clustering {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    for vertex in 0..better.len() {
        let entry = mapping.entry(overlap[vertex]).or_insert(better[vertex]);
        debug_assert_eq!(
            *entry, better[vertex],
            "overlap does not refine the better parent"
        );
    }

    contracted_overlap
        .iter()
        .map(|cluster| mapping[cluster])
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overlap_refines_both_inputs() {
        let a = vec![0, 0, 1, 1, 0];
        let b = vec![0, 1, 1, 1, 0];
        let overlap = maximum_overlap(&a, &b);

        assert_eq!(overlap, vec![0, 1, 2, 2, 0]);
        for u in 0..a.len() {
            for v in 0..a.len() {
                if overlap[u] == overlap[v] {
                    assert_eq!(a[u], a[v]);
                    assert_eq!(b[u], b[v]);
                }
            }
        }
    }

    #[test]
    fn test_apply_fine_to_coarse_projects() {
        let fine = vec![0, 0, 1, 1, 0];
        let overlap = vec![0, 0, 1, 1, 2];
        let coarse = apply_fine_to_coarse(&fine, &overlap, 3);
        assert_eq!(coarse, vec![0, 1, 0]);
    }

    #[test]
    fn test_update_clustering_composes() {
        let mut clustering = vec![0, 1, 2, 1];
        let mut new_coarse = vec![5, 5, 9];
        update_clustering(&mut clustering, &mut new_coarse);
        assert_eq!(clustering, vec![0, 0, 1, 0]);
    }
}
