// tests/test_modularity.rs
//
// Properties of the modularity metric: bounds, closed forms for trivial
// clusterings, and consistency of the incremental bookkeeping with the
// from-scratch computation.

use evoclus::clustering::modularity::{ModularityMetric, modularity, sum_of_all_edge_weights};
use evoclus::core::builders::{clique_pair_graph, complete_graph, from_edge_list, star_graph};
use evoclus::core::graph::CsrGraph;
use rand::prelude::*;
use rand::rngs::StdRng;

fn sample_graph() -> CsrGraph {
    clique_pair_graph(4).expect("valid size")
}

#[test]
fn test_modularity_stays_in_bounds() {
    let mut g = sample_graph();
    let clusterings: Vec<Vec<usize>> = vec![
        vec![0; 8],
        (0..8).collect(),
        vec![0, 0, 0, 0, 1, 1, 1, 1],
        vec![0, 1, 0, 1, 0, 1, 0, 1],
    ];
    for clustering in clusterings {
        g.apply_partition(&clustering);
        let q = modularity(&g);
        assert!((-1.0..=1.0).contains(&q), "Q = {} out of bounds", q);
    }
}

#[test]
fn test_singleton_clustering_closed_form() {
    let mut g = sample_graph();
    let singletons: Vec<usize> = (0..8).collect();
    g.apply_partition(&singletons);

    let total = sum_of_all_edge_weights(&g) as f64;
    let expected: f64 = -(0..8)
        .map(|v| {
            let d = g.weighted_node_degree(v) as f64 / total;
            d * d
        })
        .sum::<f64>();

    assert!((modularity(&g) - expected).abs() < 1e-12);
}

#[test]
fn test_single_cluster_is_zero() {
    for g in [
        complete_graph(5).expect("valid"),
        star_graph(10).expect("valid"),
        sample_graph(),
    ] {
        let mut g = g;
        let n = g.number_of_nodes();
        g.apply_partition(&vec![0; n]);
        assert!(modularity(&g).abs() < 1e-12);
    }
}

#[test]
fn test_incremental_consistency_random_moves() {
    let mut g = sample_graph();
    g.apply_partition(&[0, 0, 1, 1, 2, 2, 3, 3]);
    let mut metric = ModularityMetric::new(&g);
    let mut rng = StdRng::seed_from_u64(42);

    for _ in 0..50 {
        let node = rng.random_range(0..8);
        let old_cluster = g.partition_index(node);
        let new_cluster = rng.random_range(0..4);

        let weight_to = |g: &CsrGraph, node: usize, cluster: usize| {
            g.out_edges(node)
                .filter(|&e| g.partition_index(g.edge_target(e)) == cluster)
                .map(|e| g.edge_weight(e))
                .sum::<i64>()
        };

        let w_old = weight_to(&g, node, old_cluster);
        metric.remove_node(&mut g, node, old_cluster, w_old, 0);
        let w_new = weight_to(&g, node, new_cluster);
        metric.insert_node(&mut g, node, new_cluster, w_new, 0);

        let scratch = modularity(&g);
        assert!(
            (metric.quality() - scratch).abs() <= 1e-9 * scratch.abs().max(1.0),
            "incremental {} vs scratch {}",
            metric.quality(),
            scratch
        );
    }
}

#[test]
fn test_gain_orders_candidate_clusters_correctly() {
    let mut g = sample_graph();
    g.apply_partition(&[0, 0, 0, 0, 1, 1, 1, 1]);
    let mut metric = ModularityMetric::new(&g);
    let total = sum_of_all_edge_weights(&g) as f64;

    let weight_to = |g: &CsrGraph, node: usize, cluster: usize| {
        g.out_edges(node)
            .filter(|&e| g.partition_index(g.edge_target(e)) == cluster)
            .map(|e| g.edge_weight(e))
            .sum::<i64>()
    };

    // detach the bridge endpoint and compare both candidate destinations; the
    // gain difference must equal the quality difference (up to the shared
    // 2 / W normalization), which is what makes gains comparable
    let w_own = weight_to(&g, 3, 0);
    metric.remove_node(&mut g, 3, 0, w_own, 0);

    let w_back = weight_to(&g, 3, 0);
    let w_other = weight_to(&g, 3, 1);
    let gain_back = metric.gain(3, 0, w_back);
    let gain_other = metric.gain(3, 1, w_other);

    metric.insert_node(&mut g, 3, 0, w_back, 0);
    let quality_back = metric.quality();
    metric.remove_node(&mut g, 3, 0, w_back, 0);
    metric.insert_node(&mut g, 3, 1, w_other, 0);
    let quality_other = metric.quality();

    let predicted = (gain_other - gain_back) * 2.0 / total;
    let observed = quality_other - quality_back;
    assert!(
        (predicted - observed).abs() < 1e-12,
        "gain difference {} does not predict quality difference {}",
        predicted,
        observed
    );
    // staying in the tight clique beats crossing the bridge
    assert!(gain_back > gain_other);
}

#[test]
fn test_self_loops_count_in_total_weight() {
    let g = from_edge_list(3, &[(0, 1, 2), (1, 2, 2), (2, 2, 5)]).expect("valid edges");
    // two undirected edges of weight 2 (both directions) plus the loop
    assert_eq!(sum_of_all_edge_weights(&g), 13);
}
