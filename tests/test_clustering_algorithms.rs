// tests/test_clustering_algorithms.rs

use evoclus::clustering::label_propagation::{
    perform_label_propagation, size_constrained_label_propagation,
};
use evoclus::clustering::louvain::{
    LOCAL_SEARCH_EPS, initialize_singleton_clusters, local_search, perform_clustering,
    perform_node_moves,
};
use evoclus::clustering::modularity::modularity;
use evoclus::core::builders::{clique_pair_graph, complete_graph, ring_graph, star_graph};
use evoclus::core::config::ClusteringConfig;
use rand::SeedableRng;
use rand::rngs::StdRng;

#[test]
fn test_label_propagation_groups_cliques() {
    let mut g = clique_pair_graph(6).expect("valid size");
    initialize_singleton_clusters(&mut g);
    let config = ClusteringConfig {
        lm_number_of_label_propagation_iterations: 10,
        ..ClusteringConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(7);

    let moves = perform_label_propagation(&config, &mut g, &mut rng);
    assert!(moves > 0);
    // dense cliques collapse onto very few labels
    let distinct: std::collections::HashSet<usize> =
        (0..12).map(|v| g.partition_index(v)).collect();
    assert!(
        distinct.len() <= 4,
        "expected heavy coarsening, got {} labels",
        distinct.len()
    );
}

#[test]
fn test_label_propagation_terminates_on_stable_input() {
    let mut g = complete_graph(5).expect("valid");
    // one big cluster cannot be improved by label propagation
    g.apply_partition(&vec![0; 5]);
    let config = ClusteringConfig::default();
    let mut rng = StdRng::seed_from_u64(1);
    assert_eq!(perform_label_propagation(&config, &mut g, &mut rng), 0);
}

#[test]
fn test_sclp_canonical_output() {
    let g = ring_graph(9).expect("valid ring");
    let mut rng = StdRng::seed_from_u64(2);
    let (labels, k) = size_constrained_label_propagation(&g, 3, 4, &mut rng);

    assert_eq!(labels.len(), 9);
    assert!(labels.iter().all(|&c| c < k));
    // canonical: ids appear in first-seen order
    let mut seen_max = 0;
    for &c in &labels {
        assert!(c <= seen_max, "id {} breaks first-seen order", c);
        seen_max = seen_max.max(c + 1);
    }
}

#[test]
fn test_node_moves_never_decrease_quality() {
    let config = ClusteringConfig::default();
    for seed in 0..5 {
        let mut g = clique_pair_graph(5).expect("valid size");
        initialize_singleton_clusters(&mut g);
        let before = modularity(&g);
        let mut rng = StdRng::seed_from_u64(seed);

        perform_node_moves(&config, &mut g, &mut rng);
        let after = modularity(&g);
        assert!(
            after >= before - config.lm_minimum_quality_improvement,
            "quality decreased from {} to {}",
            before,
            after
        );
    }
}

#[test]
fn test_louvain_on_clique_pair() {
    let mut g = clique_pair_graph(10).expect("valid size");
    let mut rng = StdRng::seed_from_u64(1);
    let config = ClusteringConfig::default();

    let k = perform_clustering(&config, &mut g, true, &mut rng);
    assert_eq!(k, 2);
    // the two cliques of 10 joined by one edge sit near Q = 0.489
    let q = modularity(&g);
    assert!((q - 0.489).abs() < 0.01, "Q = {}", q);
}

#[test]
fn test_louvain_with_lp_levels() {
    // heavy intra-clique weights keep label propagation from ever crossing
    // the light bridge, so the pre-coarsening cannot destroy the communities
    let mut edges = Vec::new();
    for offset in [0, 8] {
        for u in 0..8 {
            for v in (u + 1)..8 {
                edges.push((offset + u, offset + v, 10));
            }
        }
    }
    edges.push((7, 8, 1));
    let mut g = evoclus::core::builders::from_edge_list(16, &edges).expect("valid edges");

    let mut rng = StdRng::seed_from_u64(4);
    let config = ClusteringConfig {
        lm_number_of_label_propagation_levels: 2,
        ..ClusteringConfig::default()
    };

    let k = perform_clustering(&config, &mut g, true, &mut rng);
    assert_eq!(k, 2);
    assert!(modularity(&g) > 0.4);
}

#[test]
fn test_louvain_merges_star_into_one_cluster() {
    let mut g = star_graph(30).expect("valid");
    let mut rng = StdRng::seed_from_u64(1);
    let config = ClusteringConfig::default();

    let k = perform_clustering(&config, &mut g, true, &mut rng);
    assert_eq!(k, 1);
    assert!(modularity(&g).abs() < 1e-12);
}

#[test]
fn test_local_search_respects_secondary_constraint() {
    let mut g = clique_pair_graph(4).expect("valid size");
    // freeze a secondary partition that forbids merging across node 4
    let secondary = vec![0, 0, 0, 0, 1, 1, 1, 1];
    g.set_secondary_partition(&secondary);

    let mut clustering: Vec<usize> = (0..8).collect();
    let mut rng = StdRng::seed_from_u64(3);
    local_search(&mut g, &mut clustering, true, LOCAL_SEARCH_EPS, &mut rng);

    // no result cluster may span the two secondary blocks
    for u in 0..8 {
        for v in 0..8 {
            if clustering[u] == clustering[v] {
                assert_eq!(secondary[u], secondary[v]);
            }
        }
    }
}

#[test]
fn test_local_search_improves_singletons() {
    let mut g = clique_pair_graph(5).expect("valid size");
    let mut clustering: Vec<usize> = (0..10).collect();
    let mut rng = StdRng::seed_from_u64(8);

    let q = local_search(&mut g, &mut clustering, false, LOCAL_SEARCH_EPS, &mut rng);
    assert!(q > 0.3);
    assert!(clustering.iter().max().unwrap() < &10);
}
