// tests/test_core_graph.rs

use evoclus::clustering::coarsening::{GraphHierarchy, contract_by_partition};
use evoclus::clustering::modularity::modularity;
use evoclus::core::builders::{clique_pair_graph, from_edge_list, ring_graph};
use evoclus::core::graph::{CsrGraph, canonicalize};

#[test]
fn test_from_csr_accepts_valid_input() {
    // path 0 - 1 - 2
    let g = CsrGraph::from_csr(vec![0, 1, 3, 4], vec![1, 0, 2, 1], None, None)
        .expect("valid CSR must build");
    assert_eq!(g.number_of_nodes(), 3);
    assert_eq!(g.number_of_edges(), 4);
    assert_eq!(g.weighted_node_degree(1), 2);
}

#[test]
fn test_from_csr_rejects_non_monotone_xadj() {
    let result = CsrGraph::from_csr(vec![0, 3, 1, 4], vec![1, 0, 2, 1], None, None);
    assert!(result.is_err());
}

#[test]
fn test_from_csr_rejects_out_of_range_target() {
    let result = CsrGraph::from_csr(vec![0, 1, 2], vec![1, 7], None, None);
    assert!(result.is_err());
}

#[test]
fn test_from_csr_rejects_negative_weights() {
    let result = CsrGraph::from_csr(vec![0, 1, 2], vec![1, 0], None, Some(vec![-1, 1]));
    assert!(result.is_err());
}

#[test]
fn test_canonicalize_is_idempotent() {
    let mut c = vec![4, 2, 4, 9, 2, 0];
    canonicalize(&mut c);
    let once = c.clone();
    canonicalize(&mut c);
    assert_eq!(c, once);
}

#[test]
fn test_canonicalize_preserves_partition() {
    let original = vec![4, 2, 4, 9, 2, 0];
    let mut canonical = original.clone();
    canonicalize(&mut canonical);

    for u in 0..original.len() {
        for v in 0..original.len() {
            assert_eq!(
                original[u] == original[v],
                canonical[u] == canonical[v],
                "canonicalization must keep nodes {} and {} together or apart",
                u,
                v
            );
        }
    }
}

#[test]
fn test_contraction_preserves_modularity() {
    let mut g = clique_pair_graph(4).expect("valid size");
    g.apply_partition(&[0, 0, 0, 0, 1, 1, 1, 1]);
    let fine_q = modularity(&g);

    let (coarse, mapping) = contract_by_partition(&mut g);
    assert_eq!(coarse.number_of_nodes(), 2);
    assert_eq!(mapping.len(), 8);
    // singletons on the quotient graph represent the same clustering
    assert!((modularity(&coarse) - fine_q).abs() < 1e-12);
}

#[test]
fn test_contraction_aggregates_parallel_edges() {
    let mut g = from_edge_list(4, &[(0, 2, 1), (0, 3, 2), (1, 2, 3), (1, 3, 4)])
        .expect("valid edges");
    g.apply_partition(&[0, 0, 1, 1]);

    let (coarse, _) = contract_by_partition(&mut g);
    assert_eq!(coarse.number_of_nodes(), 2);
    // all four crossing edges collapse into one coarse edge per direction
    assert_eq!(coarse.number_of_edges(), 2);
    assert_eq!(coarse.weighted_node_degree(0), 10);
    assert_eq!(coarse.node_weight(0), 2);
}

#[test]
fn test_hierarchy_projects_clustering_down() {
    let mut g = ring_graph(6).expect("valid ring");
    g.apply_partition(&[0, 0, 1, 1, 2, 2]);

    let mut hierarchy = GraphHierarchy::new();
    let (mut coarse, mapping) = contract_by_partition(&mut g);
    // cluster the three coarse nodes into two groups
    coarse.apply_partition(&[0, 0, 1]);
    hierarchy.push(mapping, coarse);

    hierarchy.pop_and_project(&mut g);
    assert!(hierarchy.is_empty());
    assert_eq!(g.partition_index(0), g.partition_index(3));
    assert_ne!(g.partition_index(0), g.partition_index(5));
    assert_eq!(g.partition_count(), 2);
}

#[test]
#[should_panic(expected = "uncoarsening without frames")]
fn test_empty_hierarchy_pop_panics() {
    let mut g = ring_graph(3).expect("valid ring");
    let mut hierarchy = GraphHierarchy::new();
    hierarchy.pop_and_project(&mut g);
}

#[test]
fn test_secondary_partition_defaults_to_shared_cluster() {
    let g = ring_graph(4).expect("valid ring");
    assert_eq!(g.secondary_partition_index(0), g.secondary_partition_index(3));
}
