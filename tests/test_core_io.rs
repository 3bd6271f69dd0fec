// tests/test_core_io.rs

use evoclus::core::builders::clique_pair_graph;
use evoclus::core::io::{read_metis_graph, read_partition, write_metis_graph, write_partition};
use std::fs;
use std::path::PathBuf;

fn scratch_path(name: &str) -> PathBuf {
    let mut path = std::env::temp_dir();
    path.push(format!("evoclus_io_test_{}_{}", std::process::id(), name));
    path
}

#[test]
fn test_metis_roundtrip() {
    let g = clique_pair_graph(4).expect("valid size");
    let path = scratch_path("roundtrip.graph");

    write_metis_graph(&path, &g).expect("write succeeds");
    let reread = read_metis_graph(&path).expect("read succeeds");
    fs::remove_file(&path).ok();

    assert_eq!(reread.number_of_nodes(), g.number_of_nodes());
    assert_eq!(reread.number_of_edges(), g.number_of_edges());
    for node in 0..g.number_of_nodes() {
        assert_eq!(
            reread.weighted_node_degree(node),
            g.weighted_node_degree(node)
        );
    }
}

#[test]
fn test_read_metis_with_comments_and_weights() {
    let path = scratch_path("weighted.graph");
    // triangle with edge weights, '%' comment interleaved
    fs::write(
        &path,
        "% a weighted triangle\n3 3 1\n2 5 3 2\n1 5 3 7\n1 2 2 7\n",
    )
    .expect("write test file");

    let g = read_metis_graph(&path).expect("read succeeds");
    fs::remove_file(&path).ok();

    assert_eq!(g.number_of_nodes(), 3);
    assert_eq!(g.number_of_edges(), 6);
    assert_eq!(g.weighted_node_degree(0), 7);
    assert_eq!(g.weighted_node_degree(2), 9);
}

#[test]
fn test_read_metis_rejects_bad_neighbor() {
    let path = scratch_path("bad.graph");
    fs::write(&path, "2 1\n2\n5\n").expect("write test file");

    let result = read_metis_graph(&path);
    fs::remove_file(&path).ok();
    assert!(result.is_err());
}

#[test]
fn test_read_metis_rejects_wrong_edge_count() {
    let path = scratch_path("count.graph");
    fs::write(&path, "3 5\n2\n1\n\n").expect("write test file");

    let result = read_metis_graph(&path);
    fs::remove_file(&path).ok();
    assert!(result.is_err());
}

#[test]
fn test_partition_roundtrip() {
    let path = scratch_path("partition.txt");
    let clustering = vec![0usize, 0, 1, 2, 1];

    write_partition(&path, &clustering).expect("write succeeds");
    let reread = read_partition(&path).expect("read succeeds");
    fs::remove_file(&path).ok();

    assert_eq!(reread, clustering);
}
