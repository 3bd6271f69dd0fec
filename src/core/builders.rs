/*!
# Graph Builders and Generators

This module provides convenient ways to construct [`CsrGraph`] instances: from a
plain undirected edge list, from a petgraph graph, and through a handful of small
generators used by tests and benchmarks (complete graphs, clique pairs, stars,
rings).
*/

use crate::core::error::{EvoclusError, Result};
use crate::core::graph::{CsrGraph, EdgeWeight, NodeId};
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;

/// Builds an undirected graph from an edge list.
///
/// Each entry `(u, v, w)` adds an undirected edge of weight `w`; entries with
/// `u == v` become self-loops. Parallel edges are merged by summing weights.
///
/// # Returns
/// `EvoclusError::BadGraph` on out-of-range endpoints or negative weights.
pub fn from_edge_list(n: usize, edges: &[(NodeId, NodeId, EdgeWeight)]) -> Result<CsrGraph> {
    for &(u, v, w) in edges {
        if u >= n || v >= n {
            return Err(EvoclusError::bad_graph(format!(
                "edge ({}, {}) outside node range [0, {})",
                u, v, n
            )));
        }
        if w < 0 {
            return Err(EvoclusError::bad_graph(format!(
                "edge ({}, {}) has negative weight {}",
                u, v, w
            )));
        }
    }

    let mut adjacency: Vec<std::collections::BTreeMap<NodeId, EdgeWeight>> =
        vec![std::collections::BTreeMap::new(); n];
    let mut self_loops = vec![0; n];
    let mut has_self_loops = false;

    for &(u, v, w) in edges {
        if u == v {
            self_loops[u] += w;
            has_self_loops = true;
        } else {
            *adjacency[u].entry(v).or_insert(0) += w;
            *adjacency[v].entry(u).or_insert(0) += w;
        }
    }

    let m: usize = adjacency.iter().map(|a| a.len()).sum();
    let mut xadj = Vec::with_capacity(n + 1);
    let mut adjncy = Vec::with_capacity(m);
    let mut edge_weight = Vec::with_capacity(m);

    xadj.push(0);
    for neighbors in &adjacency {
        for (&target, &weight) in neighbors {
            adjncy.push(target);
            edge_weight.push(weight);
        }
        xadj.push(adjncy.len());
    }

    let mut graph = CsrGraph::from_csr(xadj, adjncy, None, Some(edge_weight))?;
    if has_self_loops {
        graph.resize_self_loops();
        for (node, &weight) in self_loops.iter().enumerate() {
            if weight > 0 {
                graph.set_self_loop(node, weight);
            }
        }
    }
    Ok(graph)
}

/// Converts an undirected petgraph graph with integer edge weights.
///
/// Node attributes are dropped; node indices must be contiguous (no removals),
/// which holds for any freshly built `UnGraph`.
pub fn from_petgraph<N>(graph: &UnGraph<N, EdgeWeight>) -> Result<CsrGraph> {
    let n = graph.node_count();
    let edges: Vec<(NodeId, NodeId, EdgeWeight)> = graph
        .edge_references()
        .map(|e| (e.source().index(), e.target().index(), *e.weight()))
        .collect();
    from_edge_list(n, &edges)
}

/// Complete graph on `n` nodes with unit edge weights.
pub fn complete_graph(n: usize) -> Result<CsrGraph> {
    let mut edges = Vec::new();
    for u in 0..n {
        for v in (u + 1)..n {
            edges.push((u, v, 1));
        }
    }
    from_edge_list(n, &edges)
}

/// Two cliques of `size` nodes each, joined by a single bridge edge.
///
/// Nodes `[0, size)` form the first clique, `[size, 2 * size)` the second, and
/// the bridge connects `size - 1` with `size`.
pub fn clique_pair_graph(size: usize) -> Result<CsrGraph> {
    if size == 0 {
        return Err(EvoclusError::invalid_argument("clique size must be positive"));
    }
    let mut edges = Vec::new();
    for offset in [0, size] {
        for u in 0..size {
            for v in (u + 1)..size {
                edges.push((offset + u, offset + v, 1));
            }
        }
    }
    edges.push((size - 1, size, 1));
    from_edge_list(2 * size, &edges)
}

/// Star with one center (node 0) and `leaves` leaf nodes.
pub fn star_graph(leaves: usize) -> Result<CsrGraph> {
    let edges: Vec<(NodeId, NodeId, EdgeWeight)> = (1..=leaves).map(|v| (0, v, 1)).collect();
    from_edge_list(leaves + 1, &edges)
}

/// Cycle on `n` nodes.
pub fn ring_graph(n: usize) -> Result<CsrGraph> {
    if n < 3 {
        return Err(EvoclusError::invalid_argument("a ring needs at least 3 nodes"));
    }
    let edges: Vec<(NodeId, NodeId, EdgeWeight)> = (0..n).map(|v| (v, (v + 1) % n, 1)).collect();
    from_edge_list(n, &edges)
}
