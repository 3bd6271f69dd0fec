/*!
# Coarsening

Contraction of a graph by its clustering, and the hierarchy of coarse graphs
built during multilevel optimization.

Contraction produces a quotient graph with one node per cluster: weights of
parallel edges between two clusters are summed, intra-cluster edges are
aggregated into per-node self-loops, and node weights accumulate over cluster
members. The fine graph's partition indices are canonicalized in place so they
double as the fine-to-coarse mapping.
*/

use crate::core::graph::{Clustering, CsrBuilder, CsrGraph, NodeId};
use std::collections::HashMap;

const UNDEFINED: usize = usize::MAX;

/// Contracts `graph` by its current partition.
///
/// Canonicalizes the partition indices of `graph` in place and returns the
/// coarse graph together with the fine-to-coarse node mapping.
/// Runs in O(n + m).
pub fn contract_by_partition(graph: &mut CsrGraph) -> (CsrGraph, Clustering) {
    let n = graph.number_of_nodes();

    // old cluster id -> consecutive id in [0, k), in first-seen order
    let mut cluster_id_lookup: HashMap<usize, usize> = HashMap::new();
    for node in 0..n {
        let next_id = cluster_id_lookup.len();
        cluster_id_lookup
            .entry(graph.partition_index(node))
            .or_insert(next_id);
    }
    let number_of_clusters = cluster_id_lookup.len();

    let mut coarse_mapping: Clustering = vec![0; n];
    let mut reverse_mapping: Vec<Vec<NodeId>> = vec![Vec::new(); number_of_clusters];
    for node in 0..n {
        let coarse_node = cluster_id_lookup[&graph.partition_index(node)];
        coarse_mapping[node] = coarse_node;
        reverse_mapping[coarse_node].push(node);
        graph.set_partition_index(node, coarse_node);
    }
    graph.set_partition_count(number_of_clusters);

    // If a cluster has multiple fine edges to the same target cluster we only
    // create one coarse edge and accumulate into it; the tag tells whether the
    // lookup entry belongs to the current source cluster or is stale.
    let mut edge_lookup: Vec<(usize, usize)> = vec![(UNDEFINED, UNDEFINED); number_of_clusters];
    let mut builder = CsrBuilder::start_construction(number_of_clusters, graph.number_of_edges());

    for (cluster, members) in reverse_mapping.iter().enumerate() {
        let coarse_node = builder.new_node();
        let mut self_loop_weight = 0;
        let mut coarse_node_weight = 0;

        for &fine_node in members {
            coarse_node_weight += graph.node_weight(fine_node);
            // the finest graph usually has no self-loops, coarser ones do
            self_loop_weight += graph.self_loop_weight(fine_node);

            for edge in graph.out_edges(fine_node) {
                let weight = graph.edge_weight(edge);
                let target_cluster = coarse_mapping[graph.edge_target(edge)];

                if target_cluster == cluster {
                    // edge inside the cluster becomes part of the self-loop
                    self_loop_weight += weight;
                    continue;
                }

                let (tag, coarse_edge) = edge_lookup[target_cluster];
                if tag == cluster {
                    builder.add_edge_weight(coarse_edge, weight);
                } else {
                    let new_edge = builder.new_edge(target_cluster, weight);
                    edge_lookup[target_cluster] = (cluster, new_edge);
                }
            }
        }

        builder.set_node_weight(coarse_node, coarse_node_weight);
        builder.set_self_loop(coarse_node, self_loop_weight);
    }

    let mut coarse = builder.finish_construction();
    for coarse_node in 0..number_of_clusters {
        coarse.set_partition_index(coarse_node, coarse_node);
    }
    coarse.set_partition_count(number_of_clusters);

    (coarse, coarse_mapping)
}

/// One level of a multilevel hierarchy: the coarse graph built from the level
/// below and the fine-to-coarse node mapping that created it.
#[derive(Debug)]
struct Frame {
    mapping: Clustering,
    graph: CsrGraph,
}

/// Owned stack of coarsening levels.
///
/// The finest graph lives outside the hierarchy (the caller's "root"); each
/// frame's mapping projects the graph one level below it (or the root, for the
/// first frame) onto the frame's coarse graph.
#[derive(Debug, Default)]
pub struct GraphHierarchy {
    frames: Vec<Frame>,
}

impl GraphHierarchy {
    pub fn new() -> Self {
        GraphHierarchy::default()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Pushes a new coarsest level.
    pub fn push(&mut self, mapping: Clustering, coarse: CsrGraph) {
        self.frames.push(Frame { mapping, graph: coarse });
    }

    /// The current coarsest graph, if any level exists.
    pub fn coarsest_mut(&mut self) -> Option<&mut CsrGraph> {
        self.frames.last_mut().map(|frame| &mut frame.graph)
    }

    /// Pops the coarsest level and projects its clustering one level down.
    ///
    /// The projection target is the next frame's graph, or `root` when the
    /// popped frame was the last one. Panics if the hierarchy is empty; that is
    /// an uncoarsening bug, not an input condition.
    pub fn pop_and_project(&mut self, root: &mut CsrGraph) {
        let top = self
            .frames
            .pop()
            .expect("uncoarsening without frames: graph hierarchy is empty");
        let finer = match self.frames.last_mut() {
            Some(frame) => &mut frame.graph,
            None => root,
        };

        debug_assert_eq!(top.mapping.len(), finer.number_of_nodes());
        for node in 0..finer.number_of_nodes() {
            finer.set_partition_index(node, top.graph.partition_index(top.mapping[node]));
        }
        finer.set_partition_count(top.graph.partition_count());
    }
}

/// Picks the graph the current level works on: the coarsest frame, or the root
/// when nothing has been contracted yet.
pub fn current_level<'a>(
    hierarchy: &'a mut GraphHierarchy,
    root: &'a mut CsrGraph,
) -> &'a mut CsrGraph {
    match hierarchy.frames.last_mut() {
        Some(frame) => &mut frame.graph,
        None => root,
    }
}
