/*!
# Evoclus Graph Container

This module defines the compressed sparse row (CSR) graph used by all clustering
algorithms in Evoclus. The `CsrGraph` struct stores an immutable undirected topology
(every undirected edge occupies two directed slots), mutable node and edge weights,
an optional self-loop weight per node, and two mutable cluster assignments per node:
the working *partition index* and a frozen *secondary partition index* that constrains
local search during multilevel recombination.

Graphs are built either incrementally through [`CsrBuilder`] (nodes in order, all out
edges of a node before the next node) or from validated CSR arrays via
[`CsrGraph::from_csr`].
*/

use crate::core::error::{EvoclusError, Result};

/// Node identifier, an index into the CSR node range.
pub type NodeId = usize;
/// Edge identifier, an index into the CSR edge slots.
pub type EdgeId = usize;
/// Cluster (partition block) identifier.
pub type ClusterId = usize;
/// Integer edge weight.
pub type EdgeWeight = i64;
/// Integer node weight.
pub type NodeWeight = i64;

/// A cluster assignment, one id per node.
pub type Clustering = Vec<ClusterId>;

/// Sentinel for a node that is temporarily detached from every cluster.
pub const INVALID_CLUSTER: ClusterId = usize::MAX;

/// Remaps cluster ids to a canonical order.
///
/// Ids are reassigned to `[0, k)` in first-seen order while iterating the slice
/// from front to back. Returns the number of distinct clusters `k`.
pub fn canonicalize(clustering: &mut [ClusterId]) -> usize {
    let mut new_mapping = std::collections::HashMap::new();
    let mut id = 0;

    for cluster in clustering.iter_mut() {
        match new_mapping.get(cluster) {
            Some(&mapped) => *cluster = mapped,
            None => {
                new_mapping.insert(*cluster, id);
                *cluster = id;
                id += 1;
            }
        }
    }
    id
}

/// Compressed sparse row graph with per-node cluster assignments.
#[derive(Debug, Clone)]
pub struct CsrGraph {
    xadj: Vec<usize>,
    adjncy: Vec<NodeId>,
    edge_weight: Vec<EdgeWeight>,
    node_weight: Vec<NodeWeight>,
    self_loop: Option<Vec<EdgeWeight>>,
    partition_index: Vec<ClusterId>,
    secondary_partition_index: Vec<ClusterId>,
    partition_count: usize,
}

impl CsrGraph {
    /// Creates an empty graph with no nodes and no edges.
    pub fn new() -> Self {
        CsrGraph {
            xadj: vec![0],
            adjncy: Vec::new(),
            edge_weight: Vec::new(),
            node_weight: Vec::new(),
            self_loop: None,
            partition_index: Vec::new(),
            secondary_partition_index: Vec::new(),
            partition_count: 0,
        }
    }

    /// Builds a graph from raw CSR arrays.
    ///
    /// `xadj` has `n + 1` entries, `adjncy` and optional `edge_weight` have `m`
    /// entries (one per directed slot). `node_weight` and `edge_weight` default to
    /// unit weights when `None`.
    ///
    /// # Returns
    /// `EvoclusError::BadGraph` when `xadj` is non-monotone or does not cover
    /// `adjncy`, when an adjacency target is out of range, or when a weight is
    /// negative.
    pub fn from_csr(
        xadj: Vec<usize>,
        adjncy: Vec<NodeId>,
        node_weight: Option<Vec<NodeWeight>>,
        edge_weight: Option<Vec<EdgeWeight>>,
    ) -> Result<Self> {
        if xadj.is_empty() {
            return Err(EvoclusError::bad_graph("xadj must have n + 1 entries"));
        }
        let n = xadj.len() - 1;
        let m = adjncy.len();

        if xadj[0] != 0 || xadj[n] != m {
            return Err(EvoclusError::bad_graph(format!(
                "xadj must start at 0 and end at m = {}",
                m
            )));
        }
        for i in 0..n {
            if xadj[i] > xadj[i + 1] {
                return Err(EvoclusError::bad_graph(format!(
                    "xadj is not monotone at node {}",
                    i
                )));
            }
        }
        for (e, &target) in adjncy.iter().enumerate() {
            if target >= n {
                return Err(EvoclusError::bad_graph(format!(
                    "edge slot {} targets node {} outside [0, {})",
                    e, target, n
                )));
            }
        }

        let node_weight = match node_weight {
            Some(w) if w.len() != n => {
                return Err(EvoclusError::bad_graph("node weight array has wrong length"));
            }
            Some(w) => w,
            None => vec![1; n],
        };
        let edge_weight = match edge_weight {
            Some(w) if w.len() != m => {
                return Err(EvoclusError::bad_graph("edge weight array has wrong length"));
            }
            Some(w) => w,
            None => vec![1; m],
        };
        if node_weight.iter().any(|&w| w < 0) || edge_weight.iter().any(|&w| w < 0) {
            return Err(EvoclusError::bad_graph("weights must be non-negative"));
        }

        Ok(CsrGraph {
            xadj,
            adjncy,
            edge_weight,
            node_weight,
            self_loop: None,
            partition_index: vec![0; n],
            secondary_partition_index: Vec::new(),
            partition_count: if n > 0 { 1 } else { 0 },
        })
    }

    /// Number of nodes.
    pub fn number_of_nodes(&self) -> usize {
        self.xadj.len() - 1
    }

    /// Number of directed edge slots (twice the number of undirected edges).
    pub fn number_of_edges(&self) -> usize {
        self.adjncy.len()
    }

    /// Range of edge ids leaving `node`.
    pub fn out_edges(&self, node: NodeId) -> std::ops::Range<EdgeId> {
        self.xadj[node]..self.xadj[node + 1]
    }

    /// Target node of edge slot `edge`.
    pub fn edge_target(&self, edge: EdgeId) -> NodeId {
        self.adjncy[edge]
    }

    /// Weight of edge slot `edge`.
    pub fn edge_weight(&self, edge: EdgeId) -> EdgeWeight {
        self.edge_weight[edge]
    }

    pub fn set_edge_weight(&mut self, edge: EdgeId, weight: EdgeWeight) {
        self.edge_weight[edge] = weight;
    }

    pub fn node_weight(&self, node: NodeId) -> NodeWeight {
        self.node_weight[node]
    }

    pub fn set_node_weight(&mut self, node: NodeId, weight: NodeWeight) {
        self.node_weight[node] = weight;
    }

    /// Sum of all node weights.
    pub fn total_node_weight(&self) -> NodeWeight {
        self.node_weight.iter().sum()
    }

    /// Sum of the out-edge weights of `node`, self-loops excluded.
    pub fn weighted_node_degree(&self, node: NodeId) -> EdgeWeight {
        self.out_edges(node).map(|e| self.edge_weight[e]).sum()
    }

    /// True if the graph carries a self-loop array (coarse graphs do).
    pub fn contains_self_loops(&self) -> bool {
        self.self_loop.is_some()
    }

    /// Self-loop weight of `node`, zero when the graph has no self-loop array.
    pub fn self_loop_weight(&self, node: NodeId) -> EdgeWeight {
        match &self.self_loop {
            Some(loops) => loops[node],
            None => 0,
        }
    }

    /// Allocates the self-loop array (all zero) if not present.
    pub fn resize_self_loops(&mut self) {
        if self.self_loop.is_none() {
            self.self_loop = Some(vec![0; self.number_of_nodes()]);
        }
    }

    pub fn set_self_loop(&mut self, node: NodeId, weight: EdgeWeight) {
        self.resize_self_loops();
        if let Some(loops) = &mut self.self_loop {
            loops[node] = weight;
        }
    }

    /// Current cluster of `node` (may be [`INVALID_CLUSTER`] while detached).
    pub fn partition_index(&self, node: NodeId) -> ClusterId {
        self.partition_index[node]
    }

    pub fn set_partition_index(&mut self, node: NodeId, cluster: ClusterId) {
        self.partition_index[node] = cluster;
    }

    /// Declared number of clusters.
    pub fn partition_count(&self) -> usize {
        self.partition_count
    }

    pub fn set_partition_count(&mut self, count: usize) {
        self.partition_count = count;
    }

    /// Recomputes the cluster count as `1 + max(partition_index)`, ignoring
    /// detached nodes.
    pub fn partition_count_compute(&self) -> usize {
        self.partition_index
            .iter()
            .filter(|&&c| c != INVALID_CLUSTER)
            .max()
            .map_or(0, |&c| c + 1)
    }

    /// Frozen secondary cluster of `node`. Nodes without an assignment share
    /// a single implicit cluster.
    pub fn secondary_partition_index(&self, node: NodeId) -> ClusterId {
        if self.secondary_partition_index.is_empty() {
            0
        } else {
            self.secondary_partition_index[node]
        }
    }

    /// Freezes `clustering` as the secondary partition index of every node.
    pub fn set_secondary_partition(&mut self, clustering: &[ClusterId]) {
        assert_eq!(
            self.number_of_nodes(),
            clustering.len(),
            "secondary clustering length must match the node count"
        );
        self.secondary_partition_index.clear();
        self.secondary_partition_index.extend_from_slice(clustering);
    }

    /// Assigns `clustering` to the partition indices and updates the cluster
    /// count to `1 + max(clustering)`.
    pub fn apply_partition(&mut self, clustering: &[ClusterId]) {
        assert_eq!(
            self.number_of_nodes(),
            clustering.len(),
            "clustering length must match the node count"
        );
        self.partition_index.clear();
        self.partition_index.extend_from_slice(clustering);
        self.partition_count = clustering.iter().max().map_or(0, |&c| c + 1);
    }

    /// Copies the partition indices into a canonical clustering vector.
    ///
    /// The graph itself is left untouched; the returned ids are relabeled to
    /// `[0, k)` in first-seen order.
    pub fn extract_canonical_partition(&self) -> Clustering {
        let mut clustering = self.partition_index.clone();
        canonicalize(&mut clustering);
        clustering
    }

    /// Relabels the partition indices in place to canonical `[0, k)` ids and
    /// updates the cluster count. Returns `k`.
    pub fn canonicalize_partition(&mut self) -> usize {
        let count = canonicalize(&mut self.partition_index);
        self.partition_count = count;
        count
    }
}

impl Default for CsrGraph {
    fn default() -> Self {
        Self::new()
    }
}

/// Incremental CSR construction.
///
/// Nodes must be created in ascending order and all out edges of a node added
/// before the next node is created (the construction protocol of the coarsener).
#[derive(Debug)]
pub struct CsrBuilder {
    xadj: Vec<usize>,
    adjncy: Vec<NodeId>,
    edge_weight: Vec<EdgeWeight>,
    node_weight: Vec<NodeWeight>,
    self_loop: Vec<EdgeWeight>,
}

impl CsrBuilder {
    /// Starts construction with capacity hints for `n` nodes and `m` edge slots.
    pub fn start_construction(n: usize, m: usize) -> Self {
        let mut xadj = Vec::with_capacity(n + 1);
        xadj.push(0);
        CsrBuilder {
            xadj,
            adjncy: Vec::with_capacity(m),
            edge_weight: Vec::with_capacity(m),
            node_weight: Vec::with_capacity(n),
            self_loop: Vec::with_capacity(n),
        }
    }

    /// Appends a new node and returns its id.
    pub fn new_node(&mut self) -> NodeId {
        let node = self.node_weight.len();
        self.xadj.push(self.adjncy.len());
        self.node_weight.push(1);
        self.self_loop.push(0);
        node
    }

    /// Appends an out edge of the most recently created node.
    pub fn new_edge(&mut self, target: NodeId, weight: EdgeWeight) -> EdgeId {
        let edge = self.adjncy.len();
        self.adjncy.push(target);
        self.edge_weight.push(weight);
        let last = self.xadj.len() - 1;
        self.xadj[last] = self.adjncy.len();
        edge
    }

    /// Adds `weight` onto an already created edge (parallel-edge aggregation).
    pub fn add_edge_weight(&mut self, edge: EdgeId, weight: EdgeWeight) {
        self.edge_weight[edge] += weight;
    }

    pub fn set_node_weight(&mut self, node: NodeId, weight: NodeWeight) {
        self.node_weight[node] = weight;
    }

    pub fn set_self_loop(&mut self, node: NodeId, weight: EdgeWeight) {
        self.self_loop[node] = weight;
    }

    /// Finalizes construction; every node starts in cluster 0.
    pub fn finish_construction(self) -> CsrGraph {
        let n = self.node_weight.len();
        CsrGraph {
            xadj: self.xadj,
            adjncy: self.adjncy,
            edge_weight: self.edge_weight,
            node_weight: self.node_weight,
            self_loop: Some(self.self_loop),
            partition_index: vec![0; n],
            secondary_partition_index: Vec::new(),
            partition_count: if n > 0 { 1 } else { 0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonicalize_first_seen_order() {
        let mut c = vec![7, 7, 2, 9, 2];
        let k = canonicalize(&mut c);
        assert_eq!(c, vec![0, 0, 1, 2, 1]);
        assert_eq!(k, 3);
    }

    #[test]
    fn test_from_csr_rejects_bad_xadj() {
        let result = CsrGraph::from_csr(vec![0, 2, 1], vec![1, 0], None, None);
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_roundtrip() {
        let mut builder = CsrBuilder::start_construction(2, 2);
        let a = builder.new_node();
        builder.new_edge(1, 3);
        let b = builder.new_node();
        builder.new_edge(0, 3);
        builder.set_self_loop(b, 4);
        let g = builder.finish_construction();

        assert_eq!(g.number_of_nodes(), 2);
        assert_eq!(g.number_of_edges(), 2);
        assert_eq!(g.weighted_node_degree(a), 3);
        assert_eq!(g.self_loop_weight(b), 4);
    }
}
