//! Neighborhood scratch for node-move passes.
//!
//! Keeps, for the node currently being visited, the edge weight to each
//! neighboring cluster. A large flat array indexed by cluster id is faster here
//! than a hash map because it avoids allocations inside the hot loop; the list
//! of touched cluster ids makes the reset between nodes O(K).

use crate::core::graph::{ClusterId, CsrGraph, EdgeWeight, NodeId};

const UNUSED: EdgeWeight = -1;

/// Edge weights from one node to its neighboring clusters.
#[derive(Debug, Default)]
pub struct Neighborhood {
    /// Edge weight to cluster c, or `UNUSED` when c is not in the neighborhood.
    edge_weights_to_clusters: Vec<EdgeWeight>,
    /// Cluster ids present in the current neighborhood (the node's own first).
    cluster_ids: Vec<ClusterId>,
    len: usize,
}

impl Neighborhood {
    pub fn new() -> Self {
        Neighborhood::default()
    }

    /// Prepares the scratch for a graph with at most `cluster_bound` clusters.
    pub fn initialize(&mut self, cluster_bound: usize) {
        self.edge_weights_to_clusters.clear();
        self.edge_weights_to_clusters.resize(cluster_bound, UNUSED);
        self.cluster_ids.clear();
        self.cluster_ids.resize(cluster_bound, 0);
        self.len = 0;
    }

    /// Recomputes the neighborhood of `node`.
    ///
    /// The node's own cluster is always entry 0, with weight 0 if no neighbor
    /// shares it.
    pub fn update(&mut self, graph: &CsrGraph, node: NodeId) {
        // reset the neighborhood of the previous node
        for i in 0..self.len {
            self.edge_weights_to_clusters[self.cluster_ids[i]] = UNUSED;
        }
        self.len = 0;

        let own_cluster = graph.partition_index(node);
        self.cluster_ids[0] = own_cluster;
        self.edge_weights_to_clusters[own_cluster] = 0;
        self.len = 1;

        for edge in graph.out_edges(node) {
            let neighbor_cluster = graph.partition_index(graph.edge_target(edge));
            if self.edge_weights_to_clusters[neighbor_cluster] == UNUSED {
                self.edge_weights_to_clusters[neighbor_cluster] = 0;
                self.cluster_ids[self.len] = neighbor_cluster;
                self.len += 1;
            }
            self.edge_weights_to_clusters[neighbor_cluster] += graph.edge_weight(edge);
        }
    }

    /// Number of distinct clusters in the neighborhood (own cluster included).
    pub fn number_of_neighboring_clusters(&self) -> usize {
        self.len
    }

    /// The i-th neighboring cluster id.
    pub fn cluster_id(&self, i: usize) -> ClusterId {
        self.cluster_ids[i]
    }

    /// Edge weight from the current node to `cluster`.
    pub fn edge_weight_to_cluster(&self, cluster: ClusterId) -> EdgeWeight {
        self.edge_weights_to_clusters[cluster].max(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builders::from_edge_list;

    #[test]
    fn test_update_collects_neighboring_clusters() {
        let mut g =
            from_edge_list(4, &[(0, 1, 2), (0, 2, 3), (0, 3, 1)]).expect("star");
        g.apply_partition(&[0, 1, 1, 2]);

        let mut hood = Neighborhood::new();
        hood.initialize(g.partition_count_compute());
        hood.update(&g, 0);

        assert_eq!(hood.number_of_neighboring_clusters(), 3);
        assert_eq!(hood.cluster_id(0), 0);
        assert_eq!(hood.edge_weight_to_cluster(0), 0);
        assert_eq!(hood.edge_weight_to_cluster(1), 5);
        assert_eq!(hood.edge_weight_to_cluster(2), 1);
    }
}
