/*!
# Individual

One member of an island's population: an owned canonical clustering, its
modularity on the island's graph, and the sorted list of cut edges that serves
as a diversity fingerprint.
*/

use crate::clustering::modularity::modularity;
use crate::core::graph::{Clustering, CsrGraph, EdgeId};

/// A candidate clustering with its objective and cut-edge fingerprint.
#[derive(Debug, Clone)]
pub struct Individual {
    /// Canonical clustering, ids in `[0, k)` in first-seen order.
    pub partition_map: Clustering,
    /// Modularity of the clustering.
    pub objective: f64,
    /// Edge ids crossing cluster borders, sorted ascending.
    pub cut_edges: Vec<EdgeId>,
}

impl Individual {
    /// Materializes an individual from the graph's current partition.
    ///
    /// Canonicalizes the partition in place, recomputes the modularity, and
    /// collects the cut-edge fingerprint.
    pub fn from_graph(graph: &mut CsrGraph) -> Self {
        graph.canonicalize_partition();
        let objective = modularity(graph);
        let partition_map: Clustering = (0..graph.number_of_nodes())
            .map(|node| graph.partition_index(node))
            .collect();

        let mut cut_edges = Vec::new();
        for node in 0..graph.number_of_nodes() {
            for edge in graph.out_edges(node) {
                if partition_map[node] != partition_map[graph.edge_target(edge)] {
                    cut_edges.push(edge);
                }
            }
        }
        debug_assert!(cut_edges.is_sorted(), "cut edge fingerprint must be sorted");

        Individual {
            partition_map,
            objective,
            cut_edges,
        }
    }

    /// Applies `clustering` to the graph and materializes the individual.
    pub fn from_clustering(graph: &mut CsrGraph, clustering: &Clustering) -> Self {
        graph.apply_partition(clustering);
        Self::from_graph(graph)
    }

    /// Size of the symmetric difference between the cut-edge fingerprints.
    ///
    /// Both fingerprints are sorted, so a merge walk suffices. A small value
    /// means the two clusterings cut nearly the same edges.
    pub fn fingerprint_distance(&self, other: &Individual) -> usize {
        let (a, b) = (&self.cut_edges, &other.cut_edges);
        let (mut i, mut j, mut difference) = (0, 0, 0);

        while i < a.len() && j < b.len() {
            match a[i].cmp(&b[j]) {
                std::cmp::Ordering::Less => {
                    difference += 1;
                    i += 1;
                }
                std::cmp::Ordering::Greater => {
                    difference += 1;
                    j += 1;
                }
                std::cmp::Ordering::Equal => {
                    i += 1;
                    j += 1;
                }
            }
        }
        difference + (a.len() - i) + (b.len() - j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builders::from_edge_list;

    #[test]
    fn test_from_clustering_canonicalizes() {
        let mut g = from_edge_list(3, &[(0, 1, 1), (1, 2, 1)]).expect("path");
        let ind = Individual::from_clustering(&mut g, &vec![5, 5, 2]);
        assert_eq!(ind.partition_map, vec![0, 0, 1]);
        // edges 1-2 and 2-1 are cut
        assert_eq!(ind.cut_edges.len(), 2);
    }

    #[test]
    fn test_fingerprint_distance_is_symmetric_difference() {
        let a = Individual {
            partition_map: vec![],
            objective: 0.0,
            cut_edges: vec![1, 3, 5],
        };
        let b = Individual {
            partition_map: vec![],
            objective: 0.0,
            cut_edges: vec![3, 6],
        };
        assert_eq!(a.fingerprint_distance(&b), 3);
        assert_eq!(b.fingerprint_distance(&a), 3);
    }
}
