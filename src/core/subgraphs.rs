//! Induced subgraph extraction.
//!
//! The mutation operator extracts one cluster at a time as a standalone graph,
//! partitions it, and maps the result back through the returned node mapping.

use crate::core::graph::{ClusterId, CsrBuilder, CsrGraph, NodeId};

/// Extracts the subgraph induced by the nodes of `cluster`.
///
/// Returns the block graph and a mapping from block-local node ids to the node
/// ids of `graph`. Node weights and self-loops carry over; edges leaving the
/// cluster are dropped.
pub fn extract_block(graph: &CsrGraph, cluster: ClusterId) -> (CsrGraph, Vec<NodeId>) {
    let n = graph.number_of_nodes();
    let mut mapping = Vec::new();
    let mut local_id = vec![usize::MAX; n];

    for node in 0..n {
        if graph.partition_index(node) == cluster {
            local_id[node] = mapping.len();
            mapping.push(node);
        }
    }

    let mut builder = CsrBuilder::start_construction(mapping.len(), graph.number_of_edges());
    for &node in &mapping {
        let block_node = builder.new_node();
        builder.set_node_weight(block_node, graph.node_weight(node));
        builder.set_self_loop(block_node, graph.self_loop_weight(node));
        for edge in graph.out_edges(node) {
            let target = graph.edge_target(edge);
            if local_id[target] != usize::MAX {
                builder.new_edge(local_id[target], graph.edge_weight(edge));
            }
        }
    }

    (builder.finish_construction(), mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::builders::from_edge_list;

    #[test]
    fn test_extract_block_keeps_internal_edges() {
        let mut g = from_edge_list(4, &[(0, 1, 1), (1, 2, 1), (2, 3, 1)]).expect("valid edges");
        g.apply_partition(&[0, 0, 1, 1]);

        let (block, mapping) = extract_block(&g, 0);
        assert_eq!(mapping, vec![0, 1]);
        assert_eq!(block.number_of_nodes(), 2);
        // only the 0-1 edge survives, in both directions
        assert_eq!(block.number_of_edges(), 2);
    }
}
