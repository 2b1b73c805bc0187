//! Per-node adjacency record: one neighbor list per layer the node occupies.

/// Identifier for a node in the graph — a dense, insertion-order vector id.
pub type NodeId = usize;

/// A node's adjacency lists, one per layer from 0 up to its assigned top layer.
#[derive(Debug, Clone)]
pub(super) struct NodeRecord {
    neighbors: Vec<Vec<NodeId>>,
}

impl NodeRecord {
    /// Allocates a record with `top_layer + 1` empty neighbor lists.
    pub(super) fn new(top_layer: usize) -> Self {
        Self {
            neighbors: vec![Vec::new(); top_layer + 1],
        }
    }

    /// The highest layer this node occupies.
    pub(super) fn top_layer(&self) -> usize {
        self.neighbors.len() - 1
    }

    /// Neighbors at `layer`, or an empty slice if this node doesn't reach
    /// that layer. Mirrors the reference implementation's own defensive
    /// bounds check in its layer-0 beam search.
    pub(super) fn neighbors(&self, layer: usize) -> &[NodeId] {
        self.neighbors.get(layer).map_or(&[], Vec::as_slice)
    }

    pub(super) fn push_neighbor(&mut self, layer: usize, id: NodeId) {
        self.neighbors[layer].push(id);
    }

    pub(super) fn set_neighbors(&mut self, layer: usize, ids: Vec<NodeId>) {
        self.neighbors[layer] = ids;
    }
}
