//! Arena-based search tree.

use super::node::{NodeId, SearchNode};

/// Flat `Vec<SearchNode>` addressed by `NodeId`. The root is always node 0.
#[derive(Clone, Debug)]
pub struct SearchTree {
    nodes: Vec<SearchNode>,
}

impl Default for SearchTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchTree {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut nodes = Vec::with_capacity(capacity.max(1));
        nodes.push(SearchNode::new(NodeId::NONE, 0));
        Self { nodes }
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> NodeId {
        NodeId::new(0)
    }

    #[inline]
    #[must_use]
    pub fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id.0 as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut SearchNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Allocate the child of `parent` along `edge_idx`.
    pub fn alloc_child(&mut self, parent: NodeId, edge_idx: usize) -> NodeId {
        let depth = self.get(parent).depth.saturating_add(1);
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(SearchNode::new(parent, depth));
        self.get_mut(parent).edges[edge_idx].child = id;
        id
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Deepest node.
    #[must_use]
    pub fn max_depth(&self) -> u16 {
        self.nodes.iter().map(|n| n.depth).max().unwrap_or(0)
    }

    /// Drop everything but a fresh root.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.nodes.push(SearchNode::new(NodeId::NONE, 0));
    }

    #[must_use]
    pub fn root_node(&self) -> &SearchNode {
        self.get(self.root())
    }
}
