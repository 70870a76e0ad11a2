//! Search node and edge structures.
//!
//! Uses arena-based allocation with index references (`NodeId`).

use smallvec::SmallVec;

use crate::core::{PlayerId, PlayerMap};
use crate::rules::Action;

/// Index into the `SearchTree` node arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Sentinel value representing no node.
    pub const NONE: NodeId = NodeId(u32::MAX);

    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[inline]
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

/// Edge from a node to the child reached by `action`.
#[derive(Clone, Debug)]
pub struct Edge {
    pub action: Action,

    /// Child node (NONE until first traversed).
    pub child: NodeId,

    pub visits: u32,

    /// Sum of backed-up rewards, per player.
    pub total_reward: PlayerMap<f64>,

    /// Prior probability (policy head or chance probability).
    pub prior: f32,
}

impl Edge {
    pub fn new(action: Action, prior: f32) -> Self {
        Self {
            action,
            child: NodeId::NONE,
            visits: 0,
            total_reward: PlayerMap::with_value(2, 0.0),
            prior,
        }
    }

    /// Mean reward for `player`, 0 before the first visit.
    #[must_use]
    pub fn mean_reward(&self, player: PlayerId) -> f64 {
        if self.visits == 0 {
            0.0
        } else {
            self.total_reward[player] / f64::from(self.visits)
        }
    }
}

/// A node in the search tree.
#[derive(Clone, Debug)]
pub struct SearchNode {
    pub parent: NodeId,

    pub depth: u16,

    /// Visits through this node's edges.
    pub visits: u32,

    /// Player to move; `None` at chance and terminal nodes.
    pub to_move: Option<PlayerId>,

    pub is_chance: bool,

    /// Edges have been created and the node evaluated.
    pub expanded: bool,

    /// Final returns, for terminal nodes.
    pub terminal_reward: Option<PlayerMap<f64>>,

    pub edges: SmallVec<[Edge; 8]>,
}

impl SearchNode {
    pub fn new(parent: NodeId, depth: u16) -> Self {
        Self {
            parent,
            depth,
            visits: 0,
            to_move: None,
            is_chance: false,
            expanded: false,
            terminal_reward: None,
            edges: SmallVec::new(),
        }
    }

    /// The edge with the most visits; ties go to the first.
    #[must_use]
    pub fn most_visited(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, edge) in self.edges.iter().enumerate() {
            if best.map_or(true, |b| edge.visits > self.edges[b].visits) {
                best = Some(i);
            }
        }
        best
    }

    /// PUCT: `Q(a) + c * P(a) * sqrt(N) / (1 + n(a))` for `player`.
    #[must_use]
    pub fn puct_select(&self, player: PlayerId, uct_c: f64) -> Option<usize> {
        let sqrt_parent = f64::from(self.visits.max(1)).sqrt();
        self.edges
            .iter()
            .enumerate()
            .map(|(i, edge)| {
                let q = edge.mean_reward(player);
                let u = uct_c * f64::from(edge.prior) * sqrt_parent / (1.0 + f64::from(edge.visits));
                (i, q + u)
            })
            .fold(None, |best: Option<(usize, f64)>, (i, score)| match best {
                Some((_, s)) if s >= score => best,
                _ => Some((i, score)),
            })
            .map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_none() {
        assert!(NodeId::NONE.is_none());
        assert!(!NodeId::new(0).is_none());
    }

    #[test]
    fn test_edge_mean_reward() {
        let mut edge = Edge::new(Action::new(1), 0.5);
        assert_eq!(edge.mean_reward(PlayerId::new(0)), 0.0);

        edge.visits = 4;
        edge.total_reward = PlayerMap::from(vec![2.0, -2.0]);
        assert_eq!(edge.mean_reward(PlayerId::new(0)), 0.5);
        assert_eq!(edge.mean_reward(PlayerId::new(1)), -0.5);
    }

    #[test]
    fn test_most_visited_ties_first() {
        let mut node = SearchNode::new(NodeId::NONE, 0);
        node.edges.push(Edge::new(Action::new(0), 0.5));
        node.edges.push(Edge::new(Action::new(1), 0.5));
        assert_eq!(node.most_visited(), Some(0));

        node.edges[1].visits = 3;
        assert_eq!(node.most_visited(), Some(1));
    }

    #[test]
    fn test_puct_prefers_prior_then_value() {
        let mut node = SearchNode::new(NodeId::NONE, 0);
        node.edges.push(Edge::new(Action::new(0), 0.2));
        node.edges.push(Edge::new(Action::new(1), 0.8));
        let p0 = PlayerId::new(0);
        assert_eq!(node.puct_select(p0, 1.0), Some(1));

        // A strong value on the low-prior edge wins once visited.
        node.visits = 10;
        node.edges[0].visits = 5;
        node.edges[0].total_reward = PlayerMap::from(vec![5.0, -5.0]);
        node.edges[1].visits = 5;
        node.edges[1].total_reward = PlayerMap::from(vec![-5.0, 5.0]);
        assert_eq!(node.puct_select(p0, 1.0), Some(0));
        assert_eq!(node.puct_select(PlayerId::new(1), 1.0), Some(1));
    }

    #[test]
    fn test_empty_node_selects_nothing() {
        let node = SearchNode::new(NodeId::NONE, 0);
        assert_eq!(node.puct_select(PlayerId::new(0), 1.0), None);
        assert_eq!(node.most_visited(), None);
    }
}
