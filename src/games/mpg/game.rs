//! Mean-payoff game implementation.

use std::sync::Arc;

use crate::core::{PlayerId, PlayerMap, SeededRng};
use crate::rules::{Action, Game, GameState, Observation};

use super::graph::WeightedGraph;

/// Game factory. Each game draws a fresh random graph unless a fixed
/// environment is configured.
#[derive(Clone, Debug)]
pub struct MeanPayoffGame {
    nodes: usize,
    edge_probability: f64,
    max_weight: i32,
    max_moves: usize,
    fixed_graph: Option<Arc<WeightedGraph>>,
}

impl Default for MeanPayoffGame {
    fn default() -> Self {
        Self {
            nodes: 8,
            edge_probability: 0.3,
            max_weight: 10,
            max_moves: 16,
            fixed_graph: None,
        }
    }
}

impl MeanPayoffGame {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the vertex count (at least 1).
    pub fn nodes(mut self, nodes: usize) -> Self {
        self.nodes = nodes.max(1);
        self
    }

    pub fn edge_probability(mut self, p: f64) -> Self {
        self.edge_probability = p.clamp(0.0, 1.0);
        self
    }

    /// Set the weight bound (at least 1).
    pub fn max_weight(mut self, w: i32) -> Self {
        self.max_weight = w.abs().max(1);
        self
    }

    /// Set the game length in decision moves (at least 1).
    pub fn max_moves(mut self, moves: usize) -> Self {
        self.max_moves = moves.max(1);
        self
    }

    /// Play every game on the same graph. Overrides `nodes`.
    pub fn fixed_graph(mut self, graph: WeightedGraph) -> Self {
        self.nodes = graph.len();
        self.fixed_graph = Some(Arc::new(graph));
        self
    }
}

impl Game for MeanPayoffGame {
    type State = MpgState;

    fn name(&self) -> &str {
        "mpg"
    }

    fn new_initial_state(&self, rng: &mut SeededRng) -> MpgState {
        let graph = match &self.fixed_graph {
            Some(graph) => Arc::clone(graph),
            None => Arc::new(WeightedGraph::sinkless_gnp(
                self.nodes,
                self.edge_probability,
                self.max_weight,
                rng,
            )),
        };
        MpgState {
            graph,
            vertex: None,
            to_move: PlayerId::new(0),
            moves: 0,
            payoff: 0,
            max_moves: self.max_moves,
            max_weight: self.max_weight,
        }
    }

    fn num_distinct_actions(&self) -> usize {
        self.nodes
    }

    fn max_game_length(&self) -> usize {
        self.max_moves
    }

    fn observation_size(&self) -> (usize, usize) {
        (2 * self.nodes * self.nodes, self.nodes + 3)
    }
}

/// Position in a mean-payoff game.
///
/// The opening chance event places the token; players then alternate
/// moving it along an outgoing edge, player 0 maximizing and player 1
/// minimizing the accumulated weight.
#[derive(Clone, Debug)]
pub struct MpgState {
    graph: Arc<WeightedGraph>,
    vertex: Option<usize>,
    to_move: PlayerId,
    moves: usize,
    payoff: i64,
    max_moves: usize,
    max_weight: i32,
}

impl MpgState {
    /// Current token position (`None` before placement).
    #[must_use]
    pub fn vertex(&self) -> Option<usize> {
        self.vertex
    }

    /// Accumulated edge weight so far.
    #[must_use]
    pub fn payoff(&self) -> i64 {
        self.payoff
    }

    #[must_use]
    pub fn graph(&self) -> &WeightedGraph {
        &self.graph
    }
}

impl GameState for MpgState {
    fn current_player(&self) -> Option<PlayerId> {
        if self.is_chance_node() || self.is_terminal() {
            None
        } else {
            Some(self.to_move)
        }
    }

    fn is_terminal(&self) -> bool {
        self.moves >= self.max_moves
    }

    fn is_chance_node(&self) -> bool {
        self.vertex.is_none()
    }

    fn chance_outcomes(&self) -> Vec<(Action, f32)> {
        if !self.is_chance_node() {
            return Vec::new();
        }
        let n = self.graph.len();
        let p = 1.0 / n as f32;
        (0..n).map(|v| (Action::new(v as u32), p)).collect()
    }

    fn legal_actions(&self) -> Vec<Action> {
        match self.vertex {
            Some(u) if !self.is_terminal() => self
                .graph
                .successors(u)
                .iter()
                .map(|&(v, _)| Action::new(v as u32))
                .collect(),
            _ => Vec::new(),
        }
    }

    fn apply_action(&mut self, action: Action) {
        let target = action.index();
        assert!(target < self.graph.len(), "{} is not a vertex", action);

        match self.vertex {
            None => self.vertex = Some(target),
            Some(u) => {
                let weight = self.graph.weight(u, target);
                assert!(weight.is_some(), "{} is not a successor of vertex {}", action, u);
                self.payoff += i64::from(weight.unwrap_or(0));
                self.vertex = Some(target);
                self.moves += 1;
                self.to_move = self.to_move.opponent();
            }
        }
    }

    fn returns(&self) -> PlayerMap<f64> {
        if !self.is_terminal() {
            return PlayerMap::with_value(2, 0.0);
        }
        PlayerMap::zero_sum(PlayerId::new(0), self.payoff.signum() as f64)
    }

    fn observation(&self) -> Observation {
        let n = self.graph.len();
        let scale = self.max_weight as f32;

        let mut environment = vec![0.0f32; 2 * n * n];
        for u in 0..n {
            for &(v, w) in self.graph.successors(u) {
                environment[u * n + v] = 1.0;
                environment[n * n + u * n + v] = w as f32 / scale;
            }
        }

        let mut state = vec![0.0f32; n + 3];
        if let Some(v) = self.vertex {
            state[v] = 1.0;
        }
        state[n] = self.to_move.index() as f32;
        state[n + 1] = self.payoff as f32 / (self.moves.max(1) as f32 * scale);
        state[n + 2] = self.moves as f32 / self.max_moves as f32;

        Observation::new(environment, state)
    }
}
