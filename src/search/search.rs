//! PUCT tree search driven by an `Evaluator`.
//!
//! Each simulation walks from the root, choosing edges by PUCT at decision
//! nodes and sampling by probability at chance nodes, until it reaches a
//! terminal node or a node not yet expanded. Expansion asks the evaluator
//! for a prior and a value; the value is backed up along the path.

use std::time::Instant;

use crate::core::{PlayerId, PlayerMap, SeededRng};
use crate::error::EvalError;
use crate::evaluator::Evaluator;
use crate::rules::{Action, GameState};

use super::config::SearchConfig;
use super::node::{Edge, NodeId};
use super::stats::SearchStats;
use super::tree::SearchTree;

/// Outcome of searching one position.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchResult {
    /// The move to play.
    pub action: Action,

    /// Root visit count per available action.
    pub visits: Vec<(Action, u32)>,

    /// Root value estimate for the player to move.
    pub value: f32,
}

impl SearchResult {
    /// Visit fractions as a dense vector of length `num_actions`.
    #[must_use]
    pub fn policy(&self, num_actions: usize) -> Vec<f32> {
        let mut policy = vec![0.0f32; num_actions];
        let total: u32 = self.visits.iter().map(|(_, v)| v).sum();
        if total == 0 {
            let uniform = 1.0 / self.visits.len().max(1) as f32;
            for (action, _) in &self.visits {
                policy[action.index()] = uniform;
            }
        } else {
            for (action, visits) in &self.visits {
                policy[action.index()] = *visits as f32 / total as f32;
            }
        }
        policy
    }
}

/// Search-based player.
///
/// Owns its evaluator, tree and RNG; generic over the evaluator so the
/// same search serves self-play (model-backed) and evaluation opponents
/// (random rollouts).
pub struct MctsBot<E> {
    config: SearchConfig,
    evaluator: E,
    tree: SearchTree,
    rng: SeededRng,
    stats: SearchStats,
    root_value: f32,
}

impl<E> MctsBot<E> {
    pub fn new(config: SearchConfig, evaluator: E, rng: SeededRng) -> Self {
        Self {
            config,
            evaluator,
            tree: SearchTree::new(),
            rng,
            stats: SearchStats::default(),
            root_value: 0.0,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn evaluator(&self) -> &E {
        &self.evaluator
    }

    /// Mutable access, e.g. to load new weights between moves.
    pub fn evaluator_mut(&mut self) -> &mut E {
        &mut self.evaluator
    }

    pub fn stats(&self) -> &SearchStats {
        &self.stats
    }

    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }

    /// Search `state` and pick a move. `move_number` counts decision moves
    /// played so far and controls the temperature schedule.
    pub fn step<S: GameState>(
        &mut self,
        state: &S,
        move_number: usize,
    ) -> Result<SearchResult, EvalError>
    where
        E: Evaluator<S>,
    {
        self.search(state)?;

        let root = self.tree.root_node();
        let visits: Vec<(Action, u32)> = root.edges.iter().map(|e| (e.action, e.visits)).collect();
        let total: u32 = visits.iter().map(|(_, v)| v).sum();
        let mover = root.to_move.unwrap_or(PlayerId::new(0));
        let value = if total == 0 {
            self.root_value
        } else {
            let sum: f64 = root.edges.iter().map(|e| e.total_reward[mover]).sum();
            (sum / f64::from(total)) as f32
        };

        let edge_idx = self.choose_root_edge(move_number)?;
        let action = self.tree.root_node().edges[edge_idx].action;
        Ok(SearchResult {
            action,
            visits,
            value,
        })
    }

    /// Run `max_simulations` simulations from `state`, rebuilding the tree.
    pub fn search<S: GameState>(&mut self, state: &S) -> Result<(), EvalError>
    where
        E: Evaluator<S>,
    {
        let start = Instant::now();
        self.stats.reset();
        self.tree.reset();

        if state.is_terminal() {
            return Err(EvalError::NoLegalActions);
        }

        let root = self.tree.root();
        let rewards = self.expand(root, state)?;
        let mover = state.current_player().unwrap_or(PlayerId::new(0));
        self.root_value = rewards[mover] as f32;
        self.add_root_noise();

        for _ in 0..self.config.max_simulations {
            let mut sim_state = state.clone();
            self.simulate(&mut sim_state)?;
            self.stats.simulations += 1;

            if self.tree.len() >= self.config.max_nodes {
                break;
            }
        }

        self.stats.max_depth = self.tree.max_depth();
        self.stats.time_us = start.elapsed().as_micros() as u64;
        Ok(())
    }

    /// One simulation: select, expand, backpropagate.
    fn simulate<S: GameState>(&mut self, state: &mut S) -> Result<(), EvalError>
    where
        E: Evaluator<S>,
    {
        let mut path: Vec<(NodeId, usize)> = Vec::new();
        let mut current = self.tree.root();

        let rewards = loop {
            let node = self.tree.get(current);
            if let Some(reward) = &node.terminal_reward {
                break reward.clone();
            }
            if !node.expanded {
                break self.expand(current, state)?;
            }

            let edge_idx = self.select(current)?;
            path.push((current, edge_idx));

            let edge = &self.tree.get(current).edges[edge_idx];
            let (action, child) = (edge.action, edge.child);
            state.apply_action(action);

            current = if child.is_none() {
                self.tree.alloc_child(current, edge_idx)
            } else {
                child
            };
        };

        self.backpropagate(&path, &rewards);
        Ok(())
    }

    /// Create edges for `node_id` and return the leaf rewards.
    fn expand<S: GameState>(&mut self, node_id: NodeId, state: &S) -> Result<PlayerMap<f64>, EvalError>
    where
        E: Evaluator<S>,
    {
        if state.is_terminal() {
            let rewards = state.returns();
            let node = self.tree.get_mut(node_id);
            node.terminal_reward = Some(rewards.clone());
            node.expanded = true;
            return Ok(rewards);
        }

        let prior = self.evaluator.prior(state)?;
        let [value, _] = self.evaluator.evaluate(state)?;
        let perspective = state.current_player().unwrap_or(PlayerId::new(0));

        let node = self.tree.get_mut(node_id);
        node.to_move = state.current_player();
        node.is_chance = state.is_chance_node();
        node.edges = prior.into_iter().map(|(a, p)| Edge::new(a, p)).collect();
        node.expanded = true;
        self.stats.nodes_expanded += 1;

        Ok(PlayerMap::zero_sum(perspective, f64::from(value)))
    }

    fn select(&mut self, node_id: NodeId) -> Result<usize, EvalError> {
        let node = self.tree.get(node_id);
        let choice = if node.is_chance {
            let weights: Vec<f32> = node.edges.iter().map(|e| e.prior).collect();
            self.rng.choose_weighted(&weights)
        } else {
            let player = node.to_move.unwrap_or(PlayerId::new(0));
            node.puct_select(player, self.config.uct_c)
        };
        choice.ok_or(EvalError::NoLegalActions)
    }

    fn backpropagate(&mut self, path: &[(NodeId, usize)], rewards: &PlayerMap<f64>) {
        for &(node_id, edge_idx) in path.iter().rev() {
            let node = self.tree.get_mut(node_id);
            node.visits += 1;

            let edge = &mut node.edges[edge_idx];
            edge.visits += 1;
            for player in PlayerId::all(rewards.player_count()) {
                edge.total_reward[player] += rewards[player];
            }
        }
    }

    fn add_root_noise(&mut self) {
        let epsilon = self.config.dirichlet_epsilon;
        let root = self.tree.root();
        if epsilon <= 0.0 || self.tree.get(root).is_chance {
            return;
        }
        let n = self.tree.get(root).edges.len();
        let noise = self.rng.dirichlet(self.config.dirichlet_alpha, n);
        for (edge, eta) in self.tree.get_mut(root).edges.iter_mut().zip(noise) {
            edge.prior = (1.0 - epsilon) * edge.prior + epsilon * eta;
        }
    }

    fn choose_root_edge(&mut self, move_number: usize) -> Result<usize, EvalError> {
        let root = self.tree.root_node();
        if root.is_chance {
            let weights: Vec<f32> = root.edges.iter().map(|e| e.prior).collect();
            return self.rng.choose_weighted(&weights).ok_or(EvalError::NoLegalActions);
        }

        let temperature = self.config.temperature;
        if temperature > 0.0 && move_number < self.config.temperature_drop {
            let weights: Vec<f32> = root
                .edges
                .iter()
                .map(|e| (e.visits as f32).powf(1.0 / temperature))
                .collect();
            if let Some(idx) = self.rng.choose_weighted(&weights) {
                return Ok(idx);
            }
        }
        self.tree.root_node().most_visited().ok_or(EvalError::NoLegalActions)
    }
}
