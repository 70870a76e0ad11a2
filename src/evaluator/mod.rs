//! Leaf evaluation for the tree search.
//!
//! The search needs exactly two things from an evaluator:
//! - `evaluate`: a value estimate for a position
//! - `prior`: a probability for each available action
//!
//! `CachedEvaluator` answers both from one cached model forward pass;
//! `RandomRolloutEvaluator` plays random games and needs no model.

mod cached;
mod rollout;

pub use cached::{CacheInfo, CachedEvaluator};
pub use rollout::RandomRolloutEvaluator;

use crate::error::EvalError;
use crate::rules::{Action, GameState};

/// Value and prior source for the search.
pub trait Evaluator<S: GameState> {
    /// `[v, -v]`, where `v` is the value for the player to move (player 0
    /// at chance nodes) and `-v` the value for the other player.
    fn evaluate(&mut self, state: &S) -> Result<[f32; 2], EvalError>;

    /// `(action, probability)` for every legal action, or the outcome
    /// distribution at a chance node.
    fn prior(&mut self, state: &S) -> Result<Vec<(Action, f32)>, EvalError>;
}
