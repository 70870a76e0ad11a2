//! Model-free evaluator: averages the outcome of random playouts.

use crate::core::{PlayerId, SeededRng};
use crate::error::EvalError;
use crate::evaluator::Evaluator;
use crate::rules::{Action, GameState};

/// Estimates values by random rollouts and uses a uniform prior.
///
/// Used as the fixed-strength opponent during evaluation: its strength
/// depends only on the simulation budget of the search it drives.
#[derive(Clone, Debug)]
pub struct RandomRolloutEvaluator {
    rollouts: usize,
    rng: SeededRng,
}

impl RandomRolloutEvaluator {
    pub fn new(rollouts: usize, rng: SeededRng) -> Self {
        Self {
            rollouts: rollouts.max(1),
            rng,
        }
    }

    fn rollout<S: GameState>(&mut self, state: &S) -> Option<f64> {
        let mut state = state.clone();
        while !state.is_terminal() {
            let action = if state.is_chance_node() {
                state.sample_chance_outcome(&mut self.rng)?
            } else {
                let legal = state.legal_actions();
                if legal.is_empty() {
                    return None;
                }
                legal[self.rng.gen_range_usize(0..legal.len())]
            };
            state.apply_action(action);
        }
        Some(state.returns()[PlayerId::new(0)])
    }
}

impl<S: GameState> Evaluator<S> for RandomRolloutEvaluator {
    fn evaluate(&mut self, state: &S) -> Result<[f32; 2], EvalError> {
        let mut total = 0.0;
        for _ in 0..self.rollouts {
            total += self.rollout(state).ok_or(EvalError::NoLegalActions)?;
        }
        let p0 = (total / self.rollouts as f64) as f32;
        let value = match state.current_player() {
            Some(player) if player != PlayerId::new(0) => -p0,
            _ => p0,
        };
        Ok([value, -value])
    }

    fn prior(&mut self, state: &S) -> Result<Vec<(Action, f32)>, EvalError> {
        if state.is_chance_node() {
            return Ok(state.chance_outcomes());
        }
        let legal = state.legal_actions();
        if legal.is_empty() {
            return Err(EvalError::NoLegalActions);
        }
        let p = 1.0 / legal.len() as f32;
        Ok(legal.into_iter().map(|a| (a, p)).collect())
    }
}
