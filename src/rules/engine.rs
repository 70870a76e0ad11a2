//! Game interface consumed by the search, the actors and the evaluators.
//!
//! Game rules live outside the training loop. Games implement `Game`
//! (the factory and static shape information) and `GameState` (one
//! position). The loop only ever:
//! - asks whose turn it is, or whether a chance event is pending
//! - enumerates legal actions or chance outcomes
//! - applies actions
//! - reads observation features and final returns

use serde::{Deserialize, Serialize};

use crate::core::{PlayerId, PlayerMap, SeededRng};

/// Action identifier in `0..num_distinct_actions`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Action(pub u32);

impl Action {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Position of this action in a policy vector.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Action({})", self.0)
    }
}

/// Observation split into the two model inputs.
///
/// `environment` describes the fixed game instance (e.g. the board or
/// graph); `state` describes the position within it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub environment: Vec<f32>,
    pub state: Vec<f32>,
}

impl Observation {
    pub fn new(environment: Vec<f32>, state: Vec<f32>) -> Self {
        Self { environment, state }
    }

    /// Total number of features.
    #[must_use]
    pub fn len(&self) -> usize {
        self.environment.len() + self.state.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Factory and shape information for a two-player zero-sum game.
pub trait Game: Clone + Send + 'static {
    type State: GameState;

    /// Short identifier used in configs and logs.
    fn name(&self) -> &str;

    /// Start a new game. Randomized games draw their instance from `rng`.
    fn new_initial_state(&self, rng: &mut SeededRng) -> Self::State;

    /// Size of the policy vector.
    fn num_distinct_actions(&self) -> usize;

    /// Upper bound on the number of decision moves in one game.
    fn max_game_length(&self) -> usize;

    /// `(environment, state)` feature counts of every observation.
    fn observation_size(&self) -> (usize, usize);
}

/// One position of a game.
///
/// `apply_action` must be deterministic: the search replays actions on
/// cloned states and expects identical results.
pub trait GameState: Clone + Send {
    /// Player to move, `None` at chance and terminal nodes.
    fn current_player(&self) -> Option<PlayerId>;

    fn is_terminal(&self) -> bool;

    fn is_chance_node(&self) -> bool;

    /// Outcome distribution of a chance node. Empty elsewhere.
    fn chance_outcomes(&self) -> Vec<(Action, f32)>;

    /// Legal actions for the player to move. Empty at chance and terminal nodes.
    fn legal_actions(&self) -> Vec<Action>;

    fn apply_action(&mut self, action: Action);

    /// Per-player returns; meaningful once the game is terminal.
    fn returns(&self) -> PlayerMap<f64>;

    fn observation(&self) -> Observation;

    /// Sample one chance outcome according to its probability.
    fn sample_chance_outcome(&self, rng: &mut SeededRng) -> Option<Action> {
        let outcomes = self.chance_outcomes();
        let weights: Vec<f32> = outcomes.iter().map(|(_, p)| *p).collect();
        rng.choose_weighted(&weights).map(|i| outcomes[i].0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_index() {
        let action = Action::new(7);
        assert_eq!(action.index(), 7);
        assert_eq!(format!("{}", action), "Action(7)");
    }

    #[test]
    fn test_observation_len() {
        let obs = Observation::new(vec![0.0; 4], vec![1.0; 3]);
        assert_eq!(obs.len(), 7);
        assert!(!obs.is_empty());
        assert!(Observation::new(vec![], vec![]).is_empty());
    }
}
