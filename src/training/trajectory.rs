//! Self-play game records and training inputs.
//!
//! A trajectory records one complete game from self-play:
//! - observation features at each decision point
//! - search visit distribution (the policy target)
//! - search root value at record time (for calibration stats)
//! - final returns, which become the value targets

use serde::{Deserialize, Serialize};

use crate::core::{PlayerId, PlayerMap};
use crate::rules::Observation;

/// One recorded position. Immutable once created.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StateRecord {
    pub environment: Vec<f32>,
    pub state: Vec<f32>,

    /// Search visit fractions, one per distinct action.
    pub policy: Vec<f32>,

    /// Search root value for the player to move.
    pub value: f32,

    pub current_player: Option<PlayerId>,
    pub is_chance: bool,
}

impl StateRecord {
    pub fn new(
        observation: Observation,
        policy: Vec<f32>,
        value: f32,
        current_player: Option<PlayerId>,
        is_chance: bool,
    ) -> Self {
        Self {
            environment: observation.environment,
            state: observation.state,
            policy,
            value,
            current_player,
            is_chance,
        }
    }

    /// Player whose return is the value target (player 0 at chance nodes).
    #[must_use]
    pub fn acting_player(&self) -> PlayerId {
        self.current_player.unwrap_or(PlayerId::new(0))
    }
}

/// Final outcome class from player 0's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    FirstPlayerWin,
    SecondPlayerWin,
    Draw,
}

impl Outcome {
    /// Category names, in `index` order.
    pub const NAMES: [&'static str; 3] = ["Player1", "Player2", "Draw"];

    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }
}

/// A complete self-play game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trajectory {
    pub states: Vec<StateRecord>,

    /// Final return per player.
    pub returns: PlayerMap<f64>,
}

impl Trajectory {
    pub fn new(states: Vec<StateRecord>, returns: PlayerMap<f64>) -> Self {
        Self { states, returns }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.states.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Value target of `record`: the return of its acting player.
    #[must_use]
    pub fn value_target(&self, record: &StateRecord) -> f32 {
        self.returns[record.acting_player()] as f32
    }

    #[must_use]
    pub fn outcome(&self) -> Outcome {
        let first = self.returns[PlayerId::new(0)];
        if first > 0.0 {
            Outcome::FirstPlayerWin
        } else if first < 0.0 {
            Outcome::SecondPlayerWin
        } else {
            Outcome::Draw
        }
    }

    /// Project every record into a training input.
    pub fn train_inputs(&self) -> impl Iterator<Item = TrainInput> + '_ {
        self.states.iter().map(move |record| TrainInput {
            environment: record.environment.clone(),
            state: record.state.clone(),
            policy: record.policy.clone(),
            value: self.value_target(record),
        })
    }

    /// Record at `stage` of `stages` evenly spaced positions (first to last).
    #[must_use]
    pub fn stage_record(&self, stage: usize, stages: usize) -> Option<&StateRecord> {
        if self.states.is_empty() || stages < 2 {
            return self.states.first();
        }
        let index = (self.states.len() - 1) * stage.min(stages - 1) / (stages - 1);
        self.states.get(index)
    }
}

/// Buffer-resident training sample.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrainInput {
    pub environment: Vec<f32>,
    pub state: Vec<f32>,
    pub policy: Vec<f32>,
    pub value: f32,
}
