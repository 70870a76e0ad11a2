//! # az-selfplay
//!
//! Actor/learner/evaluator coordination for AlphaZero-style self-play
//! training.
//!
//! ## Design Principles
//!
//! 1. **No Shared Memory**: The learner and every worker run on their own
//!    threads and own all of their state. They talk only through channels
//!    and checkpoint files written by the learner.
//!
//! 2. **One Model Call Per State**: Each worker caches evaluations by exact
//!    state key and clears the cache whenever it loads new weights.
//!
//! 3. **Bounded Experience**: The replay buffer overwrites its oldest
//!    samples once full.
//!
//! ## Modules
//!
//! - `core`: Players, seeded RNG, configuration
//! - `rules`: `Game` / `GameState` traits
//! - `games`: Reference mean-payoff graph game
//! - `nn`: Model trait, linear reference model, checkpoints, broadcast
//! - `evaluator`: LRU-cached model evaluator and rollout baseline
//! - `search`: PUCT tree search driven by an evaluator
//! - `stats`: Streaming accumulators for the per-step report
//! - `training`: Actors, evaluation workers, replay buffer, learner
//! - `logging`: JSON-lines step records

pub mod core;
pub mod error;
pub mod evaluator;
pub mod games;
pub mod logging;
pub mod nn;
pub mod rules;
pub mod search;
pub mod stats;
pub mod training;

// Re-export commonly used types
pub use crate::core::{AlgorithmVersion, Config, PlayerId, PlayerMap, SeededRng};

pub use crate::error::{BufferError, ConfigError, EvalError, LoopError, ModelError};

pub use crate::rules::{Action, Game, GameState, Observation};

pub use crate::nn::{
    Broadcaster, CheckpointSink, CheckpointTag, LinearModel, Losses, Model, ModelResource,
    StateKey, UniformModel,
};

pub use crate::evaluator::{CacheInfo, CachedEvaluator, Evaluator};

pub use crate::search::{MctsBot, SearchConfig, SearchResult};

pub use crate::stats::{BasicStats, HistogramNamed, HistogramNumbered, SlidingWindow};

pub use crate::training::{
    alpha_zero, Actor, EvalResult, EvaluationWorker, Learner, ReplayBuffer, RunSummary,
    StateRecord, TrainInput, Trajectory,
};

pub use crate::logging::{DataLogger, StepRecord};
