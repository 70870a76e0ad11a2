//! The distributed self-play training loop.
//!
//! ## Overview
//!
//! - **Actor**: plays self-play games and sends one `Trajectory` per game
//! - **EvaluationWorker**: plays the current model against search baselines
//! - **Learner**: collects trajectories into the `ReplayBuffer`, trains,
//!   checkpoints, broadcasts and logs
//! - **alpha_zero**: spawns all of the above on their own threads
//!
//! ## Usage
//!
//! ```rust,ignore
//! use az_selfplay::core::Config;
//! use az_selfplay::games::mpg::MeanPayoffGame;
//! use az_selfplay::nn::LinearModel;
//! use az_selfplay::training::alpha_zero;
//!
//! let game = MeanPayoffGame::new().nodes(8);
//! let config = Config::default().with_max_steps(10);
//! let summary = alpha_zero(&config, game.clone(), || LinearModel::for_game(&game, &config))?;
//! ```

pub mod actor;
pub mod evaluation;
pub mod feed;
pub mod launch;
pub mod learner;
pub mod replay_buffer;
pub mod trajectory;

pub use actor::{Actor, ActorSummary};
pub use evaluation::{opponent_simulations, EvalResult, EvaluationWorker};
pub use feed::CheckpointFeed;
pub use launch::{alpha_zero, RunSummary};
pub use learner::{Learner, LearnerSummary, Phase, STAGE_COUNT};
pub use replay_buffer::{BufferAnalysis, ReplayBuffer};
pub use trajectory::{Outcome, StateRecord, TrainInput, Trajectory};
