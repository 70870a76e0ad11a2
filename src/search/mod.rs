//! Monte Carlo tree search client of the `Evaluator` trait.
//!
//! ## Overview
//!
//! - **PUCT selection** at decision nodes, probability sampling at chance nodes
//! - **Root noise**: Dirichlet noise mixed into root priors during self-play
//! - **Temperature**: visit-count sampling early in the game, greedy later
//! - **Arena tree**: nodes in a flat `Vec`, addressed by `NodeId`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use az_selfplay::search::{MctsBot, SearchConfig};
//!
//! let mut bot = MctsBot::new(SearchConfig::self_play(&config), evaluator, rng);
//! let result = bot.step(&state, move_number)?;
//! state.apply_action(result.action);
//! ```

pub mod config;
pub mod node;
pub mod search;
pub mod stats;
pub mod tree;

pub use config::SearchConfig;
pub use node::{Edge, NodeId, SearchNode};
pub use search::{MctsBot, SearchResult};
pub use stats::SearchStats;
pub use tree::SearchTree;
