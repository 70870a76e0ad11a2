//! Game rules interface.
//!
//! The training loop is generic over `Game`; the rules themselves are
//! supplied by implementations such as `games::mpg`.

pub mod engine;

pub use engine::{Action, Game, GameState, Observation};
