//! Core types shared by every worker: players, RNG, configuration.

pub mod config;
pub mod player;
pub mod rng;

pub use config::{AlgorithmVersion, Config};
pub use player::{PlayerId, PlayerMap};
pub use rng::SeededRng;
