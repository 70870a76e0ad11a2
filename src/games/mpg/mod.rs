//! Mean-payoff graph game used as the reference environment.
//!
//! - Each game is played on a random sinkless weighted digraph
//! - A chance event places the token on a uniformly random vertex
//! - Players alternate moving the token along an outgoing edge
//! - After `max_moves` moves, player 0 wins if the accumulated weight is
//!   positive, player 1 if it is negative; zero is a draw

mod game;
mod graph;

pub use game::{MeanPayoffGame, MpgState};
pub use graph::WeightedGraph;
