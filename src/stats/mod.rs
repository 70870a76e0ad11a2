//! Streaming accumulators for the learner's per-step report.
//!
//! - `BasicStats`: count, mean, standard deviation, range
//! - `HistogramNumbered`: fixed integer buckets (game length)
//! - `HistogramNamed`: named categories (outcomes)
//! - `SlidingWindow`: most recent values (evaluation results)
//!
//! Each has `add`, `reset` and a serde snapshot for the JSON log.

mod basic;
mod histogram;
mod window;

pub use basic::{BasicSnapshot, BasicStats};
pub use histogram::{HistogramNamed, HistogramNumbered, NamedSnapshot};
pub use window::{SlidingWindow, WindowSnapshot};
