//! Structured per-step records.
//!
//! Human-readable progress goes through the `log` facade. The learner
//! additionally writes one JSON object per step to `<path>/learner.jsonl`
//! for plotting and analysis.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::LoopError;
use crate::nn::Losses;
use crate::stats::{BasicSnapshot, NamedSnapshot};
use crate::training::BufferAnalysis;

/// Appends JSON lines to a file, flushing after every record.
#[derive(Debug)]
pub struct DataLogger {
    writer: BufWriter<File>,
    path: PathBuf,
}

impl DataLogger {
    /// Create (or truncate) `<dir>/<name>.jsonl`.
    pub fn create(dir: &Path, name: &str) -> Result<Self, LoopError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(format!("{}.jsonl", name));
        let file = File::create(&path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn write<T: Serialize>(&mut self, record: &T) -> Result<(), LoopError> {
        serde_json::to_writer(&mut self.writer, record)?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}

/// Loss breakdown as logged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LossRecord {
    pub policy: f64,
    pub value: f64,
    pub l2reg: f64,
    pub sum: f64,
}

impl From<Losses> for LossRecord {
    fn from(losses: Losses) -> Self {
        Self {
            policy: losses.policy,
            value: losses.value,
            l2reg: losses.l2,
            sum: losses.total,
        }
    }
}

/// Inference cache counters. Caches live in other workers, so the learner
/// always reports zeros.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheRecord {
    pub size: u64,
    pub max_size: u64,
    pub usage: f64,
    pub requests: u64,
    pub requests_per_s: f64,
    pub hits: u64,
    pub misses: u64,
    pub misses_per_s: f64,
    pub hit_rate: f64,
}

/// Evaluation window summary.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EvalSummary {
    /// Results ever received at the lowest difficulty.
    pub count: u64,
    /// Mean outcome per difficulty level, 0 for empty windows.
    pub results: Vec<f64>,
}

/// One learner step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StepRecord {
    pub step: u64,
    pub states_per_s: f64,
    pub states_per_s_actor: f64,
    pub total_trajectories: u64,
    pub trajectories_per_s: f64,
    pub queue_size: u64,

    /// `buffer_size`, `buffer_capacity`, `total_states`, `reuse`.
    #[serde(flatten)]
    pub buffer: BufferAnalysis,

    pub game_length: BasicSnapshot,
    pub game_length_hist: Vec<u64>,
    pub outcomes: NamedSnapshot,
    pub value_accuracy: Vec<BasicSnapshot>,
    pub value_prediction: Vec<BasicSnapshot>,
    pub eval: EvalSummary,
    pub batch_size: BasicSnapshot,
    pub batch_size_hist: Vec<u64>,
    pub loss: LossRecord,
    pub cache: CacheRecord,
    pub model_hash: String,

    /// Checkpoint number, `-1` for the rolling latest slot.
    pub checkpoint: i64,
}
