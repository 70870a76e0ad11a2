//! Error types for the training loop.
//!
//! Each concern has its own enum; `LoopError` is what the learner and the
//! worker threads return. A non-blocking channel receive that finds nothing
//! is not an error and never appears here.

use std::path::PathBuf;

use thiserror::Error;

/// Rejected configuration, detected before any worker starts.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Unsupported algorithm version: {0} (expected 1 or 2)")]
    UnsupportedVersion(u32),

    #[error("Invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Unknown game: {0}")]
    UnknownGame(String),

    #[error("Cannot read config {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Failures of the value/policy model or its checkpoints.
#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Input has {got} features, model expects {expected}")]
    ShapeMismatch { expected: usize, got: usize },

    #[error("Cannot update on an empty batch")]
    EmptyBatch,

    #[error("Weight serialization failed: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Checkpoint I/O failed for {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Replay buffer misuse.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum BufferError {
    #[error("Cannot sample from an empty replay buffer")]
    Empty,
}

/// Failures while evaluating a state for the search.
#[derive(Error, Debug)]
pub enum EvalError {
    #[error("Model inference failed: {0}")]
    Model(#[from] ModelError),

    #[error("State has no legal actions")]
    NoLegalActions,
}

/// Top-level error for the learner and worker loops.
#[derive(Error, Debug)]
pub enum LoopError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Buffer(#[from] BufferError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log record serialization failed: {0}")]
    Record(#[from] serde_json::Error),

    #[error("All actors disconnected before enough states were collected")]
    ActorsDisconnected,

    #[error("Worker thread `{0}` panicked")]
    WorkerPanicked(String),
}
