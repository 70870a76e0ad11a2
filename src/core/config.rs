//! Training-loop configuration.
//!
//! `Config` is built once at startup (defaults, JSON file, then CLI
//! overrides), validated, and shared read-only with every worker.
//! Every recognized field is enumerated here; unknown JSON keys are
//! rejected.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Which collection discipline the learner runs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlgorithmVersion {
    /// Collect `replay_buffer_size / replay_buffer_reuse` new states per step.
    ReuseThreshold,
    /// Refill the buffer each step and train on it once it is refreshed.
    Refresh,
}

impl TryFrom<u32> for AlgorithmVersion {
    type Error = ConfigError;

    fn try_from(version: u32) -> Result<Self, Self::Error> {
        match version {
            1 => Ok(Self::ReuseThreshold),
            2 => Ok(Self::Refresh),
            other => Err(ConfigError::UnsupportedVersion(other)),
        }
    }
}

/// Immutable training configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Game identity (e.g. `"mpg"`).
    pub game: String,

    /// Directory for checkpoints and the JSON-lines log.
    pub path: PathBuf,

    /// Algorithm selector: 1 = reuse threshold, 2 = refresh.
    pub version: u32,

    pub learning_rate: f32,
    pub weight_decay: f32,

    /// Sub-batch size for each model update call.
    pub train_batch_size: usize,

    /// Replay buffer capacity in states.
    pub replay_buffer_size: usize,

    /// How many times each state is expected to be learned from.
    pub replay_buffer_reuse: usize,

    /// Train on a full pass over the buffer instead of a random draw.
    pub dataset_mode: bool,

    /// Draws per training step; 0 means "as many as the buffer holds".
    pub samples_per_iteration: usize,

    /// States the buffer must hold before it counts as refreshed (version 2).
    pub refresh_min_states: usize,

    /// Keep a numbered checkpoint every N steps.
    pub checkpoint_freq: u64,

    /// Learner step budget; `<= 0` runs forever.
    pub max_steps: i64,

    pub actors: usize,
    pub evaluators: usize,

    /// Sliding window size for evaluation results.
    pub evaluation_window: usize,

    /// Number of opponent difficulty levels.
    pub eval_levels: usize,

    pub uct_c: f32,
    pub max_simulations: u32,
    pub policy_alpha: f32,
    pub policy_epsilon: f32,
    pub temperature: f32,

    /// Play greedily after this many moves.
    pub temperature_drop: usize,

    /// Per-worker inference cache capacity.
    pub cache_size: usize,

    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            game: "mpg".to_string(),
            path: PathBuf::from("az-run"),
            version: 1,
            learning_rate: 0.001,
            weight_decay: 0.0001,
            train_batch_size: 1 << 10,
            replay_buffer_size: 1 << 16,
            replay_buffer_reuse: 3,
            dataset_mode: false,
            samples_per_iteration: 0,
            refresh_min_states: 1 << 10,
            checkpoint_freq: 100,
            max_steps: 0,
            actors: 2,
            evaluators: 1,
            evaluation_window: 100,
            eval_levels: 7,
            uct_c: 2.0,
            max_simulations: 300,
            policy_alpha: 1.0,
            policy_epsilon: 0.25,
            temperature: 1.0,
            temperature_drop: 10,
            cache_size: 1 << 16,
            seed: 0,
        }
    }
}

impl Config {
    /// Create a config with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a config from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&text)?)
    }

    /// The selected algorithm version.
    pub fn algorithm(&self) -> Result<AlgorithmVersion, ConfigError> {
        AlgorithmVersion::try_from(self.version)
    }

    /// New states collected per learner step in version 1.
    #[must_use]
    pub fn learn_rate(&self) -> usize {
        self.replay_buffer_size / self.replay_buffer_reuse.max(1)
    }

    /// Reject configurations the loop cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.algorithm()?;

        let positive: [(&'static str, usize); 6] = [
            ("replay_buffer_size", self.replay_buffer_size),
            ("replay_buffer_reuse", self.replay_buffer_reuse),
            ("train_batch_size", self.train_batch_size),
            ("actors", self.actors),
            ("eval_levels", self.eval_levels),
            ("evaluation_window", self.evaluation_window),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must be at least 1".to_string(),
                });
            }
        }

        if self.replay_buffer_reuse > self.replay_buffer_size {
            return Err(ConfigError::Invalid {
                field: "replay_buffer_reuse",
                reason: format!(
                    "{} exceeds replay_buffer_size {}",
                    self.replay_buffer_reuse, self.replay_buffer_size
                ),
            });
        }
        if self.checkpoint_freq == 0 {
            return Err(ConfigError::Invalid {
                field: "checkpoint_freq",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.max_simulations == 0 {
            return Err(ConfigError::Invalid {
                field: "max_simulations",
                reason: "must be at least 1".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.policy_epsilon) {
            return Err(ConfigError::Invalid {
                field: "policy_epsilon",
                reason: format!("{} is outside [0, 1]", self.policy_epsilon),
            });
        }
        if self.policy_alpha <= 0.0 {
            return Err(ConfigError::Invalid {
                field: "policy_alpha",
                reason: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = version;
        self
    }

    /// Set replay buffer capacity and reuse factor together.
    pub fn with_replay_buffer(mut self, size: usize, reuse: usize) -> Self {
        self.replay_buffer_size = size;
        self.replay_buffer_reuse = reuse;
        self
    }

    pub fn with_train_batch_size(mut self, size: usize) -> Self {
        self.train_batch_size = size;
        self
    }

    pub fn with_max_steps(mut self, steps: i64) -> Self {
        self.max_steps = steps;
        self
    }

    pub fn with_checkpoint_freq(mut self, freq: u64) -> Self {
        self.checkpoint_freq = freq;
        self
    }

    /// Set worker counts.
    pub fn with_workers(mut self, actors: usize, evaluators: usize) -> Self {
        self.actors = actors;
        self.evaluators = evaluators;
        self
    }

    /// Set evaluation window size and difficulty level count.
    pub fn with_evaluation(mut self, window: usize, levels: usize) -> Self {
        self.evaluation_window = window;
        self.eval_levels = levels;
        self
    }

    pub fn with_max_simulations(mut self, simulations: u32) -> Self {
        self.max_simulations = simulations;
        self
    }

    pub fn with_dataset_mode(mut self, enabled: bool) -> Self {
        self.dataset_mode = enabled;
        self
    }

    pub fn with_refresh_min_states(mut self, states: usize) -> Self {
        self.refresh_min_states = states;
        self
    }

    pub fn with_cache_size(mut self, size: usize) -> Self {
        self.cache_size = size;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}
