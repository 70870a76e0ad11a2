//! Streaming scalar statistics.

use serde::{Deserialize, Serialize};

/// Count, mean, standard deviation and range of a stream of values.
#[derive(Clone, Debug)]
pub struct BasicStats {
    num: u64,
    sum: f64,
    sum_sq: f64,
    min: f64,
    max: f64,
}

/// Serializable view of a `BasicStats`. All zero when nothing was added.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct BasicSnapshot {
    pub num: u64,
    pub min: f64,
    pub max: f64,
    pub avg: f64,
    pub std_dev: f64,
}

impl Default for BasicStats {
    fn default() -> Self {
        Self::new()
    }
}

impl BasicStats {
    pub fn new() -> Self {
        Self {
            num: 0,
            sum: 0.0,
            sum_sq: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }

    pub fn add(&mut self, value: f64) {
        self.num += 1;
        self.sum += value;
        self.sum_sq += value * value;
        self.min = self.min.min(value);
        self.max = self.max.max(value);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    #[must_use]
    pub fn num(&self) -> u64 {
        self.num
    }

    /// Mean, 0 when empty.
    #[must_use]
    pub fn avg(&self) -> f64 {
        if self.num == 0 {
            0.0
        } else {
            self.sum / self.num as f64
        }
    }

    /// Population standard deviation, 0 when empty.
    #[must_use]
    pub fn std_dev(&self) -> f64 {
        if self.num == 0 {
            return 0.0;
        }
        let mean = self.avg();
        (self.sum_sq / self.num as f64 - mean * mean).max(0.0).sqrt()
    }

    #[must_use]
    pub fn snapshot(&self) -> BasicSnapshot {
        if self.num == 0 {
            return BasicSnapshot::default();
        }
        BasicSnapshot {
            num: self.num,
            min: self.min,
            max: self.max,
            avg: self.avg(),
            std_dev: self.std_dev(),
        }
    }
}
