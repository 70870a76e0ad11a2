//! Model traits and loss bookkeeping.
//!
//! These traits define the boundary between the training loop and a
//! value/policy model. The loop never looks inside the model: it runs
//! inference, asks for an update on a batch, and moves weights around as
//! opaque bytes.

use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Div};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::training::TrainInput;

/// Output of one forward pass.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Inference {
    /// Value estimate for the player to move, in `[-1, 1]`.
    pub value: f32,

    /// Probability for every distinct action (length = action space size).
    pub policy: Vec<f32>,
}

/// Loss breakdown of one or more update steps.
///
/// `total` is carried explicitly rather than recomputed, so sums and
/// averages of several updates stay consistent with what each reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Losses {
    pub policy: f64,
    pub value: f64,
    pub l2: f64,
    pub total: f64,
}

impl Losses {
    /// Create losses with `total = policy + value + l2`.
    pub fn new(policy: f64, value: f64, l2: f64) -> Self {
        Self {
            policy,
            value,
            l2,
            total: policy + value + l2,
        }
    }

    /// Average a set of losses. Returns zeros for an empty set.
    pub fn mean(losses: &[Losses]) -> Self {
        if losses.is_empty() {
            return Self::default();
        }
        losses.iter().copied().sum::<Losses>() / losses.len() as f64
    }
}

impl Add for Losses {
    type Output = Losses;

    fn add(self, other: Losses) -> Losses {
        Losses {
            policy: self.policy + other.policy,
            value: self.value + other.value,
            l2: self.l2 + other.l2,
            total: self.total + other.total,
        }
    }
}

impl Div<f64> for Losses {
    type Output = Losses;

    fn div(self, n: f64) -> Losses {
        Losses {
            policy: self.policy / n,
            value: self.value / n,
            l2: self.l2 / n,
            total: self.total / n,
        }
    }
}

impl Sum for Losses {
    fn sum<I: Iterator<Item = Losses>>(iter: I) -> Self {
        iter.fold(Losses::default(), |acc, l| acc + l)
    }
}

impl fmt::Display for Losses {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Losses(total: {:.3}, policy: {:.3}, value: {:.3}, l2: {:.3})",
            self.total, self.policy, self.value, self.l2
        )
    }
}

/// A trainable value/policy model.
///
/// Each worker owns its own instance; weights travel between workers only
/// as the bytes produced by `save_weights`.
pub trait Model: Send {
    /// Single forward pass.
    fn inference(&self, environment: &[f32], state: &[f32]) -> Result<Inference, ModelError>;

    /// One optimisation step on `batch`, returning the pre-update losses.
    fn update(&mut self, batch: &[TrainInput]) -> Result<Losses, ModelError>;

    /// Serialize the current weights.
    fn save_weights(&self) -> Result<Vec<u8>, ModelError>;

    /// Replace the current weights.
    fn load_weights(&mut self, bytes: &[u8]) -> Result<(), ModelError>;

    /// Number of trainable parameters.
    fn num_parameters(&self) -> usize;
}

/// Uniform policy, zero value, no parameters. Baseline for testing.
#[derive(Clone, Debug, Default)]
pub struct UniformModel {
    action_space_size: usize,
}

impl UniformModel {
    pub fn new(action_space_size: usize) -> Self {
        Self { action_space_size }
    }
}

impl Model for UniformModel {
    fn inference(&self, _environment: &[f32], _state: &[f32]) -> Result<Inference, ModelError> {
        let policy = if self.action_space_size == 0 {
            vec![]
        } else {
            vec![1.0 / self.action_space_size as f32; self.action_space_size]
        };
        Ok(Inference { value: 0.0, policy })
    }

    fn update(&mut self, batch: &[TrainInput]) -> Result<Losses, ModelError> {
        if batch.is_empty() {
            return Err(ModelError::EmptyBatch);
        }
        let uniform = 1.0 / self.action_space_size.max(1) as f64;
        let n = batch.len() as f64;
        let policy: f64 = batch
            .iter()
            .map(|input| {
                input
                    .policy
                    .iter()
                    .map(|&p| -(p as f64) * uniform.ln())
                    .sum::<f64>()
            })
            .sum();
        let value: f64 = batch.iter().map(|input| (input.value as f64).powi(2)).sum();
        Ok(Losses::new(policy / n, value / n, 0.0))
    }

    fn save_weights(&self) -> Result<Vec<u8>, ModelError> {
        Ok(bincode::serialize(&self.action_space_size)?)
    }

    fn load_weights(&mut self, bytes: &[u8]) -> Result<(), ModelError> {
        self.action_space_size = bincode::deserialize(bytes)?;
        Ok(())
    }

    fn num_parameters(&self) -> usize {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(value: f32) -> TrainInput {
        TrainInput {
            environment: vec![0.0; 2],
            state: vec![1.0],
            policy: vec![0.5, 0.5],
            value,
        }
    }

    #[test]
    fn test_losses_average() {
        let a = Losses { policy: 1.0, value: 1.0, l2: 1.0, total: 3.0 };
        let b = Losses { policy: 3.0, value: 1.0, l2: 2.0, total: 6.0 };

        let avg = (a + b) / 2.0;
        assert_eq!(avg, Losses { policy: 2.0, value: 1.0, l2: 1.5, total: 4.5 });
        assert_eq!(Losses::mean(&[a, b]), avg);
    }

    #[test]
    fn test_losses_mean_empty() {
        assert_eq!(Losses::mean(&[]), Losses::default());
    }

    #[test]
    fn test_losses_new_totals() {
        let l = Losses::new(0.5, 0.25, 0.125);
        assert_eq!(l.total, 0.875);
    }

    #[test]
    fn test_losses_display() {
        let l = Losses::new(1.0, 2.0, 0.0);
        assert_eq!(l.to_string(), "Losses(total: 3.000, policy: 1.000, value: 2.000, l2: 0.000)");
    }

    #[test]
    fn test_uniform_model_inference() {
        let model = UniformModel::new(4);
        let out = model.inference(&[], &[]).unwrap();
        assert_eq!(out.value, 0.0);
        assert_eq!(out.policy, vec![0.25; 4]);
    }

    #[test]
    fn test_uniform_model_zero_actions() {
        let model = UniformModel::new(0);
        assert!(model.inference(&[], &[]).unwrap().policy.is_empty());
    }

    #[test]
    fn test_uniform_model_update() {
        let mut model = UniformModel::new(2);
        let losses = model.update(&[input(1.0), input(-1.0)]).unwrap();
        assert!((losses.value - 1.0).abs() < 1e-9);
        assert!((losses.policy - std::f64::consts::LN_2).abs() < 1e-6);

        assert!(matches!(model.update(&[]), Err(ModelError::EmptyBatch)));
    }

    #[test]
    fn test_uniform_model_weights_roundtrip() {
        let model = UniformModel::new(5);
        let mut other = UniformModel::new(1);
        other.load_weights(&model.save_weights().unwrap()).unwrap();
        assert_eq!(other.inference(&[], &[]).unwrap().policy.len(), 5);
    }
}
