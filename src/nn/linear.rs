//! Linear value/policy model.
//!
//! Both heads read the concatenated `environment ++ state` features plus a
//! bias term:
//! - value head: `tanh(w · x)`
//! - policy head: `softmax(W x)` over every distinct action
//!
//! Training is plain SGD on cross-entropy (policy) plus squared error
//! (value), with L2 weight decay.

use serde::{Deserialize, Serialize};

use crate::core::{Config, SeededRng};
use crate::error::ModelError;
use crate::nn::traits::{Inference, Losses, Model};
use crate::rules::Game;
use crate::training::TrainInput;

const LOG_EPSILON: f32 = 1e-8;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct LinearWeights {
    input_size: usize,
    num_actions: usize,
    /// `input_size + 1` entries, bias last.
    value: Vec<f32>,
    /// Row-major `num_actions x (input_size + 1)`.
    policy: Vec<f32>,
}

impl LinearWeights {
    fn row_len(&self) -> usize {
        self.input_size + 1
    }

    fn policy_row(&self, action: usize) -> &[f32] {
        let len = self.row_len();
        &self.policy[action * len..(action + 1) * len]
    }
}

/// Linear model with a tanh value head and a softmax policy head.
#[derive(Clone, Debug)]
pub struct LinearModel {
    weights: LinearWeights,
    learning_rate: f32,
    weight_decay: f32,
}

impl LinearModel {
    /// Create a model with small random weights.
    pub fn new(input_size: usize, num_actions: usize, rng: &mut SeededRng) -> Self {
        let row_len = input_size + 1;
        let mut init = |n: usize| -> Vec<f32> {
            (0..n).map(|_| (rng.gen_f32() - 0.5) * 0.02).collect()
        };
        let weights = LinearWeights {
            input_size,
            num_actions,
            value: init(row_len),
            policy: init(num_actions * row_len),
        };
        Self {
            weights,
            learning_rate: 0.001,
            weight_decay: 0.0,
        }
    }

    /// Size the model for `game` and take optimiser settings from `config`.
    pub fn for_game<G: Game>(game: &G, config: &Config) -> Self {
        let (environment, state) = game.observation_size();
        let mut rng = SeededRng::new(config.seed).for_context("model-init");
        Self::new(environment + state, game.num_distinct_actions(), &mut rng)
            .with_learning_rate(config.learning_rate)
            .with_weight_decay(config.weight_decay)
    }

    pub fn with_learning_rate(mut self, learning_rate: f32) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f32) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    #[must_use]
    pub fn input_size(&self) -> usize {
        self.weights.input_size
    }

    #[must_use]
    pub fn num_actions(&self) -> usize {
        self.weights.num_actions
    }

    fn features(&self, environment: &[f32], state: &[f32]) -> Result<Vec<f32>, ModelError> {
        let got = environment.len() + state.len();
        if got != self.weights.input_size {
            return Err(ModelError::ShapeMismatch {
                expected: self.weights.input_size,
                got,
            });
        }
        let mut x = Vec::with_capacity(got + 1);
        x.extend_from_slice(environment);
        x.extend_from_slice(state);
        x.push(1.0);
        Ok(x)
    }

    fn forward(&self, x: &[f32]) -> (f32, Vec<f32>) {
        let value = dot(&self.weights.value, x).tanh();
        let logits: Vec<f32> = (0..self.weights.num_actions)
            .map(|a| dot(self.weights.policy_row(a), x))
            .collect();
        (value, softmax(&logits))
    }

    fn l2_penalty(&self) -> f64 {
        let squares: f32 = self
            .weights
            .value
            .iter()
            .chain(self.weights.policy.iter())
            .map(|w| w * w)
            .sum();
        f64::from(self.weight_decay * squares)
    }
}

impl Model for LinearModel {
    fn inference(&self, environment: &[f32], state: &[f32]) -> Result<Inference, ModelError> {
        let x = self.features(environment, state)?;
        let (value, policy) = self.forward(&x);
        Ok(Inference { value, policy })
    }

    fn update(&mut self, batch: &[TrainInput]) -> Result<Losses, ModelError> {
        if batch.is_empty() {
            return Err(ModelError::EmptyBatch);
        }
        let row_len = self.weights.row_len();
        let num_actions = self.weights.num_actions;

        let mut value_grad = vec![0.0f32; row_len];
        let mut policy_grad = vec![0.0f32; num_actions * row_len];
        let mut policy_loss = 0.0f64;
        let mut value_loss = 0.0f64;

        for input in batch {
            if input.policy.len() != num_actions {
                return Err(ModelError::ShapeMismatch {
                    expected: num_actions,
                    got: input.policy.len(),
                });
            }
            let x = self.features(&input.environment, &input.state)?;
            let (value, probs) = self.forward(&x);

            let error = value - input.value;
            value_loss += f64::from(error * error);
            let dv = 2.0 * error * (1.0 - value * value);
            for (g, xi) in value_grad.iter_mut().zip(&x) {
                *g += dv * xi;
            }

            let target_mass: f32 = input.policy.iter().sum();
            for a in 0..num_actions {
                let target = input.policy[a];
                policy_loss -= f64::from(target * (probs[a] + LOG_EPSILON).ln());
                let dlogit = probs[a] * target_mass - target;
                let row = &mut policy_grad[a * row_len..(a + 1) * row_len];
                for (g, xi) in row.iter_mut().zip(&x) {
                    *g += dlogit * xi;
                }
            }
        }

        let n = batch.len() as f32;
        let losses = Losses::new(
            policy_loss / f64::from(n),
            value_loss / f64::from(n),
            self.l2_penalty(),
        );

        let lr = self.learning_rate;
        let decay = 2.0 * self.weight_decay;
        for (w, g) in self.weights.value.iter_mut().zip(&value_grad) {
            *w -= lr * (g / n + decay * *w);
        }
        for (w, g) in self.weights.policy.iter_mut().zip(&policy_grad) {
            *w -= lr * (g / n + decay * *w);
        }

        Ok(losses)
    }

    fn save_weights(&self) -> Result<Vec<u8>, ModelError> {
        Ok(bincode::serialize(&self.weights)?)
    }

    fn load_weights(&mut self, bytes: &[u8]) -> Result<(), ModelError> {
        let weights: LinearWeights = bincode::deserialize(bytes)?;
        if weights.input_size != self.weights.input_size {
            return Err(ModelError::ShapeMismatch {
                expected: self.weights.input_size,
                got: weights.input_size,
            });
        }
        if weights.num_actions != self.weights.num_actions {
            return Err(ModelError::ShapeMismatch {
                expected: self.weights.num_actions,
                got: weights.num_actions,
            });
        }
        self.weights = weights;
        Ok(())
    }

    fn num_parameters(&self) -> usize {
        self.weights.value.len() + self.weights.policy.len()
    }
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}
