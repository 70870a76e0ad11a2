//! Deterministic random number generation with forking.
//!
//! Every worker owns its own `SeededRng`, derived from the run seed with
//! `for_context`, so runs are reproducible without sharing RNG state
//! between threads.
//!
//! ```
//! use az_selfplay::core::SeededRng;
//!
//! let root = SeededRng::new(42);
//! let mut actor0 = root.for_context("actor-0");
//! let mut actor1 = root.for_context("actor-1");
//!
//! // Independent streams per worker
//! assert_ne!(actor0.gen_range_usize(0..1_000_000), actor1.gen_range_usize(0..1_000_000));
//! ```

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::{Binomial, Distribution, Gamma};
use std::hash::{Hash, Hasher};

/// Deterministic RNG with forking and per-context streams.
///
/// Uses ChaCha8 for speed while keeping good statistical quality.
#[derive(Clone, Debug)]
pub struct SeededRng {
    inner: ChaCha8Rng,
    seed: u64,
    fork_counter: u64,
}

impl SeededRng {
    /// Create a new RNG with the given seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            fork_counter: 0,
        }
    }

    /// The seed this stream was created from.
    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Fork this RNG to create an independent branch.
    ///
    /// Each fork produces a different but deterministic sequence.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.fork_counter += 1;
        let fork_seed = self.seed.wrapping_add(self.fork_counter.wrapping_mul(0x9E3779B97F4A7C15));
        Self::new(fork_seed)
    }

    /// Create an independent stream for a named context (e.g. `"actor-3"`).
    ///
    /// The same context always produces the same stream from the same seed.
    #[must_use]
    pub fn for_context(&self, context: &str) -> Self {
        let mut hasher = rustc_hash::FxHasher::default();
        self.seed.hash(&mut hasher);
        context.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Generate a random usize in the given range.
    pub fn gen_range_usize(&mut self, range: std::ops::Range<usize>) -> usize {
        self.inner.gen_range(range)
    }

    /// Generate a random integer in the given inclusive range.
    pub fn gen_range_i32(&mut self, range: std::ops::RangeInclusive<i32>) -> i32 {
        self.inner.gen_range(range)
    }

    /// Uniform float in `[0, 1)`.
    pub fn gen_f32(&mut self) -> f32 {
        self.inner.gen::<f32>()
    }

    /// Choose a random index with weighted probability.
    ///
    /// Weights do not need to sum to 1.0. Returns `None` if weights are
    /// empty or all zero.
    pub fn choose_weighted(&mut self, weights: &[f32]) -> Option<usize> {
        if weights.is_empty() {
            return None;
        }

        let total: f32 = weights.iter().sum();
        if total <= 0.0 {
            return None;
        }

        let mut threshold = self.inner.gen::<f32>() * total;

        for (i, &weight) in weights.iter().enumerate() {
            threshold -= weight;
            if threshold <= 0.0 && weight > 0.0 {
                return Some(i);
            }
        }

        // Floating point edge case - return last non-zero weight
        weights.iter().rposition(|&w| w > 0.0)
    }

    /// Draw `amount` distinct indices from `0..length`.
    pub fn sample_indices(&mut self, length: usize, amount: usize) -> Vec<usize> {
        rand::seq::index::sample(&mut self.inner, length, amount.min(length)).into_vec()
    }

    /// Draw from `Binomial(trials, probability)`. The probability is clamped into `[0, 1]`.
    pub fn binomial(&mut self, trials: u64, probability: f64) -> u64 {
        Binomial::new(trials, probability.clamp(0.0, 1.0))
            .map(|dist| dist.sample(&mut self.inner))
            .unwrap_or(0)
    }

    /// Draw a symmetric Dirichlet(`alpha`) vector of length `n`.
    ///
    /// Falls back to the uniform vector when `alpha` is not a valid shape.
    pub fn dirichlet(&mut self, alpha: f32, n: usize) -> Vec<f32> {
        if n == 0 {
            return Vec::new();
        }
        let uniform = vec![1.0 / n as f32; n];
        let Ok(gamma) = Gamma::new(alpha, 1.0) else {
            return uniform;
        };

        let draws: Vec<f32> = (0..n).map(|_| gamma.sample(&mut self.inner)).collect();
        let total: f32 = draws.iter().sum();
        if total <= 0.0 || !total.is_finite() {
            return uniform;
        }
        draws.into_iter().map(|d| d / total).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_determinism() {
        let mut rng1 = SeededRng::new(42);
        let mut rng2 = SeededRng::new(42);

        for _ in 0..100 {
            assert_eq!(rng1.gen_range_usize(0..1000), rng2.gen_range_usize(0..1000));
        }
    }

    #[test]
    fn test_fork_produces_different_sequence() {
        let mut rng = SeededRng::new(42);
        let mut forked = rng.fork();

        let seq1: Vec<_> = (0..10).map(|_| rng.gen_range_usize(0..1000)).collect();
        let seq2: Vec<_> = (0..10).map(|_| forked.gen_range_usize(0..1000)).collect();

        assert_ne!(seq1, seq2);
    }

    #[test]
    fn test_context_is_deterministic() {
        let mut ctx1 = SeededRng::new(7).for_context("actor-0");
        let mut ctx2 = SeededRng::new(7).for_context("actor-0");

        for _ in 0..10 {
            assert_eq!(ctx1.gen_range_usize(0..1000), ctx2.gen_range_usize(0..1000));
        }
    }

    #[test]
    fn test_choose_weighted() {
        let mut rng = SeededRng::new(42);

        let weights = vec![0.0, 100.0, 0.0];
        for _ in 0..10 {
            assert_eq!(rng.choose_weighted(&weights), Some(1));
        }

        assert_eq!(rng.choose_weighted(&[]), None);
        assert_eq!(rng.choose_weighted(&[0.0, 0.0]), None);
    }

    #[test]
    fn test_sample_indices_distinct() {
        let mut rng = SeededRng::new(3);
        let mut picked = rng.sample_indices(10, 4);
        assert_eq!(picked.len(), 4);
        picked.sort_unstable();
        picked.dedup();
        assert_eq!(picked.len(), 4);
        assert!(picked.iter().all(|&i| i < 10));

        assert_eq!(rng.sample_indices(3, 10).len(), 3);
    }

    #[test]
    fn test_binomial_bounds() {
        let mut rng = SeededRng::new(5);
        for _ in 0..50 {
            assert!(rng.binomial(8, 0.5) <= 8);
        }
        assert_eq!(rng.binomial(8, 0.0), 0);
        assert_eq!(rng.binomial(8, 1.0), 8);
    }

    #[test]
    fn test_dirichlet_sums_to_one() {
        let mut rng = SeededRng::new(11);
        let noise = rng.dirichlet(0.3, 6);
        assert_eq!(noise.len(), 6);
        assert!((noise.iter().sum::<f32>() - 1.0).abs() < 1e-4);
        assert!(noise.iter().all(|&p| p >= 0.0));
    }

    #[test]
    fn test_dirichlet_invalid_alpha_is_uniform() {
        let mut rng = SeededRng::new(11);
        assert_eq!(rng.dirichlet(-1.0, 4), vec![0.25; 4]);
        assert!(rng.dirichlet(1.0, 0).is_empty());
    }
}
