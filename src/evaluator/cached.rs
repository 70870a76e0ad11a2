//! Model-backed evaluator with a per-worker inference cache.

use std::num::NonZeroUsize;
use std::path::Path;

use lru::LruCache;
use serde::{Deserialize, Serialize};

use crate::error::{EvalError, ModelError};
use crate::evaluator::Evaluator;
use crate::nn::{load_weights_from, Inference, Model, StateKey};
use crate::rules::{Action, GameState};

/// Cache counters reported by `CachedEvaluator::cache_info`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheInfo {
    pub size: usize,
    pub max_size: usize,
    pub hits: u64,
    pub misses: u64,
    /// `size / max_size`.
    pub usage: f64,
    /// `hits / (hits + misses)`, 0 before any lookup.
    pub hit_rate: f64,
}

/// Evaluator that runs the model at most once per distinct input until
/// the cache is cleared.
///
/// Any change of weights must go through `load_checkpoint` (or be followed
/// by `clear_cache`), otherwise stale results from the old weights would
/// keep being served.
pub struct CachedEvaluator<M: Model> {
    model: M,
    cache: LruCache<StateKey, Inference>,
    hits: u64,
    misses: u64,
}

impl<M: Model> CachedEvaluator<M> {
    /// A `cache_size` of zero is treated as one.
    pub fn new(model: M, cache_size: usize) -> Self {
        let capacity = NonZeroUsize::new(cache_size).unwrap_or(NonZeroUsize::MIN);
        Self {
            model,
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Drop every cached inference. Hit and miss counters are kept.
    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_info(&self) -> CacheInfo {
        let size = self.cache.len();
        let max_size = self.cache.cap().get();
        let lookups = self.hits + self.misses;
        CacheInfo {
            size,
            max_size,
            hits: self.hits,
            misses: self.misses,
            usage: size as f64 / max_size as f64,
            hit_rate: if lookups == 0 {
                0.0
            } else {
                self.hits as f64 / lookups as f64
            },
        }
    }

    /// Load new weights and invalidate the cache in one step.
    pub fn load_checkpoint(&mut self, path: &Path) -> Result<(), ModelError> {
        load_weights_from(&mut self.model, path)?;
        self.clear_cache();
        log::debug!("Loaded {:?}, cache cleared", path);
        Ok(())
    }

    /// Cached forward pass. A failed model call leaves the cache untouched.
    fn inference<S: GameState>(&mut self, state: &S) -> Result<Inference, EvalError> {
        let observation = state.observation();
        let key = StateKey::new(state.current_player(), &observation);

        if let Some(inference) = self.cache.get(&key) {
            self.hits += 1;
            return Ok(inference.clone());
        }

        self.misses += 1;
        let inference = self
            .model
            .inference(&observation.environment, &observation.state)?;
        self.cache.put(key, inference.clone());
        Ok(inference)
    }
}

impl<M: Model, S: GameState> Evaluator<S> for CachedEvaluator<M> {
    fn evaluate(&mut self, state: &S) -> Result<[f32; 2], EvalError> {
        let value = self.inference(state)?.value;
        Ok([value, -value])
    }

    fn prior(&mut self, state: &S) -> Result<Vec<(Action, f32)>, EvalError> {
        if state.is_chance_node() {
            return Ok(state.chance_outcomes());
        }
        let legal = state.legal_actions();
        if legal.is_empty() {
            return Err(EvalError::NoLegalActions);
        }
        let policy = self.inference(state)?.policy;
        Ok(legal
            .into_iter()
            .map(|a| (a, policy.get(a.index()).copied().unwrap_or(0.0)))
            .collect())
    }
}
