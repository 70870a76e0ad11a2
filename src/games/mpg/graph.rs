//! Random weighted digraphs for the mean-payoff game.

use serde::{Deserialize, Serialize};

use crate::core::SeededRng;

/// Weighted directed graph stored as sorted successor lists.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeightedGraph {
    successors: Vec<Vec<(usize, i32)>>,
}

impl WeightedGraph {
    /// Build a graph from explicit successor lists.
    ///
    /// Lists are sorted by target so action order is stable.
    pub fn from_successors(mut successors: Vec<Vec<(usize, i32)>>) -> Self {
        for list in &mut successors {
            list.sort_unstable_by_key(|&(v, _)| v);
        }
        Self { successors }
    }

    /// Sinkless G(n, p): every vertex draws its out-degree from
    /// `Binomial(n, p)`, redrawing zeros, then picks that many distinct
    /// targets uniformly. Weights are uniform in `[-max_weight, max_weight]`.
    pub fn sinkless_gnp(n: usize, p: f64, max_weight: i32, rng: &mut SeededRng) -> Self {
        let max_weight = max_weight.abs();
        let successors = (0..n)
            .map(|_| {
                let degree = loop {
                    let d = rng.binomial(n as u64, p) as usize;
                    if d > 0 || p <= 0.0 {
                        break d.max(1);
                    }
                };
                rng.sample_indices(n, degree)
                    .into_iter()
                    .map(|v| (v, rng.gen_range_i32(-max_weight..=max_weight)))
                    .collect()
            })
            .collect();
        Self::from_successors(successors)
    }

    /// Number of vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.successors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.successors.is_empty()
    }

    /// Outgoing `(target, weight)` pairs of `u`, sorted by target.
    #[must_use]
    pub fn successors(&self, u: usize) -> &[(usize, i32)] {
        &self.successors[u]
    }

    /// Weight of edge `u -> v`, if present.
    #[must_use]
    pub fn weight(&self, u: usize, v: usize) -> Option<i32> {
        self.successors[u]
            .binary_search_by_key(&v, |&(target, _)| target)
            .ok()
            .map(|i| self.successors[u][i].1)
    }
}
