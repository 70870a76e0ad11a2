//! Fixed-bucket histograms.

use serde::{Deserialize, Serialize};

/// Histogram over `0..buckets`. Values past the end land in the last bucket.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistogramNumbered {
    counts: Vec<u64>,
}

impl HistogramNumbered {
    /// Create a histogram with `buckets` buckets (at least one).
    pub fn new(buckets: usize) -> Self {
        Self {
            counts: vec![0; buckets.max(1)],
        }
    }

    pub fn add(&mut self, value: usize) {
        let last = self.counts.len() - 1;
        self.counts[value.min(last)] += 1;
    }

    pub fn reset(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
    }

    /// Bucket counts.
    #[must_use]
    pub fn data(&self) -> &[u64] {
        &self.counts
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<u64> {
        self.counts.clone()
    }
}

/// Histogram over a fixed set of named categories.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistogramNamed {
    names: Vec<String>,
    counts: Vec<u64>,
}

/// Serializable view of a `HistogramNamed`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedSnapshot {
    pub names: Vec<String>,
    pub data: Vec<u64>,
}

impl HistogramNamed {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let counts = vec![0; names.len()];
        Self { names, counts }
    }

    /// Count one occurrence of category `index`. Unknown indices are ignored.
    pub fn add(&mut self, index: usize) {
        if let Some(count) = self.counts.get_mut(index) {
            *count += 1;
        }
    }

    pub fn reset(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0);
    }

    #[must_use]
    pub fn data(&self) -> &[u64] {
        &self.counts
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn snapshot(&self) -> NamedSnapshot {
        NamedSnapshot {
            names: self.names.clone(),
            data: self.counts.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbered_clamps_to_last_bucket() {
        let mut hist = HistogramNumbered::new(4);
        hist.add(0);
        hist.add(3);
        hist.add(17);
        assert_eq!(hist.data(), &[1, 0, 0, 2]);

        hist.reset();
        assert_eq!(hist.snapshot(), vec![0; 4]);
    }

    #[test]
    fn test_numbered_min_one_bucket() {
        let mut hist = HistogramNumbered::new(0);
        hist.add(5);
        assert_eq!(hist.data(), &[1]);
    }

    #[test]
    fn test_named() {
        let mut hist = HistogramNamed::new(["Player1", "Player2", "Draw"]);
        hist.add(0);
        hist.add(2);
        hist.add(2);
        hist.add(9);

        let snap = hist.snapshot();
        assert_eq!(snap.names, vec!["Player1", "Player2", "Draw"]);
        assert_eq!(snap.data, vec![1, 0, 2]);

        hist.reset();
        assert_eq!(hist.data(), &[0, 0, 0]);
        assert_eq!(hist.names().len(), 3);
    }
}
