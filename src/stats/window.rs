//! Fixed-size window over the most recent values.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

/// Keeps the last `size` values; older values are evicted first.
#[derive(Clone, Debug)]
pub struct SlidingWindow<T> {
    data: VecDeque<T>,
    size: usize,
    total_seen: u64,
}

/// Serializable view of a window of numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowSnapshot {
    pub len: usize,
    pub total_seen: u64,
    pub mean: f64,
}

impl<T> SlidingWindow<T> {
    /// Create a window holding at most `size` values (at least one).
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        Self {
            data: VecDeque::with_capacity(size),
            size,
            total_seen: 0,
        }
    }

    pub fn add(&mut self, value: T) {
        if self.data.len() == self.size {
            self.data.pop_front();
        }
        self.data.push_back(value);
        self.total_seen += 1;
    }

    /// Forget the held values. The lifetime count is kept.
    pub fn reset(&mut self) {
        self.data.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Values ever added.
    #[must_use]
    pub fn total_seen(&self) -> u64 {
        self.total_seen
    }

    /// Oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.data.iter()
    }
}

impl<T: Copy + Into<f64>> SlidingWindow<T> {
    /// Mean of the held values, 0 when empty.
    #[must_use]
    pub fn mean(&self) -> f64 {
        if self.data.is_empty() {
            return 0.0;
        }
        self.data.iter().map(|&v| v.into()).sum::<f64>() / self.data.len() as f64
    }

    #[must_use]
    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            len: self.len(),
            total_seen: self.total_seen,
            mean: self.mean(),
        }
    }
}
