//! Bounded replay buffer.
//!
//! A ring buffer: once full, each new item overwrites the oldest one.
//! `total_seen` counts every item ever added, so `len() == min(total_seen, capacity)`
//! until `clear` is called.

use serde::{Deserialize, Serialize};

use crate::core::SeededRng;
use crate::error::BufferError;

/// Buffer state merged into each learner log record.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BufferAnalysis {
    pub buffer_size: usize,
    pub buffer_capacity: usize,
    pub total_states: u64,
    pub reuse: usize,
}

/// Ring buffer of training samples.
#[derive(Clone, Debug)]
pub struct ReplayBuffer<T> {
    capacity: usize,
    data: Vec<T>,
    /// Slot the next item overwrites once full; also the oldest item.
    write_index: usize,
    total_seen: u64,
    reuse: usize,
}

impl<T> ReplayBuffer<T> {
    /// Create a buffer holding at most `capacity` items (at least one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            data: Vec::with_capacity(capacity),
            write_index: 0,
            total_seen: 0,
            reuse: 1,
        }
    }

    /// Record the reuse factor reported by `analysis_data`.
    pub fn with_reuse(mut self, reuse: usize) -> Self {
        self.reuse = reuse;
        self
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
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Items ever added, including overwritten ones.
    #[must_use]
    pub fn total_seen(&self) -> u64 {
        self.total_seen
    }

    pub fn push(&mut self, item: T) {
        if self.data.len() < self.capacity {
            self.data.push(item);
        } else {
            self.data[self.write_index] = item;
            self.write_index = (self.write_index + 1) % self.capacity;
        }
        self.total_seen += 1;
    }

    pub fn extend<I: IntoIterator<Item = T>>(&mut self, items: I) {
        for item in items {
            self.push(item);
        }
    }

    /// Lazy pass over every held item, oldest first.
    pub fn dataset(&self) -> impl Iterator<Item = &T> + '_ {
        let (newer, older) = self.data.split_at(self.write_index);
        older.iter().chain(newer.iter())
    }

    /// Drop held items. `total_seen` is kept.
    pub fn clear(&mut self) {
        self.data.clear();
        self.write_index = 0;
    }

    #[must_use]
    pub fn analysis_data(&self) -> BufferAnalysis {
        BufferAnalysis {
            buffer_size: self.len(),
            buffer_capacity: self.capacity,
            total_states: self.total_seen,
            reuse: self.reuse,
        }
    }
}

impl<T: Clone> ReplayBuffer<T> {
    /// Draw `n` items uniformly with replacement.
    pub fn sample(&self, n: usize, rng: &mut SeededRng) -> Result<Vec<T>, BufferError> {
        if self.data.is_empty() {
            return Err(BufferError::Empty);
        }
        Ok((0..n)
            .map(|_| self.data[rng.gen_range_usize(0..self.data.len())].clone())
            .collect())
    }
}
