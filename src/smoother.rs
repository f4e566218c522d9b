// src/smoother.rs

use crate::types::LaneCoords;
use std::collections::VecDeque;

/// Temporal smoother for lane corner quadrilaterals using a bounded FIFO
/// history. The output is always the element-wise mean of the history,
/// truncated to integers, never the raw detection.
pub struct CoordinateSmoother {
    history: VecDeque<LaneCoords>,
    capacity: usize,
}

impl CoordinateSmoother {
    /// Create a new smoother averaging up to `capacity` recent frames.
    pub fn new(capacity: usize) -> Self {
        Self {
            history: VecDeque::with_capacity(capacity),
            capacity: capacity.max(1),
        }
    }

    /// Append the current detection, evicting the oldest entry when the
    /// history would exceed capacity, and return the running average.
    pub fn smooth(&mut self, coords: LaneCoords) -> LaneCoords {
        self.history.push_back(coords);
        if self.history.len() > self.capacity {
            self.history.pop_front();
        }

        let n = self.history.len() as f64;
        let mut averaged = [0i32; 8];
        for (k, slot) in averaged.iter_mut().enumerate() {
            let sum: i64 = self.history.iter().map(|c| c[k] as i64).sum();
            *slot = (sum as f64 / n) as i32;
        }
        averaged
    }

    /// Drop all history (e.g. when a stream restarts).
    pub fn reset(&mut self) {
        self.history.clear();
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}
