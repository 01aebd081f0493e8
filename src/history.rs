//! Caller-owned segment history
//!
//! The prediction and bottleneck stages read a bounded, ordered sequence of
//! past analyses for a segment. That history belongs to the caller — it is
//! never a module-level cache — so every evaluation stays a pure function of
//! its inputs and segments can be evaluated concurrently.
//!
//! `SegmentHistory` is the reference ring-buffer implementation a host can
//! use; any `&[TrafficAnalysis]` in chronological order works equally well.

use crate::congestion::TrafficAnalysis;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Default retained analyses per segment (one hour at a 1-minute tick).
pub const DEFAULT_CAPACITY: usize = 60;

/// Bounded chronological ring buffer of per-segment analyses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SegmentHistory {
    capacity: usize,
    entries: VecDeque<TrafficAnalysis>,
}

impl Default for SegmentHistory {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl SegmentHistory {
    /// Create a history bounded to `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Append the newest analysis, evicting the oldest when full.
    pub fn push(&mut self, analysis: TrafficAnalysis) {
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(analysis);
    }

    /// All retained analyses, oldest first.
    pub fn as_slice(&self) -> Vec<TrafficAnalysis> {
        self.entries.iter().cloned().collect()
    }

    /// The most recent analysis, if any.
    pub fn latest(&self) -> Option<&TrafficAnalysis> {
        self.entries.back()
    }

    /// The analysis preceding the most recent one, if any.
    ///
    /// This is the "previous" input the bottleneck detector compares against.
    pub fn previous(&self) -> Option<&TrafficAnalysis> {
        let len = self.entries.len();
        if len >= 2 {
            self.entries.get(len - 2)
        } else {
            None
        }
    }

    /// Mean congestion index over the retained window, if non-empty.
    pub fn mean_congestion_index(&self) -> Option<f64> {
        if self.entries.is_empty() {
            return None;
        }
        let sum: f64 = self.entries.iter().map(|a| a.congestion_index).sum();
        Some(sum / self.entries.len() as f64)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
