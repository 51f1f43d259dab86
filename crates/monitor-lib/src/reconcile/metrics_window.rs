//! Bounded rolling window of stat samples for charting

use crate::models::StatSample;
use chrono::{DateTime, Local, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// Maximum samples kept per subject
pub const MAX_POINTS: usize = 10;

/// A sample with its precomputed chart label
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    #[serde(flatten)]
    pub sample: StatSample,
}

impl ChartPoint {
    pub fn new(sample: StatSample) -> Self {
        Self {
            label: time_label(sample.timestamp),
            sample,
        }
    }
}

/// Chart label for a sample time (local wall clock, `HH:MM:SS`)
pub fn time_label(timestamp: DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%H:%M:%S")
        .to_string()
}

/// Most recent samples in arrival order, oldest evicted first
#[derive(Debug, Clone)]
pub struct MetricsWindow {
    points: VecDeque<ChartPoint>,
    capacity: usize,
}

impl Default for MetricsWindow {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsWindow {
    pub fn new() -> Self {
        Self::with_capacity(MAX_POINTS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a sample and evict from the front; returns how many were evicted
    ///
    /// Identical consecutive samples are kept: every poll tick is one point.
    pub fn push(&mut self, sample: StatSample) -> usize {
        self.points.push_back(ChartPoint::new(sample));

        let mut evicted = 0;
        while self.points.len() > self.capacity {
            self.points.pop_front();
            evicted += 1;
        }
        evicted
    }

    pub fn clear(&mut self) {
        self.points.clear();
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn latest(&self) -> Option<&ChartPoint> {
        self.points.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter()
    }

    /// Owned copy of the window, oldest first
    pub fn points(&self) -> Vec<ChartPoint> {
        self.points.iter().cloned().collect()
    }

    pub fn labels(&self) -> Vec<String> {
        self.points.iter().map(|p| p.label.clone()).collect()
    }

    pub fn cpu_series(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.sample.cpu_percent).collect()
    }

    pub fn memory_series(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.sample.memory_percent).collect()
    }
}
