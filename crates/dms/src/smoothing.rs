//! Temporal smoothing of per-frame EAR/MAR

use ring_buffer::RollingMean;
use serde::{Deserialize, Serialize};

use crate::geometry::MetricSample;

/// Rolling-average metrics fed to the state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SmoothedMetrics {
    pub ear: f64,
    pub mar: f64,
}

/// Two independent rolling windows, one per metric
#[derive(Debug, Clone)]
pub struct MetricSmoother {
    ear: RollingMean,
    mar: RollingMean,
}

impl MetricSmoother {
    pub fn new(window_size: usize) -> Self {
        Self {
            ear: RollingMean::new(window_size),
            mar: RollingMean::new(window_size),
        }
    }

    pub fn push(&mut self, sample: &MetricSample) -> SmoothedMetrics {
        SmoothedMetrics {
            ear: self.ear.push(sample.ear),
            mar: self.mar.push(sample.mar),
        }
    }

    pub fn current(&self) -> SmoothedMetrics {
        SmoothedMetrics {
            ear: self.ear.mean(),
            mar: self.mar.mean(),
        }
    }

    /// Samples currently held (same for both windows)
    pub fn len(&self) -> usize {
        self.ear.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ear.is_empty()
    }

    pub fn clear(&mut self) {
        self.ear.clear();
        self.mar.clear();
    }
}
