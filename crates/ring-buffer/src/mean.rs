//! Rolling arithmetic mean over the last N samples

use crate::RingBuffer;

/// Plain rolling average (no decay weighting)
#[derive(Debug, Clone)]
pub struct RollingMean {
    window: RingBuffer<f64>,
}

impl RollingMean {
    pub fn new(capacity: usize) -> Self {
        Self {
            window: RingBuffer::new(capacity),
        }
    }

    /// Add a sample and return the updated mean
    pub fn push(&mut self, value: f64) -> f64 {
        self.window.push(value);
        self.mean()
    }

    /// Arithmetic mean of the current window, 0.0 when empty
    pub fn mean(&self) -> f64 {
        if self.window.is_empty() {
            return 0.0;
        }
        self.window.iter().sum::<f64>() / self.window.len() as f64
    }

    pub fn len(&self) -> usize {
        self.window.len()
    }

    pub fn is_empty(&self) -> bool {
        self.window.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.window.capacity()
    }

    pub fn clear(&mut self) {
        self.window.clear();
    }
}
