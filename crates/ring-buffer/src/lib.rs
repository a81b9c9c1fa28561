//! Bounded Ring Buffer
//!
//! Fixed-capacity FIFO storage for per-frame samples, plus a plain rolling
//! mean built on top of it for jitter suppression.

mod buffer;
mod mean;

pub use buffer::RingBuffer;
pub use mean::RollingMean;

/// Default smoothing window (5 frames, ~160 ms at 30 fps)
pub const DEFAULT_WINDOW: usize = 5;
