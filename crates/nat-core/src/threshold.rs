//! Live-adjustable idle threshold shared between settings and the scheduler.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lowest accepted idle threshold in seconds.
pub const MIN_IDLE_THRESHOLD_SECS: f64 = 0.5;

/// Idle threshold used when nothing is configured.
pub const DEFAULT_IDLE_THRESHOLD_SECS: f64 = 3.0;

/// Cloneable handle to the current idle threshold.
///
/// Every clone observes writes made through any other clone.
#[derive(Debug, Clone)]
pub struct IdleThreshold {
    bits: Arc<AtomicU64>,
}

impl IdleThreshold {
    pub fn new(secs: f64) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(clamp(secs).to_bits())),
        }
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Acquire))
    }

    /// Stores a new threshold and returns the value actually applied.
    pub fn set(&self, secs: f64) -> f64 {
        let applied = clamp(secs);
        self.bits.store(applied.to_bits(), Ordering::Release);
        applied
    }
}

impl Default for IdleThreshold {
    fn default() -> Self {
        Self::new(DEFAULT_IDLE_THRESHOLD_SECS)
    }
}

fn clamp(secs: f64) -> f64 {
    if secs.is_nan() {
        DEFAULT_IDLE_THRESHOLD_SECS
    } else {
        secs.max(MIN_IDLE_THRESHOLD_SECS)
    }
}
