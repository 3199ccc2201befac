//! Progress throttling.
//!
//! Rate-limits per-transfer progress so a fast stream does not flood the
//! coordinator's channel. The final update of a transfer bypasses the limit.

use std::time::{Duration, Instant};

/// Rate-limiter for one transfer's progress updates.
#[derive(Debug)]
pub struct ProgressThrottle {
    last_emit: Option<Instant>,
    min_interval: Duration,
    last_bytes: Option<u64>,
}

impl ProgressThrottle {
    /// Create a new throttle with the specified minimum interval.
    pub const fn new(min_interval: Duration) -> Self {
        Self {
            last_emit: None,
            min_interval,
            last_bytes: None,
        }
    }

    /// Whether `bytes` should be reported now.
    ///
    /// Never reports the same count twice in a row.
    pub fn should_emit(&mut self, bytes: u64) -> bool {
        if self.last_bytes == Some(bytes) {
            return false;
        }
        let now = Instant::now();
        match self.last_emit {
            Some(last) if now.duration_since(last) < self.min_interval => false,
            _ => {
                self.last_emit = Some(now);
                self.last_bytes = Some(bytes);
                true
            }
        }
    }

    /// Record the final update, which is always reported.
    pub fn finish(&mut self, bytes: u64) {
        self.last_emit = Some(Instant::now());
        self.last_bytes = Some(bytes);
    }
}

impl Default for ProgressThrottle {
    fn default() -> Self {
        Self::new(Duration::from_millis(100))
    }
}
