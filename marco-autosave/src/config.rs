//! Write queue timing.

use std::time::Duration;

/// Timing parameters of an [`AutoSaver`](crate::AutoSaver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoSaveConfig {
    /// Quiet period after the last `queue` call before a flush.
    pub debounce: Duration,
    /// Delay before the first retry; doubles with each further failure.
    pub base_retry_delay: Duration,
    /// Consecutive failures after which pending operations are dropped.
    pub max_retries: u32,
    /// Upper bound (exclusive) of the random delay added to each retry.
    pub max_jitter: Duration,
}

impl Default for AutoSaveConfig {
    fn default() -> Self {
        Self {
            debounce: Duration::from_millis(400),
            base_retry_delay: Duration::from_millis(500),
            max_retries: 5,
            max_jitter: Duration::from_millis(150),
        }
    }
}

impl AutoSaveConfig {
    /// Backoff before retry number `attempt` (1-based), without jitter.
    pub fn retry_delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_retry_delay.saturating_mul(1 << exponent)
    }
}
