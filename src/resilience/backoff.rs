//! Linear reconnect backoff.

use std::time::Duration;

use crate::config::RetryConfig;

/// Reconnect budget and wait schedule for one backend.
///
/// Attempt `n` (0-indexed) waits `n * unit_wait`, so a full cycle of
/// `max_retries` attempts sleeps at most `unit_wait * n(n+1)/2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    max_retries: u32,
    unit_wait: Duration,
}

impl BackoffPolicy {
    pub fn new(max_retries: u32, unit_wait: Duration) -> Self {
        Self {
            max_retries,
            unit_wait,
        }
    }

    /// Wait before the given retry attempt.
    pub fn wait(&self, attempt: u32) -> Duration {
        self.unit_wait.saturating_mul(attempt)
    }

    /// Connect attempts per cycle. A zero budget still makes one attempt.
    pub fn max_attempts(&self) -> u32 {
        self.max_retries.max(1)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn unit_wait(&self) -> Duration {
        self.unit_wait
    }
}

impl From<&RetryConfig> for BackoffPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self::new(config.max_retry, config.unit_wait())
    }
}
