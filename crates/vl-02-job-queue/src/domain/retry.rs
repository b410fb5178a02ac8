//! Bounded retry policy for job execution.

use std::time::Duration;

use shared_types::RegistryError;

/// Retry parameters applied uniformly across the three queues.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Total executions allowed per job, first attempt included.
    pub max_attempts: u32,
    /// Fixed delay before a requeued job becomes eligible again.
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    /// Returns true if a job that just failed with `error` on execution
    /// number `attempts_made` should be requeued.
    ///
    /// Permanent errors (reverted transactions, precondition failures) are
    /// never retried: resubmitting identical parameters cannot change the
    /// outcome.
    #[must_use]
    pub fn should_retry(&self, error: &RegistryError, attempts_made: u32) -> bool {
        error.is_transient() && attempts_made < self.max_attempts
    }
}
