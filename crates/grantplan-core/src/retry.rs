//! Fixed-interval retry policy for binding creation.
//!
//! The authorization backend is eventually consistent: a principal created
//! moments ago may not yet be visible to the create call. The policy here is
//! deliberately simple — a fixed attempt budget with a fixed inter-attempt
//! delay, no backoff and no jitter — because every creation failure is
//! treated as the same transient condition.

use std::time::Duration;

/// Default total attempt budget (first attempt plus retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;

/// Default delay between failed attempts.
pub const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_secs(10);

/// Configuration for the creation retry loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryConfig {
    /// Total attempts allowed, including the first (1-indexed).
    pub max_attempts: u32,
    /// Fixed delay between failed attempts.
    pub interval: Duration,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            interval: DEFAULT_RETRY_INTERVAL,
        }
    }
}

impl RetryConfig {
    /// Create a config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: set the total attempt budget.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Builder: set the inter-attempt interval.
    #[must_use]
    pub const fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Delay to wait before the given attempt (1-indexed).
    ///
    /// Returns `None` when the budget is exhausted: attempt 1 runs
    /// immediately, attempts 2..=`max_attempts` each wait one interval, and
    /// anything beyond the budget is not permitted.
    #[must_use]
    pub const fn delay_before(&self, attempt: u32) -> Option<Duration> {
        if attempt == 0 || attempt > self.max_attempts {
            None
        } else if attempt == 1 {
            Some(Duration::ZERO)
        } else {
            Some(self.interval)
        }
    }
}
