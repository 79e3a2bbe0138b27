//! Retry policy for calls to external services

use std::time::Duration;

/// Longest server-requested wait that is honored
pub const MAX_RETRY_AFTER: Duration = Duration::from_secs(120);

/// Exponential backoff policy shared by the AI and GitHub clients
///
/// Attempt `n` (1-based) that fails waits `initial_delay * multiplier^(n-1)`,
/// capped at `max_delay`, before attempt `n + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,

    /// Delay after the first failure
    pub initial_delay: Duration,

    /// Growth factor between consecutive delays
    pub multiplier: u32,

    /// Upper bound on a single delay
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Single attempt, never retries
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            ..Self::default()
        }
    }

    /// Retries without sleeping (tests)
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_delay: Duration::ZERO,
            multiplier: 1,
            max_delay: Duration::ZERO,
        }
    }

    /// Set the number of attempts
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Delay to wait after failed attempt `attempt` (1-based)
    ///
    /// # Examples
    ///
    /// ```
    /// use refresher_domain::RetryPolicy;
    /// use std::time::Duration;
    ///
    /// let policy = RetryPolicy::default();
    /// assert_eq!(policy.delay_after(1), Duration::from_secs(1));
    /// assert_eq!(policy.delay_after(3), Duration::from_secs(4));
    /// ```
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        let factor = self.multiplier.saturating_pow(exponent);
        self.initial_delay
            .saturating_mul(factor)
            .min(self.max_delay)
    }

    /// Delay after failed attempt `attempt` when the server asked to wait
    /// `retry_after`; the longer of the two, the hint capped at
    /// [`MAX_RETRY_AFTER`]
    pub fn delay_with_hint(&self, attempt: u32, retry_after: Option<Duration>) -> Duration {
        let backoff = self.delay_after(attempt);
        match retry_after {
            Some(hint) => backoff.max(hint.min(MAX_RETRY_AFTER)),
            None => backoff,
        }
    }

    /// Whether another attempt is allowed after `attempt` failed
    pub fn should_retry(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

impl Default for RetryPolicy {
    /// Five attempts: waits of 1s, 2s, 4s, 8s between them
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(1),
            multiplier: 2,
            max_delay: Duration::from_secs(30),
        }
    }
}

/// Parse a `Retry-After` header value given in seconds
///
/// HTTP-date values are not used by the APIs called here and yield `None`.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}
