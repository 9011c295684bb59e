//! Retry budget and backoff for the request client.

use std::time::Duration;

/// Retries granted to every call unless overridden.
pub const DEFAULT_RETRIES: u32 = 3;

/// Delay before the first retry.
pub const DEFAULT_BACKOFF_BASE: Duration = Duration::from_millis(100);

/// Upper bound for any single backoff delay.
pub const DEFAULT_BACKOFF_MAX: Duration = Duration::from_secs(2);

/// Exponential backoff policy.
///
/// A call makes at most `retries + 1` attempts. The delay before retry
/// `n` (zero-based) is `base * 2^n`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    /// Delay before the first retry.
    pub base_delay: Duration,
    /// Cap for every delay.
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// Creates the default policy.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            retries: DEFAULT_RETRIES,
            base_delay: DEFAULT_BACKOFF_BASE,
            max_delay: DEFAULT_BACKOFF_MAX,
        }
    }

    /// Sets the retry budget.
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    /// Sets the backoff bounds.
    #[must_use]
    pub const fn with_backoff(mut self, base_delay: Duration, max_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self.max_delay = max_delay;
        self
    }

    /// Returns the delay before retry `retry` (zero-based).
    #[must_use]
    pub fn delay_for(&self, retry: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(retry))
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.retries, 3);
        assert_eq!(policy.base_delay, Duration::from_millis(100));
        assert_eq!(policy.max_delay, Duration::from_secs(2));
    }

    #[test]
    fn test_delay_doubles_until_cap() {
        let policy = RetryPolicy::new();
        let delays: Vec<_> = (0..7).map(|n| policy.delay_for(n).as_millis()).collect();
        assert_eq!(delays, vec![100, 200, 400, 800, 1600, 2000, 2000]);
    }

    #[test]
    fn test_delay_does_not_overflow() {
        let policy = RetryPolicy::new().with_backoff(Duration::MAX, Duration::MAX);
        assert_eq!(policy.delay_for(40), Duration::MAX);
    }
}
