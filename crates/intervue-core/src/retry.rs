//! Retry policy for read operations.
//!
//! Mutations are never retried. Reads are retried with exponential backoff
//! until the attempt budget is spent, except when retrying cannot help.

use std::time::Duration;

use crate::api::ApiError;

/// Total attempts (first try included) for a read operation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Initial backoff delay in milliseconds.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Upper bound on a single backoff delay in milliseconds.
const MAX_BACKOFF_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS)
    }
}

impl RetryPolicy {
    /// `max_attempts` below 1 is treated as 1.
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay: Duration::from_millis(INITIAL_BACKOFF_MS),
        }
    }

    /// A policy that tries once.
    pub fn never() -> Self {
        Self::new(1)
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Whether to issue another attempt after `attempts_made` attempts, the
    /// last of which failed with `error`.
    pub fn should_retry(&self, attempts_made: u32, error: &ApiError) -> bool {
        if attempts_made >= self.max_attempts {
            return false;
        }
        // A rejected credential stays rejected; a malformed request stays malformed.
        !(error.is_unauthorized()
            || matches!(error, ApiError::InvalidRequest(_) | ApiError::Session(_)))
    }

    /// Delay before the attempt following `attempts_made`: base, 2x, 4x ...
    /// capped at 30 seconds.
    pub fn delay(&self, attempts_made: u32) -> Duration {
        let exponent = attempts_made.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        delay.min(Duration::from_millis(MAX_BACKOFF_MS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn server_error() -> ApiError {
        ApiError::ServerError {
            status: 500,
            body: String::new(),
        }
    }

    #[test]
    fn test_never_retries_unauthorized() {
        let policy = RetryPolicy::new(10);
        for attempt in 0..20 {
            assert!(!policy.should_retry(attempt, &ApiError::Unauthorized));
        }
    }

    #[test]
    fn test_never_retries_past_max_attempts() {
        let policy = RetryPolicy::default();
        assert!(policy.should_retry(1, &server_error()));
        assert!(policy.should_retry(2, &server_error()));
        for attempt in 3..10 {
            assert!(!policy.should_retry(attempt, &server_error()));
            assert!(!policy.should_retry(attempt, &ApiError::RateLimited));
            assert!(!policy.should_retry(attempt, &ApiError::NotFound(String::new())));
        }
    }

    #[test]
    fn test_invalid_request_not_retried() {
        let policy = RetryPolicy::default();
        assert!(!policy.should_retry(1, &ApiError::InvalidRequest("bad id".to_string())));
    }

    #[test]
    fn test_single_attempt_policy() {
        assert_eq!(RetryPolicy::new(0).max_attempts(), 1);
        assert!(!RetryPolicy::never().should_retry(1, &server_error()));
    }

    #[test]
    fn test_backoff_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(1), Duration::from_secs(1));
        assert_eq!(policy.delay(2), Duration::from_secs(2));
        assert_eq!(policy.delay(3), Duration::from_secs(4));
        assert_eq!(policy.delay(10), Duration::from_secs(30));
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_base_delay() {
        let policy = RetryPolicy::default().with_base_delay(Duration::ZERO);
        assert_eq!(policy.delay(3), Duration::ZERO);
    }
}
