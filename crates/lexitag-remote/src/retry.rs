//! Retry policy and executor
//!
//! Each attempt races the operation against the policy timeout. A timeout,
//! an error, or a rejected result all count as a failed attempt and are
//! followed by an exponential backoff wait before the next one.

use std::future::Future;
use std::time::Duration;

use lexitag_core::{LexitagError, Result};

/// Attempts per call
pub const MAX_ATTEMPTS: u32 = 3;

/// Wait after the first failure is `2 * BASE_DELAY`
pub const BASE_DELAY: Duration = Duration::from_secs(3);

/// Per-attempt timeout
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// How often, how long, and how patiently to call a remote operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            base_delay: BASE_DELAY,
            timeout: REQUEST_TIMEOUT,
        }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, timeout: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            timeout,
        }
    }

    /// Wait after failed attempt number `attempt` (1-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt))
    }

    /// Run `op` until it succeeds or the attempts are used up.
    ///
    /// `op` receives the 1-based attempt number. The error of the last
    /// attempt is returned when every attempt fails.
    pub async fn execute<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            let outcome = match tokio::time::timeout(self.timeout, op(attempt)).await {
                Ok(result) => result,
                Err(_) => Err(LexitagError::Timeout(self.timeout)),
            };

            let err = match outcome {
                Ok(value) => return Ok(value),
                Err(err) => err,
            };

            tracing::warn!(
                label,
                attempt,
                max_attempts = self.max_attempts,
                error = %err,
                "attempt failed"
            );

            if attempt >= self.max_attempts {
                return Err(err);
            }

            let wait = self.backoff(attempt);
            tracing::debug!(label, wait_secs = wait.as_secs_f64(), "backing off");
            tokio::time::sleep(wait).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(3, Duration::from_millis(1), Duration::from_millis(50))
    }

    #[test]
    fn test_default_constants() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts, 3);
        assert_eq!(policy.timeout, Duration::from_secs(60));
        assert_eq!(policy.backoff(1), Duration::from_secs(6));
        assert_eq!(policy.backoff(2), Duration::from_secs(12));
    }

    #[test]
    fn test_zero_attempts_clamped() {
        let policy = RetryPolicy::new(0, Duration::ZERO, Duration::from_secs(1));
        assert_eq!(policy.max_attempts, 1);
    }

    #[tokio::test]
    async fn test_always_failing_tries_max_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast_policy()
            .execute("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(LexitagError::Completion("down".to_string())) }
            })
            .await;

        assert!(matches!(result, Err(LexitagError::Completion(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_success_after_failure() {
        let result = fast_policy()
            .execute("test", |attempt| async move {
                if attempt < 2 {
                    Err(LexitagError::Completion("flaky".to_string()))
                } else {
                    Ok(attempt)
                }
            })
            .await;

        assert_eq!(result.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_timeout_counts_as_failure() {
        let calls = AtomicU32::new(0);
        let result: Result<()> = fast_policy()
            .execute("test", |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                async {
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    Ok(())
                }
            })
            .await;

        assert!(matches!(result, Err(LexitagError::Timeout(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
