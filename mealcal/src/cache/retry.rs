use std::future::Future;
use std::time::Duration;

use backoff::backoff::Backoff;
use backoff::{ExponentialBackoff, ExponentialBackoffBuilder};

use crate::error::MealError;

const MAX_RETRY_DELAY: Duration = Duration::from_secs(30);

/// Bounded retry budget for store requests.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Extra attempts after the first one.
    pub retries: u32,
    /// Delay before the first retry. Doubles per retry, capped at 30 seconds.
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, base_delay: Duration) -> Self {
        Self {
            retries,
            base_delay,
        }
    }

    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.retries + 1
    }

    fn delays(&self) -> ExponentialBackoff {
        ExponentialBackoffBuilder::new()
            .with_initial_interval(self.base_delay)
            .with_randomization_factor(0.0)
            .with_multiplier(2.0)
            .with_max_interval(MAX_RETRY_DELAY)
            .with_max_elapsed_time(None)
            .build()
    }
}

/// The last error of a request that ran out of attempts (or could not be
/// retried at all).
#[derive(Debug)]
pub struct RetryFailure {
    pub attempts: u32,
    pub error: MealError,
}

/// Run `request` until it succeeds, fails with a non-retryable error, or
/// the policy's budget is spent.
pub async fn with_retries<T, F, Fut>(
    policy: &RetryPolicy,
    op: &str,
    mut request: F,
) -> std::result::Result<T, RetryFailure>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = crate::error::Result<T>>,
{
    let mut delays = policy.delays();
    let mut attempt = 0u32;

    loop {
        attempt += 1;
        match request().await {
            Ok(value) => return Ok(value),
            Err(error) if error.is_retryable() && attempt <= policy.retries => {
                let delay = delays.next_backoff().unwrap_or(MAX_RETRY_DELAY);
                tracing::warn!(
                    op,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    error = %error,
                    "store request failed, retrying"
                );
                tokio::time::sleep(delay).await;
            }
            Err(error) => {
                return Err(RetryFailure {
                    attempts: attempt,
                    error,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_delays_double_and_cap() {
        let policy = RetryPolicy::new(3, Duration::from_secs(1));
        let mut delays = policy.delays();
        assert_eq!(delays.next_backoff(), Some(Duration::from_secs(1)));
        assert_eq!(delays.next_backoff(), Some(Duration::from_secs(2)));
        assert_eq!(delays.next_backoff(), Some(Duration::from_secs(4)));

        let policy = RetryPolicy::new(10, Duration::from_secs(20));
        let mut delays = policy.delays();
        delays.next_backoff();
        assert_eq!(delays.next_backoff(), Some(MAX_RETRY_DELAY));
    }

    #[tokio::test(start_paused = true)]
    async fn test_retries_until_success() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(3, Duration::from_millis(100));

        let result = with_retries(&policy, "test", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(MealError::Timeout(1))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_exhaustion_reports_attempts() {
        let policy = RetryPolicy::new(2, Duration::from_millis(10));
        let failure = with_retries(&policy, "test", || async {
            Err::<(), _>(MealError::Timeout(1))
        })
        .await
        .unwrap_err();

        assert_eq!(failure.attempts, 3);
        assert!(matches!(failure.error, MealError::Timeout(_)));
    }

    #[tokio::test]
    async fn test_non_retryable_fails_fast() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::new(5, Duration::from_millis(10));
        let failure = with_retries(&policy, "test", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err::<(), _>(MealError::MissingCollection("meals".into())) }
        })
        .await
        .unwrap_err();

        assert_eq!(failure.attempts, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
