//! Bounded retry for the whole-pipeline unit of work.

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;
use tracing::{error, info, warn};

use crate::error::{BatchError, RetryError};

/// Default number of retries after the first attempt.
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay between attempts.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(5);

/// Fixed-delay bounded retry around a fallible unit of work.
///
/// Only a fault escaping the entire pipeline invocation triggers a retry;
/// per-step failures are absorbed by the step runner before they can reach
/// this layer. The inter-attempt delay suspends the calling task for its
/// full duration; there is no cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_retries: u32,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_RETRIES, DEFAULT_RETRY_DELAY)
    }
}

impl RetryPolicy {
    pub fn new(max_retries: u32, delay: Duration) -> Self {
        Self { max_retries, delay }
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Run the unit of work until it succeeds or the retry budget is spent.
    ///
    /// A permanently failing unit is invoked exactly `max_retries + 1`
    /// times; a unit succeeding on attempt `k` is invoked exactly `k` times.
    pub async fn run<T, F, Fut>(&self, mut work: F) -> Result<T, RetryError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, BatchError>>,
    {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match work().await {
                Ok(value) => {
                    if attempts > 1 {
                        info!(attempts, "batch succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(source) => {
                    if attempts > self.max_retries {
                        error!(attempts, %source, "batch failed, retries exhausted");
                        return Err(RetryError::Exhausted { attempts, source });
                    }
                    warn!(
                        attempt = attempts,
                        max_retries = self.max_retries,
                        %source,
                        delay_secs = self.delay.as_secs(),
                        "batch attempt failed, retrying after delay"
                    );
                    sleep(self.delay).await;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    fn fault(detail: &str) -> BatchError {
        BatchError::Io(io::Error::other(detail.to_string()))
    }

    #[tokio::test(start_paused = true)]
    async fn permanent_failure_invokes_max_retries_plus_one() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_secs(5));

        let counted = calls.clone();
        let result: Result<(), RetryError> = policy
            .run(|| {
                let counted = counted.clone();
                async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                    Err(fault("always down"))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(RetryError::Exhausted { attempts, .. }) => assert_eq!(attempts, 4),
            Ok(()) => panic!("expected exhaustion"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_attempt_k_invokes_exactly_k_times() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(3, Duration::from_secs(5));

        let counted = calls.clone();
        let result = policy
            .run(|| {
                let counted = counted.clone();
                async move {
                    if counted.fetch_add(1, Ordering::SeqCst) + 1 < 3 {
                        Err(fault("warming up"))
                    } else {
                        Ok("done")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "done");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn immediate_success_never_sleeps() {
        let policy = RetryPolicy::new(3, Duration::from_secs(5));
        let started = Instant::now();

        let result = policy.run(|| async { Ok(42u32) }).await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(started.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn waits_the_configured_delay_between_attempts() {
        let policy = RetryPolicy::new(2, Duration::from_secs(5));
        let started = Instant::now();

        let _: Result<(), RetryError> = policy.run(|| async { Err(fault("down")) }).await;

        // Two retries, one delay before each.
        assert_eq!(started.elapsed(), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn zero_retries_invokes_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let policy = RetryPolicy::new(0, Duration::from_secs(5));

        let counted = calls.clone();
        let result: Result<(), RetryError> = policy
            .run(|| {
                let counted = counted.clone();
                async move {
                    counted.fetch_add(1, Ordering::SeqCst);
                    Err(fault("down"))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(result.is_err());
    }
}
