//! # Retry Policy
//!
//! Bounded retry with either exponential or fixed delays between attempts.
//! Delays are `tokio::time::sleep`s, so a retrying task never blocks a runtime
//! thread.

use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Display};
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

/// Delay schedule between attempts
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backoff {
    /// `factor^attempt` units after the zero-based failed `attempt`
    Exponential { factor: u32 },
    /// The same delay after every failed attempt
    Fixed(Duration),
}

/// Returned when every attempt failed
#[derive(Debug)]
pub struct RetryExhausted<E> {
    pub operation: String,
    pub attempts: u32,
    pub last_error: E,
}

impl<E: Display> Display for RetryExhausted<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} failed after {} attempts: {}",
            self.operation, self.attempts, self.last_error
        )
    }
}

impl<E: Debug + Display> std::error::Error for RetryExhausted<E> {}

#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Backoff,
    /// Base unit for exponential delays
    unit: Duration,
}

impl RetryPolicy {
    /// `factor^attempt` seconds between attempts
    pub fn exponential(max_attempts: u32, factor: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Exponential { factor },
            unit: Duration::from_secs(1),
        }
    }

    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff: Backoff::Fixed(delay),
            unit: Duration::from_secs(1),
        }
    }

    /// Replace the base unit of exponential delays (tests use milliseconds)
    pub fn with_unit(mut self, unit: Duration) -> Self {
        self.unit = unit;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    pub fn backoff(&self) -> Backoff {
        self.backoff
    }

    /// Delay to wait after the zero-based failed `attempt`
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Exponential { factor } => {
                let multiplier = factor.saturating_pow(attempt);
                self.unit.saturating_mul(multiplier)
            }
            Backoff::Fixed(delay) => delay,
        }
    }

    /// Run `operation` until it succeeds or the attempt budget is spent.
    ///
    /// The closure receives the zero-based attempt number. No delay follows
    /// the final attempt.
    pub async fn run<T, E, F, Fut>(
        &self,
        operation_name: &str,
        mut operation: F,
    ) -> Result<T, RetryExhausted<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Display,
    {
        let mut attempt = 0;
        loop {
            match operation(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        info!(
                            operation = %operation_name,
                            attempt = attempt + 1,
                            "✅ RETRY: Operation succeeded after retry"
                        );
                    }
                    return Ok(value);
                }
                Err(e) => {
                    warn!(
                        operation = %operation_name,
                        error = %e,
                        "⚠️ RETRY: Attempt {}/{} failed",
                        attempt + 1,
                        self.max_attempts
                    );

                    if attempt + 1 >= self.max_attempts {
                        return Err(RetryExhausted {
                            operation: operation_name.to_string(),
                            attempts: attempt + 1,
                            last_error: e,
                        });
                    }

                    let delay = self.delay_for(attempt);
                    info!(
                        operation = %operation_name,
                        delay_ms = delay.as_millis() as u64,
                        "⏳ RETRY: Retrying in {:?}",
                        delay
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_exponential_delays() {
        let policy = RetryPolicy::exponential(5, 2);
        assert_eq!(policy.delay_for(0), Duration::from_secs(1));
        assert_eq!(policy.delay_for(1), Duration::from_secs(2));
        assert_eq!(policy.delay_for(3), Duration::from_secs(8));

        let fast = policy.with_unit(Duration::from_millis(1));
        assert_eq!(fast.delay_for(2), Duration::from_millis(4));
    }

    #[test]
    fn test_fixed_delays() {
        let policy = RetryPolicy::fixed(5, Duration::from_secs(5));
        assert_eq!(policy.delay_for(0), Duration::from_secs(5));
        assert_eq!(policy.delay_for(4), Duration::from_secs(5));
    }

    #[test]
    fn test_zero_attempts_means_one() {
        assert_eq!(RetryPolicy::exponential(0, 2).max_attempts(), 1);
    }

    #[tokio::test]
    async fn test_succeeds_after_failures() {
        let calls = AtomicU32::new(0);
        let policy = RetryPolicy::exponential(5, 2).with_unit(Duration::from_millis(1));

        let result = policy
            .run("flaky", |attempt| {
                calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if attempt < 2 {
                        Err("not yet")
                    } else {
                        Ok(attempt)
                    }
                }
            })
            .await
            .unwrap();

        assert_eq!(result, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhaustion_skips_final_sleep() {
        let policy = RetryPolicy::exponential(3, 2);
        let started = tokio::time::Instant::now();

        let err = policy
            .run("always_fails", |_| async { Err::<(), _>("boom") })
            .await
            .unwrap_err();

        assert_eq!(err.attempts, 3);
        assert_eq!(err.last_error, "boom");
        // 1s + 2s; nothing after the third attempt
        assert_eq!(started.elapsed(), Duration::from_secs(3));
    }
}
