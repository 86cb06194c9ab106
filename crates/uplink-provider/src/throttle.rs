//! Call pacing and retry with exponential backoff.
//!
//! One `Throttle` instance is shared by every worker talking to the
//! provider: the API's rate limit applies to the account, not to any single
//! task, so the spacing state must be owned in one place and injected.

use rand::Rng;
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::warn;
use uplink_core::config::ImportOptions;
use uplink_core::{Error, Result};

/// Enforces a minimum interval between consecutive calls.
pub struct Throttle {
    min_interval: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Mutex::new(None),
        }
    }

    pub fn from_options(options: &ImportOptions) -> Self {
        Self::new(Duration::from_millis(options.min_interval_ms))
    }

    /// Wait until the minimum interval since the previous call has passed.
    ///
    /// The slot lock is held across the wait, so concurrent callers are
    /// spaced out rather than released together.
    pub async fn acquire(&self) {
        let mut last = self.last_call.lock().await;
        if let Some(prev) = *last {
            let elapsed = prev.elapsed();
            if elapsed < self.min_interval {
                sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }
}

/// Exponential backoff parameters for retryable provider errors.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub base: Duration,
    pub cap: Duration,
    pub max_attempts: u32,
}

impl RetryPolicy {
    pub fn from_options(options: &ImportOptions) -> Self {
        Self {
            base: Duration::from_millis(options.backoff_base_ms),
            cap: Duration::from_millis(options.backoff_cap_ms),
            max_attempts: options.max_retries.max(1),
        }
    }

    /// Delay before the next attempt: `base * 2^attempt`, capped, jittered.
    ///
    /// A provider-supplied Retry-After takes precedence when it is longer.
    pub fn delay_for(&self, attempt: u32, error: &Error) -> Duration {
        let exp = self
            .base
            .saturating_mul(2u32.saturating_pow(attempt))
            .min(self.cap);
        let jittered = exp.mul_f64(rand::thread_rng().gen_range(0.5..=1.0));

        if let Error::RateLimited {
            retry_after_secs: Some(secs),
        } = error
        {
            return jittered.max(Duration::from_secs(*secs));
        }
        jittered
    }
}

/// Run an operation under the shared throttle, retrying rate-limited and
/// transient failures with backoff.
///
/// Non-retryable errors propagate immediately without consuming the retry
/// budget. Exhausting the budget surfaces the last error, tagged.
pub async fn call_with_retries<T, F, Fut>(
    throttle: &Throttle,
    policy: &RetryPolicy,
    mut op: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = policy.max_attempts.max(1);
    let mut last: Option<Error> = None;

    for attempt in 0..attempts {
        throttle.acquire().await;

        match op().await {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() => {
                let delay = policy.delay_for(attempt, &e);
                warn!(
                    attempt = attempt + 1,
                    max_attempts = attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %e,
                    "Retryable provider error, backing off"
                );
                last = Some(e);
                if attempt + 1 < attempts {
                    sleep(delay).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(Error::ExhaustedRetries {
        attempts,
        last: last.map(|e| e.to_string()).unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            base: Duration::from_millis(10),
            cap: Duration::from_millis(80),
            max_attempts,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_spaces_out_calls() {
        let throttle = Throttle::new(Duration::from_secs(1));

        let started = Instant::now();
        throttle.acquire().await;
        throttle.acquire().await;
        throttle.acquire().await;

        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn throttle_is_shared_across_tasks() {
        let throttle = Arc::new(Throttle::new(Duration::from_secs(1)));
        let started = Instant::now();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let throttle = throttle.clone();
            handles.push(tokio::spawn(async move { throttle.acquire().await }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_until_success() {
        let throttle = Throttle::new(Duration::ZERO);
        let calls = AtomicU32::new(0);

        let result = call_with_retries(&throttle, &fast_policy(5), || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Error::Transient("503".into()))
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
    async fn exhausted_retries_carries_last_error() {
        let throttle = Throttle::new(Duration::ZERO);
        let calls = AtomicU32::new(0);

        let result: Result<()> = call_with_retries(&throttle, &fast_policy(3), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Transient("gateway timeout".into())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match result.unwrap_err() {
            Error::ExhaustedRetries { attempts, last } => {
                assert_eq!(attempts, 3);
                assert!(last.contains("gateway timeout"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_errors_propagate_immediately() {
        let throttle = Throttle::new(Duration::ZERO);
        let calls = AtomicU32::new(0);

        let result: Result<()> = call_with_retries(&throttle, &fast_policy(5), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(Error::Auth("credentials rejected".into())) }
        })
        .await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result.unwrap_err(), Error::Auth(_)));
    }

    #[test]
    fn backoff_grows_and_caps() {
        let policy = RetryPolicy {
            base: Duration::from_millis(100),
            cap: Duration::from_millis(400),
            max_attempts: 5,
        };
        let err = Error::Transient("x".into());

        for _ in 0..20 {
            let d0 = policy.delay_for(0, &err);
            let d3 = policy.delay_for(3, &err);
            assert!(d0 >= Duration::from_millis(50) && d0 <= Duration::from_millis(100));
            // attempt 3 would be 800ms uncapped; the cap bounds it at 400ms
            assert!(d3 <= Duration::from_millis(400));
            assert!(d3 >= Duration::from_millis(200));
        }
    }

    #[test]
    fn retry_after_overrides_short_backoff() {
        let policy = RetryPolicy {
            base: Duration::from_millis(10),
            cap: Duration::from_millis(100),
            max_attempts: 3,
        };
        let err = Error::RateLimited {
            retry_after_secs: Some(7),
        };
        assert!(policy.delay_for(0, &err) >= Duration::from_secs(7));
    }
}
