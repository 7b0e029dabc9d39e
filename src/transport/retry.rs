//! Retry with exponential backoff and jitter.
//!
//! Only transient failures are retried: network errors and timeouts (when
//! enabled) plus API errors whose code is explicitly allow-listed.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tracing::{debug, warn};

use super::config::RetryConfig;
use crate::core::AmegoError;

/// Retry policy built from a [`RetryConfig`].
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(RetryConfig::default())
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Whether `err` is worth another attempt under this policy.
    pub fn is_retryable(&self, err: &AmegoError) -> bool {
        match err {
            AmegoError::Network(_) | AmegoError::Timeout { .. } => self.config.retry_network_errors,
            AmegoError::Api { code, .. } => self.config.retryable_codes.contains(code),
            _ => false,
        }
    }

    /// Run `operation`, retrying transient failures up to `max_retries` times.
    ///
    /// The last error is returned unchanged once retries are exhausted.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, AmegoError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AmegoError>>,
    {
        self.execute_with_hook(operation, |_, _, _| {}).await
    }

    /// Like [`execute`](Self::execute), calling `on_retry(attempt, delay, error)`
    /// before each backoff sleep. `attempt` counts retries from 1.
    pub async fn execute_with_hook<F, Fut, T, H>(
        &self,
        mut operation: F,
        mut on_retry: H,
    ) -> Result<T, AmegoError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AmegoError>>,
        H: FnMut(u32, Duration, &AmegoError),
    {
        let mut attempt = 0u32;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(err) => {
                    if !self.is_retryable(&err) {
                        return Err(err);
                    }
                    if attempt >= self.config.max_retries {
                        if self.config.max_retries > 0 {
                            warn!(
                                attempts = attempt + 1,
                                max_retries = self.config.max_retries,
                                "Max retries exhausted"
                            );
                        }
                        return Err(err);
                    }

                    let delay = self.calculate_backoff(attempt);
                    debug!(
                        attempt = attempt + 1,
                        max_retries = self.config.max_retries,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Retrying after transient error"
                    );
                    on_retry(attempt + 1, delay, &err);

                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Delay before retry `attempt` (0-indexed):
    /// `min(max_delay, base_delay * 2^attempt + U(0, base_delay / 2))`.
    pub fn calculate_backoff(&self, attempt: u32) -> Duration {
        let base = self.config.base_delay.as_millis() as u64;
        let half = base / 2;
        let jitter = if half > 0 {
            rand::thread_rng().gen_range(0..=half)
        } else {
            0
        };
        self.cap(exponential(base, attempt).saturating_add(jitter))
    }

    /// Backoff without jitter: `min(max_delay, base_delay * 2^attempt)`.
    pub fn backoff_without_jitter(&self, attempt: u32) -> Duration {
        let base = self.config.base_delay.as_millis() as u64;
        self.cap(exponential(base, attempt))
    }

    fn cap(&self, millis: u64) -> Duration {
        Duration::from_millis(millis).min(self.config.max_delay)
    }
}

fn exponential(base: u64, attempt: u32) -> u64 {
    base.saturating_mul(2u64.saturating_pow(attempt))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    fn instant_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            max_retries,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            ..RetryConfig::default()
        })
    }

    fn api_error(code: i64) -> AmegoError {
        AmegoError::Api {
            code,
            message: "failed".into(),
            response: serde_json::Value::Null,
        }
    }

    // Test 1: Success on first attempt returns immediately
    #[tokio::test]
    async fn success_on_first_attempt() {
        let policy = instant_policy(3);
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok::<_, AmegoError>("issued")
                }
            })
            .await;

        assert_eq!(result.unwrap(), "issued");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // Test 2: Always-failing retryable operation runs max_retries + 1 times
    #[tokio::test]
    async fn exhausts_after_max_retries_plus_one_calls() {
        let policy = instant_policy(3);
        let calls = Arc::new(AtomicU32::new(0));

        let result: Result<(), _> = policy
            .execute(|| {
                let calls = calls.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst);
                    Err(AmegoError::Network(format!("reset #{n}")))
                }
            })
            .await;

        assert_eq!(calls.load(Ordering::SeqCst), 4);
        match result {
            Err(AmegoError::Network(message)) => assert_eq!(message, "reset #3"),
            other => panic!("expected last network error, got {other:?}"),
        }
    }

    // Test 3: Recovers after transient failures
    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let policy = instant_policy(3);
        let calls = Arc::new(AtomicU32::new(0));

        let result = policy
            .execute(|| {
                let calls = calls.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                        Err(AmegoError::Timeout {
                            timeout: Duration::from_secs(30),
                        })
                    } else {
                        Ok(42)
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    // Test 4: Non-retryable errors propagate after one call
    #[tokio::test]
    async fn non_retryable_errors_are_not_retried() {
        let policy = instant_policy(3);
        let errors: [fn() -> AmegoError; 4] = [
            || AmegoError::validation("bad", Vec::new()),
            || api_error(1),
            || AmegoError::RateLimitExceeded {
                retry_after: Duration::from_millis(100),
            },
            || AmegoError::InvalidResponse("not json".into()),
        ];
        for err in errors {
            let calls = Arc::new(AtomicU32::new(0));
            let result: Result<(), _> = policy
                .execute(|| {
                    let calls = calls.clone();
                    async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Err(err())
                    }
                })
                .await;
            assert!(result.is_err());
            assert_eq!(calls.load(Ordering::SeqCst), 1);
        }
    }

    // Test 5: Allow-listed API codes are retried
    #[tokio::test]
    async fn allow_listed_codes_are_retried() {
        let policy = RetryPolicy::new(RetryConfig {
            max_retries: 2,
            base_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            retryable_codes: vec![500],
            ..RetryConfig::default()
        });
        assert!(policy.is_retryable(&api_error(500)));
        assert!(!policy.is_retryable(&api_error(1)));

        let calls = Arc::new(AtomicU32::new(0));
        let _: Result<(), _> = policy
            .execute(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(api_error(500))
                }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    // Test 6: Network retries can be switched off
    #[test]
    fn network_retry_toggle() {
        let policy = RetryPolicy::new(RetryConfig {
            retry_network_errors: false,
            ..RetryConfig::default()
        });
        assert!(!policy.is_retryable(&AmegoError::Network("refused".into())));
        assert!(RetryPolicy::with_defaults().is_retryable(&AmegoError::Network("refused".into())));
    }

    // Test 7: Zero retries means exactly one call
    #[tokio::test]
    async fn zero_retries_calls_once() {
        let policy = instant_policy(0);
        let calls = Arc::new(AtomicU32::new(0));
        let _: Result<(), _> = policy
            .execute(|| {
                let calls = calls.clone();
                async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err(AmegoError::Network("down".into()))
                }
            })
            .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    // Test 8: Backoff doubles and is capped
    #[test]
    fn backoff_doubles_and_caps() {
        let policy = RetryPolicy::with_defaults();
        assert_eq!(policy.backoff_without_jitter(0), Duration::from_millis(1000));
        assert_eq!(policy.backoff_without_jitter(2), Duration::from_millis(4000));
        assert_eq!(policy.backoff_without_jitter(10), Duration::from_millis(30_000));
        assert_eq!(policy.backoff_without_jitter(64), Duration::from_millis(30_000));
    }

    // Test 9: Jitter stays within half a base delay
    #[test]
    fn jitter_bounds() {
        let policy = RetryPolicy::with_defaults();
        for _ in 0..100 {
            let delay = policy.calculate_backoff(1);
            assert!(delay >= Duration::from_millis(2000));
            assert!(delay <= Duration::from_millis(2500));
        }
        assert_eq!(policy.calculate_backoff(20), Duration::from_millis(30_000));
    }

    // Test 10: Backoff sleeps are honoured
    #[tokio::test(start_paused = true)]
    async fn sleeps_between_attempts() {
        let policy = RetryPolicy::new(RetryConfig {
            max_retries: 2,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_millis(1000),
            ..RetryConfig::default()
        });
        let start = tokio::time::Instant::now();
        let _: Result<(), _> = policy
            .execute(|| async { Err(AmegoError::Network("down".into())) })
            .await;
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
    }

    // Test 11: Hook sees every retry with its attempt number
    #[tokio::test]
    async fn hook_observes_retries() {
        let policy = instant_policy(2);
        let mut seen = Vec::new();
        let _: Result<(), _> = policy
            .execute_with_hook(
                || async { Err(AmegoError::Network("down".into())) },
                |attempt, _, err| seen.push((attempt, err.kind())),
            )
            .await;
        assert_eq!(
            seen,
            [
                (1, crate::core::ErrorKind::Network),
                (2, crate::core::ErrorKind::Network)
            ]
        );
    }
}
