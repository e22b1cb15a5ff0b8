//! Retry with exponential back-off and jitter, and a store decorator that
//! applies it.
//!
//! [`RetryingStore`] wraps any [`AnalysisStore`] and retries operations that
//! fail with a transient [`StoreError`] (see [`StoreError::is_transient`]).
//! Permanent failures are returned on the first attempt.

use std::fmt::Display;
use std::future::Future;
use std::time::Duration;

use trendlens_core::{AnalysisStore, CacheKey, DailySnapshot, StoreError, StoredAnalysis};

const MAX_DELAY_MS: u64 = 60_000;

/// Back-off before retry number `attempt` (1-based), before jitter.
///
/// `backoff_base_ms × 2^(attempt-1)`, capped at 60 s.
#[must_use]
pub fn backoff_delay_ms(attempt: u32, backoff_base_ms: u64) -> u64 {
    let exponent = attempt.saturating_sub(1).min(10);
    backoff_base_ms
        .saturating_mul(1u64 << exponent)
        .min(MAX_DELAY_MS)
}

/// Runs `operation` with up to `max_retries` additional attempts while
/// `is_retriable` says the error is worth retrying.
///
/// Each delay is [`backoff_delay_ms`] scaled by a random factor in
/// `[0.75, 1.25)`.
///
/// # Errors
///
/// Returns the last error from `operation` once it is not retriable or the
/// retries are exhausted.
pub async fn retry_with_backoff<T, E, F, Fut>(
    label: &'static str,
    max_retries: u32,
    backoff_base_ms: u64,
    is_retriable: fn(&E) -> bool,
    mut operation: F,
) -> Result<T, E>
where
    E: Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let capped = backoff_delay_ms(attempt, backoff_base_ms);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    operation = label,
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// Retry policy for [`RetryingStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            backoff_base_ms: 200,
        }
    }
}

/// [`AnalysisStore`] decorator that retries transient failures.
#[derive(Debug, Clone)]
pub struct RetryingStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S> RetryingStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }
}

fn store_retriable(err: &StoreError) -> bool {
    err.is_transient()
}

impl<S> AnalysisStore for RetryingStore<S>
where
    S: AnalysisStore + Sync,
{
    async fn load(&self, key: &CacheKey) -> Result<Option<StoredAnalysis>, StoreError> {
        let RetryPolicy {
            max_retries,
            backoff_base_ms,
        } = self.policy;
        retry_with_backoff("store.load", max_retries, backoff_base_ms, store_retriable, || {
            self.inner.load(key)
        })
        .await
    }

    async fn save(&self, record: &StoredAnalysis) -> Result<(), StoreError> {
        let RetryPolicy {
            max_retries,
            backoff_base_ms,
        } = self.policy;
        retry_with_backoff("store.save", max_retries, backoff_base_ms, store_retriable, || {
            self.inner.save(record)
        })
        .await
    }

    async fn upsert_snapshot(&self, snapshot: &DailySnapshot) -> Result<(), StoreError> {
        let RetryPolicy {
            max_retries,
            backoff_base_ms,
        } = self.policy;
        retry_with_backoff(
            "store.upsert_snapshot",
            max_retries,
            backoff_base_ms,
            store_retriable,
            || self.inner.upsert_snapshot(snapshot),
        )
        .await
    }

    async fn list_snapshots(
        &self,
        key: &CacheKey,
        limit: usize,
    ) -> Result<Vec<DailySnapshot>, StoreError> {
        let RetryPolicy {
            max_retries,
            backoff_base_ms,
        } = self.policy;
        retry_with_backoff(
            "store.list_snapshots",
            max_retries,
            backoff_base_ms,
            store_retriable,
            || self.inner.list_snapshots(key, limit),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    #[test]
    fn backoff_doubles_and_caps() {
        assert_eq!(backoff_delay_ms(1, 500), 500);
        assert_eq!(backoff_delay_ms(2, 500), 1_000);
        assert_eq!(backoff_delay_ms(3, 500), 2_000);
        assert_eq!(backoff_delay_ms(30, 500), 60_000);
        assert_eq!(backoff_delay_ms(1, u64::MAX), 60_000);
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("test", 3, 0, store_retriable, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, StoreError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_transient_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("test", 3, 0, store_retriable, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err(StoreError::Unavailable("pool timed out".to_owned()))
                } else {
                    Ok(99)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 99);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("test", 2, 0, store_retriable, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(StoreError::Unavailable("down".to_owned()))
            }
        })
        .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3, "1 attempt + 2 retries");
    }

    #[tokio::test]
    async fn does_not_retry_permanent_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("test", 3, 0, store_retriable, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(StoreError::Backend("unique violation".to_owned()))
            }
        })
        .await;
        assert!(matches!(result, Err(StoreError::Backend(_))));
        assert_eq!(
            calls.load(Ordering::SeqCst),
            1,
            "permanent errors must not be retried"
        );
    }
}
