//! Retry with exponential back-off and jitter for the HTTP adapters.
//!
//! Only transport failures and 5xx responses are retried. A 4xx or a body
//! that does not decode is returned on the first attempt.

use std::future::Future;
use std::time::Duration;

use crate::error::ClientError;

/// Returns `true` for errors worth retrying after a back-off delay.
pub(crate) fn is_retriable(err: &ClientError) -> bool {
    match err {
        ClientError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        ClientError::InvalidUrl(_) | ClientError::Deserialize { .. } => false,
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on transient errors.
///
/// The sleep before retry `n` is `backoff_base_ms * 2^(n-1)` with ±25 % jitter,
/// capped at 60 s.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    endpoint: &str,
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, ClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ClientError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    endpoint,
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient HTTP error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    fn deserialize_err() -> ClientError {
        let src = serde_json::from_str::<()>("invalid").unwrap_err();
        ClientError::Deserialize {
            context: "test".to_owned(),
            source: src,
        }
    }

    async fn connect_err() -> ClientError {
        let err = reqwest::Client::new()
            .get("http://0.0.0.0:1")
            .send()
            .await
            .unwrap_err();
        ClientError::Http(err)
    }

    #[test]
    fn deserialize_error_is_not_retriable() {
        assert!(!is_retriable(&deserialize_err()));
    }

    #[test]
    fn invalid_url_is_not_retriable() {
        assert!(!is_retriable(&ClientError::InvalidUrl("nope".to_owned())));
    }

    #[tokio::test]
    async fn connect_error_is_retriable() {
        assert!(is_retriable(&connect_err().await));
    }

    #[tokio::test]
    async fn succeeds_immediately_on_first_try() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("test", 3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok::<u32, ClientError>(42)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn does_not_retry_deserialize_errors() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("test", 3, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(deserialize_err())
            }
        })
        .await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(matches!(result, Err(ClientError::Deserialize { .. })));
    }

    #[tokio::test]
    async fn retries_then_succeeds() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff("test", 3, 0, || {
            let c = Arc::clone(&c);
            async move {
                let attempt = c.fetch_add(1, Ordering::SeqCst) + 1;
                if attempt < 3 {
                    Err::<u32, _>(connect_err().await)
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
        let result = retry_with_backoff("test", 2, 0, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(connect_err().await)
            }
        })
        .await;
        assert!(matches!(result, Err(ClientError::Http(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }
}
