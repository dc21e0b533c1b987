//! HTTP Retry Logic and Error Classification
//!
//! リトライロジックとエラー分類

use std::future::Future;
use std::time::Duration;

use tokio::time::sleep;

use crate::domain::error::TransportError;

pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_INITIAL_RETRY_DELAY_MS: u64 = 500;
pub const DEFAULT_MAX_RETRY_DELAY_MS: u64 = 8000;

/// Bounded exponential backoff settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub initial_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            initial_delay_ms: DEFAULT_INITIAL_RETRY_DELAY_MS,
            max_delay_ms: DEFAULT_MAX_RETRY_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    pub fn delay_for(&self, retry_count: u32) -> Duration {
        Duration::from_millis(calculate_retry_delay(
            retry_count,
            self.initial_delay_ms,
            self.max_delay_ms,
        ))
    }
}

/// Calculate retry delay with exponential backoff
pub fn calculate_retry_delay(retry_count: u32, initial_delay_ms: u64, max_delay_ms: u64) -> u64 {
    let shift = retry_count.saturating_sub(1).min(32);
    initial_delay_ms
        .saturating_mul(1u64 << shift)
        .min(max_delay_ms)
}

/// Convert error chain to string including all causes
pub fn error_chain_to_string(e: &(dyn std::error::Error + 'static)) -> String {
    let mut messages = vec![e.to_string()];
    let mut source = e.source();
    while let Some(cause) = source {
        messages.push(cause.to_string());
        source = cause.source();
    }
    messages.join(" | ")
}

/// 5xx, 408 Request Timeout, 429 Too Many Requests
pub fn is_retryable_status(status: u16) -> bool {
    status >= 500 || status == 408 || status == 429
}

/// Check if a transport error is worth another attempt
pub fn is_retryable(error: &TransportError) -> bool {
    match error {
        TransportError::Connection(_) | TransportError::Timeout(_) => true,
        TransportError::Status { status, .. } => is_retryable_status(*status),
        TransportError::InvalidRequest(_)
        | TransportError::InvalidResponse(_)
        | TransportError::TaskFailed(_) => false,
    }
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// retry budget is spent.
///
/// Both arms carry the number of attempts made.
pub async fn retry_request<T, F, Fut>(
    policy: &RetryPolicy,
    label: &str,
    mut op: F,
) -> Result<(T, u32), (TransportError, u32)>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let mut retry_count = 0;

    loop {
        match op().await {
            Ok(value) => return Ok((value, retry_count + 1)),
            Err(e) if is_retryable(&e) && retry_count < policy.max_retries => {
                retry_count += 1;
                let delay = policy.delay_for(retry_count);
                println!(
                    "⚠ {} failed (attempt {}), retrying in {}ms: {}",
                    label,
                    retry_count,
                    delay.as_millis(),
                    e
                );
                sleep(delay).await;
            }
            Err(e) => return Err((e, retry_count + 1)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            max_retries,
            initial_delay_ms: 1,
            max_delay_ms: 2,
        }
    }

    #[test]
    fn test_calculate_retry_delay_first_retry() {
        assert_eq!(calculate_retry_delay(1, 500, 8000), 500);
    }

    #[test]
    fn test_calculate_retry_delay_doubles() {
        assert_eq!(calculate_retry_delay(2, 500, 8000), 1000);
        assert_eq!(calculate_retry_delay(3, 500, 8000), 2000);
    }

    #[test]
    fn test_calculate_retry_delay_capped() {
        assert_eq!(calculate_retry_delay(10, 500, 8000), 8000);
        // Very high retry count must not overflow
        assert_eq!(calculate_retry_delay(200, 500, 8000), 8000);
    }

    #[test]
    fn test_is_retryable_status() {
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(408));

        assert!(!is_retryable_status(400));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(422));
    }

    #[test]
    fn test_is_retryable_error() {
        assert!(is_retryable(&TransportError::Connection(
            "Connection refused".to_string()
        )));
        assert!(is_retryable(&TransportError::Timeout("30s".to_string())));
        assert!(is_retryable(&TransportError::Status {
            status: 502,
            body: String::new()
        }));

        assert!(!is_retryable(&TransportError::Status {
            status: 404,
            body: "Video not found.".to_string()
        }));
        assert!(!is_retryable(&TransportError::InvalidResponse(
            "not json".to_string()
        )));
        assert!(!is_retryable(&TransportError::InvalidRequest(
            "bad url".to_string()
        )));
    }

    #[test]
    fn test_error_chain_to_string() {
        #[derive(Debug)]
        struct Outer(std::io::Error);

        impl std::fmt::Display for Outer {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("error sending request")
            }
        }

        impl std::error::Error for Outer {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }

        let err = Outer(std::io::Error::new(
            std::io::ErrorKind::BrokenPipe,
            "Broken pipe",
        ));

        assert_eq!(
            error_chain_to_string(&err),
            "error sending request | Broken pipe"
        );
    }

    #[tokio::test]
    async fn test_retry_request_transient_then_success() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result = retry_request(&fast_policy(3), "test", move || async move {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Err(TransportError::Status {
                    status: 503,
                    body: "Service Unavailable".to_string(),
                })
            } else {
                Ok("ok")
            }
        })
        .await;

        assert_eq!(result, Ok(("ok", 2)));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_retry_request_max_retries_exceeded() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<((), u32), _> = retry_request(&fast_policy(2), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::Connection("Connection reset by peer".to_string()))
        })
        .await;

        let (err, attempts) = result.unwrap_err();
        assert_eq!(attempts, 3);
        assert!(matches!(err, TransportError::Connection(_)));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_retry_request_non_retryable_fails_immediately() {
        let counter = AtomicU32::new(0);
        let calls = &counter;

        let result: Result<((), u32), _> = retry_request(&fast_policy(5), "test", move || async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(TransportError::Status {
                status: 400,
                body: "Recording already processed.".to_string(),
            })
        })
        .await;

        assert_eq!(result.unwrap_err().1, 1);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, DEFAULT_MAX_RETRIES);
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(5), Duration::from_millis(8000));
    }
}
