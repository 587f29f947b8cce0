//! Fixed-delay retry for transport failures.
//!
//! Only [`ApiError::is_network`] errors are retried. Status and decode errors
//! are returned immediately.

use std::future::Future;
use std::time::Duration;

use crate::error::ApiError;

pub(crate) fn is_retriable(err: &ApiError) -> bool {
    err.is_network()
}

/// Runs `operation`, retrying up to `max_retries` more times on network
/// errors with `backoff` between attempts.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff: Duration,
    mut operation: F,
) -> Result<T, ApiError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ApiError>>,
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
                #[allow(clippy::cast_possible_truncation)]
                let delay_ms = backoff.as_millis() as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "network error, retrying after back-off"
                );
                tokio::time::sleep(backoff).await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    use super::*;

    async fn connect_error() -> ApiError {
        let err = reqwest::Client::new()
            .get("http://0.0.0.0:1")
            .send()
            .await
            .unwrap_err();
        ApiError::Http(err)
    }

    #[test]
    fn status_error_is_not_retriable() {
        assert!(!is_retriable(&ApiError::Status {
            status: 503,
            path: "/api/packages".to_owned(),
            message: "unavailable".to_owned(),
        }));
    }

    #[tokio::test]
    async fn network_error_is_retried_exactly_once() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(1, Duration::ZERO, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(connect_error().await)
            }
        })
        .await;
        assert!(result.unwrap_err().is_network());
        assert_eq!(calls.load(Ordering::SeqCst), 2, "one call plus one retry");
    }

    #[tokio::test]
    async fn retry_can_succeed() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(1, Duration::ZERO, || {
            let c = Arc::clone(&c);
            async move {
                if c.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(connect_error().await)
                } else {
                    Ok(7)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn status_error_is_not_retried() {
        let calls = Arc::new(AtomicU32::new(0));
        let c = Arc::clone(&calls);
        let result = retry_with_backoff(1, Duration::ZERO, || {
            let c = Arc::clone(&c);
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Err::<u32, _>(ApiError::Status {
                    status: 500,
                    path: "/api/routes".to_owned(),
                    message: "boom".to_owned(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(ApiError::Status { status: 500, .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
