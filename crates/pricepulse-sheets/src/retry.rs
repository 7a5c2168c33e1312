//! Retry with exponential back-off and jitter for Sheets API calls.
//!
//! The Sheets API enforces per-minute write quotas and answers 429 when they
//! are exceeded. Those and 5xx responses are retried; other failures are not.

use std::future::Future;
use std::time::Duration;

use rand::Rng;

use crate::error::SheetsError;

/// Returns `true` for errors that are worth retrying after a back-off delay.
///
/// **Retriable:** network timeouts and connect failures, HTTP 429, HTTP 5xx.
///
/// **Not retriable:** other 4xx (bad range, missing permission), malformed
/// bodies, configuration errors.
pub(crate) fn is_retriable(err: &SheetsError) -> bool {
    match err {
        SheetsError::Http(e) => {
            e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
        }
        SheetsError::Api { status, .. } => *status == 429 || (500..600).contains(status),
        SheetsError::Deserialize { .. } | SheetsError::InvalidBaseUrl { .. } => false,
    }
}

const MAX_DELAY_MS: u64 = 60_000;

/// Delay before retry number `retry` (1-based): `base_ms * 2^(retry-1)`,
/// capped at 60 s, then scaled by a random factor in `[0.75, 1.25)`.
fn jittered_delay(base_ms: u64, retry: u32) -> Duration {
    let exponential = base_ms.saturating_mul(1u64 << retry.saturating_sub(1).min(10));
    let capped = exponential.min(MAX_DELAY_MS);
    let factor = rand::rng().random_range(0.75..1.25);
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let millis = (capped as f64 * factor) as u64;
    Duration::from_millis(millis)
}

/// Calls `operation` until it succeeds, fails permanently, or has been
/// retried `max_retries` times.
pub(crate) async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, SheetsError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, SheetsError>>,
{
    let mut retries = 0u32;
    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) if is_retriable(&err) && retries < max_retries => err,
            Err(err) => return Err(err),
        };
        retries += 1;
        let delay = jittered_delay(backoff_base_ms, retries);
        tracing::warn!(
            retry = retries,
            max_retries,
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            error = %err,
            "sheets request failed; backing off"
        );
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;

    fn api(status: u16) -> SheetsError {
        SheetsError::Api {
            status,
            message: "test".to_string(),
        }
    }

    #[test]
    fn quota_and_server_errors_are_retriable() {
        assert!(is_retriable(&api(429)));
        assert!(is_retriable(&api(503)));
        assert!(!is_retriable(&api(400)));
        assert!(!is_retriable(&api(403)));
    }

    #[test]
    fn delay_doubles_within_jitter_and_caps() {
        let first = jittered_delay(1_000, 1).as_millis();
        assert!((750..1_250).contains(&first), "first retry: {first}");
        let third = jittered_delay(1_000, 3).as_millis();
        assert!((3_000..5_000).contains(&third), "third retry: {third}");
        let huge = jittered_delay(1_000, 30).as_millis();
        assert!(huge < 75_000, "cap exceeded: {huge}");
        assert_eq!(jittered_delay(0, 4), Duration::ZERO);
    }

    #[tokio::test]
    async fn retries_quota_error_then_succeeds() {
        let calls = Cell::new(0u32);
        let result = retry_with_backoff(3, 0, || {
            calls.set(calls.get() + 1);
            let n = calls.get();
            async move {
                if n < 3 {
                    Err(api(429))
                } else {
                    Ok(n)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 3);
    }

    #[tokio::test]
    async fn stops_after_max_retries() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = retry_with_backoff(2, 0, || {
            calls.set(calls.get() + 1);
            async { Err(api(500)) }
        })
        .await;
        assert_eq!(calls.get(), 3);
        assert!(matches!(result, Err(SheetsError::Api { status: 500, .. })));
    }

    #[tokio::test]
    async fn does_not_retry_client_error() {
        let calls = Cell::new(0u32);
        let result: Result<(), _> = retry_with_backoff(3, 0, || {
            calls.set(calls.get() + 1);
            async { Err(api(404)) }
        })
        .await;
        assert_eq!(calls.get(), 1);
        assert!(result.is_err());
    }
}
