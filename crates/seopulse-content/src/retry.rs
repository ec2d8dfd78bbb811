//! Exponential-backoff retry for transient content-API errors.
//!
//! Only conditions that can plausibly clear on their own are retried: an
//! HTTP 429 from the platform and network-level failures. Everything else
//! (404, unexpected statuses, parse failures, pagination guards) is
//! propagated immediately; retrying would return the same answer.

use std::future::Future;
use std::time::Duration;

use crate::error::ContentError;

fn is_transient(err: &ContentError) -> bool {
    matches!(
        err,
        ContentError::RateLimited { .. } | ContentError::Http(_)
    )
}

/// Executes `operation`, retrying transient failures with exponential
/// backoff: the n-th retry sleeps `backoff_base_secs * 2^(n-1)` seconds.
///
/// `max_retries` counts additional attempts after the first; `0` disables
/// retrying. The last error is returned once retries are exhausted.
pub(crate) async fn with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_secs: u64,
    mut operation: F,
) -> Result<T, ContentError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ContentError>>,
{
    let mut attempt = 0u32;

    loop {
        let err = match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };

        if !is_transient(&err) || attempt >= max_retries {
            return Err(err);
        }

        // base * 2^attempt, saturating on absurd configurations.
        let delay_secs = backoff_base_secs.saturating_mul(1u64 << attempt.min(62));
        tracing::warn!(
            attempt,
            max_retries,
            delay_secs,
            error = %err,
            "transient content-API error, retrying after backoff"
        );
        tokio::time::sleep(Duration::from_secs(delay_secs)).await;
        attempt += 1;
    }
}
