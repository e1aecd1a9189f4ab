//! Bounded retries for a single fetch step.

use std::future::Future;
use std::time::Duration;
use tcgprice_core::FetchError;
use tokio_util::sync::CancellationToken;

/// Attempt count, fixed delay and per-attempt timeout for one fetch step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first; zero is treated as one
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
    /// Upper bound for each attempt
    pub timeout: Duration,
}

/// Why a retried step gave up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryError {
    /// Every attempt failed; carries the last failure
    Exhausted(FetchError),
    /// The caller cancelled
    Cancelled,
}

/// Run `op` until it succeeds, attempts run out, or `cancel` fires.
///
/// Each attempt is bounded by `policy.timeout`; an elapsed attempt counts as
/// a [`FetchError::Timeout`]. Cancellation is observed during attempts and
/// during the delay between them.
pub async fn retry_fetch<T, F, Fut>(
    policy: &RetryPolicy,
    step: &str,
    cancel: &CancellationToken,
    mut op: F,
) -> Result<T, RetryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RetryError::Cancelled),
            outcome = tokio::time::timeout(policy.timeout, op()) => outcome,
        };

        let err = match outcome {
            Ok(Ok(value)) => return Ok(value),
            Ok(Err(e)) => e,
            Err(_) => FetchError::Timeout(format!(
                "{step} did not finish within {:?}",
                policy.timeout
            )),
        };

        if attempt >= max_attempts {
            tracing::error!("{} failed after {} attempts: {}", step, attempt, err);
            return Err(RetryError::Exhausted(err));
        }

        tracing::warn!(
            "{} failed (attempt {}/{}), retrying in {:?}: {}",
            step,
            attempt,
            max_attempts,
            policy.delay,
            err
        );

        tokio::select! {
            biased;
            () = cancel.cancelled() => return Err(RetryError::Cancelled),
            () = tokio::time::sleep(policy.delay) => {}
        }
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            delay: Duration::from_secs(2),
            timeout: Duration::from_secs(30),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_succeeds_after_transient_failures() {
        let calls = &AtomicU32::new(0);
        let started = tokio::time::Instant::now();

        let result = retry_fetch(&policy(3), "search", &CancellationToken::new(), || async move {
            if calls.fetch_add(1, Ordering::SeqCst) < 2 {
                Err(FetchError::Browser("page crashed".to_string()))
            } else {
                Ok(42)
            }
        })
        .await;

        assert_eq!(result, Ok(42));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(started.elapsed() >= Duration::from_secs(4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_exhausted_returns_last_error() {
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> =
            retry_fetch(&policy(3), "detail", &CancellationToken::new(), || async move {
                let n = calls.fetch_add(1, Ordering::SeqCst);
                Err(FetchError::Parse(format!("attempt {n}")))
            })
            .await;

        assert_eq!(
            result,
            Err(RetryError::Exhausted(FetchError::Parse("attempt 2".to_string())))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_attempt_timeout() {
        let result: Result<(), _> =
            retry_fetch(&policy(1), "detail", &CancellationToken::new(), || async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(())
            })
            .await;

        match result {
            Err(RetryError::Exhausted(err)) => assert!(err.is_timeout()),
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancellation_stops_retries() {
        let cancel = CancellationToken::new();
        let calls = &AtomicU32::new(0);

        let result: Result<(), _> = retry_fetch(&policy(5), "search", &cancel, || {
            calls.fetch_add(1, Ordering::SeqCst);
            cancel.cancel();
            async { Err(FetchError::RateLimited("marketplace".to_string())) }
        })
        .await;

        assert_eq!(result, Err(RetryError::Cancelled));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
