//! Bounded retry for upstream requests

use std::future::Future;
use std::time::Duration;

use crate::error::FetchError;

/// Delay strategy between attempts.
#[derive(Debug, Clone, Copy)]
pub enum Backoff {
    /// Same pause before every retry
    Fixed(Duration),
    /// `base * 2^(attempt-1)`, capped
    Exponential { base: Duration, cap: Duration },
}

impl Backoff {
    /// Pause after the given failed attempt (1-based).
    pub fn delay(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(d) => d,
            Self::Exponential { base, cap } => base
                .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
                .min(cap),
        }
    }
}

/// Retry policy for a single upstream call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Backoff::Fixed(Duration::from_millis(1000)),
        }
    }
}

/// Run `attempt_fn` up to `max_attempts` times.
///
/// On a retryable failure with attempts remaining, sleeps
/// `backoff.delay(attempt)` and tries again. The final attempt's error, and
/// any non-retryable error, propagates unmodified.
pub async fn execute<T, F, Fut>(policy: &RetryPolicy, mut attempt_fn: F) -> Result<T, FetchError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, FetchError>>,
{
    for attempt in 1..=policy.max_attempts {
        match attempt_fn().await {
            Ok(v) => return Ok(v),
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                let delay = policy.backoff.delay(attempt);
                log::debug!(
                    "attempt {attempt}/{} failed: {e}, retrying in {delay:?}",
                    policy.max_attempts
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) => return Err(e),
        }
    }
    // Unreachable when max_attempts >= 1; a zero-attempt policy still fails
    // with a named cause instead of falling through.
    Err(FetchError::RetriesExhausted {
        attempts: policy.max_attempts,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn http_err(message: String) -> FetchError {
        FetchError::Http {
            status: Some(503),
            message,
        }
    }

    fn fixed(ms: u64) -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            backoff: Backoff::Fixed(Duration::from_millis(ms)),
        }
    }

    #[test]
    fn fixed_delay_constant() {
        let backoff = Backoff::Fixed(Duration::from_millis(1000));
        assert_eq!(backoff.delay(1), Duration::from_millis(1000));
        assert_eq!(backoff.delay(5), Duration::from_millis(1000));
    }

    #[test]
    fn exponential_delay_doubles_and_caps() {
        let backoff = Backoff::Exponential {
            base: Duration::from_secs(2),
            cap: Duration::from_secs(10),
        };
        assert_eq!(backoff.delay(1), Duration::from_secs(2));
        assert_eq!(backoff.delay(2), Duration::from_secs(4));
        assert_eq!(backoff.delay(3), Duration::from_secs(8));
        assert_eq!(backoff.delay(4), Duration::from_secs(10));
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let out = execute(&fixed(1000), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n < 3 {
                    Err(http_err(format!("attempt {n}")))
                } else {
                    Ok(n)
                }
            }
        })
        .await
        .unwrap();

        assert_eq!(out, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        // Success on attempt 3 means exactly two inter-attempt pauses
        assert_eq!(start.elapsed(), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn exhaustion_propagates_final_error_unwrapped() {
        let calls = AtomicU32::new(0);

        let err = execute::<u32, _, _>(&fixed(1000), || {
            let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err(http_err(format!("attempt {n}"))) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        match err {
            FetchError::Http { message, .. } => assert_eq!(message, "attempt 3"),
            other => panic!("expected the final attempt's error, got {other}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_fails_immediately() {
        let calls = AtomicU32::new(0);
        let start = tokio::time::Instant::now();

        let err = execute::<u32, _, _>(&fixed(1000), || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(FetchError::Decode("bad body".to_string())) }
        })
        .await
        .unwrap_err();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[tokio::test]
    async fn zero_attempts_hits_defensive_error() {
        let policy = RetryPolicy {
            max_attempts: 0,
            backoff: Backoff::Fixed(Duration::from_millis(1)),
        };
        let err = execute::<u32, _, _>(&policy, || async { Ok(1) })
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::RetriesExhausted { attempts: 0 }));
    }

    #[tokio::test]
    async fn first_attempt_success_skips_delay() {
        let out = execute(&fixed(1000), || async { Ok::<_, FetchError>(42) })
            .await
            .unwrap();
        assert_eq!(out, 42);
    }
}
