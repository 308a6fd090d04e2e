//! Status-code driven retry of response-producing operations.
//!
//! [`RetryLogic`] knows nothing about HTTP requests. It re-invokes any
//! operation whose outcome implements [`Retryable`] until the outcome counts
//! as a success or the retries are used up.

use crate::response::{Response, TypedResponse};
use http::StatusCode;
use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

/// An outcome that can be classified by its status code.
pub trait Retryable {
    /// The status code, or `None` when no response was produced.
    fn status_code(&self) -> Option<StatusCode>;
}

impl Retryable for Response {
    fn status_code(&self) -> Option<StatusCode> {
        Some(Response::status_code(self))
    }
}

impl<T> Retryable for TypedResponse<T> {
    fn status_code(&self) -> Option<StatusCode> {
        Some(self.response.status_code())
    }
}

impl<R: Retryable> Retryable for Option<R> {
    fn status_code(&self) -> Option<StatusCode> {
        self.as_ref().and_then(Retryable::status_code)
    }
}

/// Re-runs an operation until it succeeds or runs out of retries.
///
/// An outcome is successful when its status is below 300 or is one of the
/// supplied success codes. An absent outcome is never successful.
/// Exhausting the retries is not an error: the last outcome is returned and
/// the caller inspects its status. Errors returned by the operation itself
/// propagate immediately and are never retried.
///
/// # Examples
///
/// ```
/// use simplerest::{Response, RetryLogic};
/// use http::StatusCode;
/// use std::collections::HashSet;
/// use std::convert::Infallible;
/// use std::time::Duration;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut calls = 0;
/// let response = RetryLogic::new()
///     .execute(
///         || {
///             calls += 1;
///             let status = if calls < 3 {
///                 StatusCode::SERVICE_UNAVAILABLE
///             } else {
///                 StatusCode::OK
///             };
///             async move { Ok::<_, Infallible>(Response::new(status, Vec::new(), "")) }
///         },
///         &HashSet::new(),
///         5,
///         Duration::ZERO,
///     )
///     .await
///     .unwrap();
///
/// assert_eq!(response.status_code(), StatusCode::OK);
/// assert_eq!(calls, 3);
/// # }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct RetryLogic;

impl RetryLogic {
    /// Creates a new `RetryLogic`.
    pub fn new() -> Self {
        Self
    }

    /// Invokes `operation` at most `retry_count + 1` times.
    ///
    /// Between attempts the calling task sleeps for `retry_delay` unless it
    /// is zero.
    pub async fn execute<R, E, F, Fut>(
        &self,
        mut operation: F,
        success_codes: &HashSet<StatusCode>,
        retry_count: u32,
        retry_delay: Duration,
    ) -> Result<R, E>
    where
        R: Retryable,
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<R, E>>,
    {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            let outcome = operation().await?;
            if is_successful(&outcome, success_codes) {
                return Ok(outcome);
            }

            let status = outcome.status_code().map(|s| s.as_u16());
            if attempt > retry_count {
                tracing::warn!(
                    status = ?status,
                    attempts = attempt,
                    "Retries exhausted, returning last response"
                );
                return Ok(outcome);
            }

            if retry_delay.is_zero() {
                tracing::info!(status = ?status, attempt = attempt, "Retrying immediately");
            } else {
                tracing::info!(
                    status = ?status,
                    delay_ms = retry_delay.as_millis(),
                    attempt = attempt,
                    "Retrying after delay"
                );
                tokio::time::sleep(retry_delay).await;
            }
        }
    }
}

fn is_successful<R: Retryable>(outcome: &R, success_codes: &HashSet<StatusCode>) -> bool {
    outcome
        .status_code()
        .is_some_and(|status| is_success_status(status, success_codes))
}

/// Below 300, or one of the extra success codes.
pub(crate) fn is_success_status(status: StatusCode, success_codes: &HashSet<StatusCode>) -> bool {
    status.as_u16() < 300 || success_codes.contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::convert::Infallible;
    use std::time::Instant;

    struct Outcome(Option<u16>);

    impl Retryable for Outcome {
        fn status_code(&self) -> Option<StatusCode> {
            self.0.and_then(|code| StatusCode::from_u16(code).ok())
        }
    }

    async fn run(statuses: &[Option<u16>], success: &[u16], retry_count: u32) -> (Outcome, usize) {
        let success_codes: HashSet<StatusCode> = success
            .iter()
            .map(|&code| StatusCode::from_u16(code).unwrap())
            .collect();
        let mut calls = 0usize;

        let outcome = RetryLogic::new()
            .execute(
                || {
                    let status = statuses[calls.min(statuses.len() - 1)];
                    calls += 1;
                    async move { Ok::<_, Infallible>(Outcome(status)) }
                },
                &success_codes,
                retry_count,
                Duration::ZERO,
            )
            .await
            .unwrap();

        (outcome, calls)
    }

    #[tokio::test]
    async fn test_always_failing_invokes_retry_count_plus_one() {
        for n in 0..5 {
            let (outcome, calls) = run(&[Some(500)], &[], n).await;
            assert_eq!(calls, n as usize + 1);
            assert_eq!(outcome.0, Some(500));
        }
    }

    #[tokio::test]
    async fn test_success_returns_on_first_attempt() {
        for status in [200, 201, 204, 299] {
            let (outcome, calls) = run(&[Some(status)], &[], 10).await;
            assert_eq!(calls, 1);
            assert_eq!(outcome.0, Some(status));
        }
    }

    #[tokio::test]
    async fn test_custom_success_code() {
        let (outcome, calls) = run(&[Some(404)], &[404], 3).await;
        assert_eq!(calls, 1);
        assert_eq!(outcome.0, Some(404));

        let (_, calls) = run(&[Some(409)], &[404], 3).await;
        assert_eq!(calls, 4);
    }

    #[tokio::test]
    async fn test_three_hundred_is_not_success() {
        let (_, calls) = run(&[Some(300)], &[], 2).await;
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_recovers_after_failures() {
        let (outcome, calls) = run(&[Some(503), Some(503), Some(200)], &[], 2).await;
        assert_eq!(calls, 3);
        assert_eq!(outcome.0, Some(200));
    }

    #[tokio::test]
    async fn test_absent_outcome_is_retried() {
        let (outcome, calls) = run(&[None, Some(200)], &[], 1).await;
        assert_eq!(calls, 2);
        assert_eq!(outcome.0, Some(200));

        let (outcome, calls) = run(&[None], &[], 2).await;
        assert_eq!(calls, 3);
        assert_eq!(outcome.0, None);
    }

    #[tokio::test]
    async fn test_errors_are_not_retried() {
        let mut calls = 0;
        let result: Result<Outcome, &str> = RetryLogic::new()
            .execute(
                || {
                    calls += 1;
                    async { Err("connection refused") }
                },
                &HashSet::new(),
                5,
                Duration::ZERO,
            )
            .await;

        assert_eq!(result.err(), Some("connection refused"));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_delay_between_attempts() {
        let started = Instant::now();
        let mut calls = 0;
        let _ = RetryLogic::new()
            .execute(
                || {
                    calls += 1;
                    async { Ok::<_, Infallible>(Outcome(Some(500))) }
                },
                &HashSet::new(),
                2,
                Duration::from_millis(20),
            )
            .await;

        assert_eq!(calls, 3);
        assert!(started.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn test_option_outcome_classification() {
        let none: Option<Response> = None;
        assert_eq!(Retryable::status_code(&none), None);

        let some = Some(Response::new(StatusCode::OK, Vec::new(), ""));
        assert_eq!(Retryable::status_code(&some), Some(StatusCode::OK));
    }

    #[tokio::test]
    async fn test_settings_classification_matches_retry_loop() {
        let settings = crate::RequestSettings::new("application/json")
            .with_success_code(StatusCode::NOT_FOUND);

        for code in [200, 204, 299, 300, 404, 429, 503] {
            let (_, calls) = run(&[Some(code), Some(200)], &[404], 1).await;
            let status = StatusCode::from_u16(code).unwrap();
            assert_eq!(settings.is_success(status), calls == 1, "status {}", code);
        }
    }
}
