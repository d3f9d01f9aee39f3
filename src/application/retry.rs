//! Bounded retry around the planning, evaluation and synthesis calls.

use std::future::Future;
use std::time::Duration;

use crate::ports::ServiceError;

use super::CancellationToken;

/// How often and how patiently to retry one service call.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. At least 1.
    pub max_attempts: u32,
    /// Pause before the second attempt.
    pub backoff: Duration,
    /// Growth of the pause per further attempt.
    pub backoff_multiplier: f64,
    /// Budget of each single attempt.
    pub attempt_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff: Duration::from_millis(500),
            backoff_multiplier: 2.0,
            attempt_timeout: Duration::from_secs(60),
        }
    }
}

impl RetryPolicy {
    /// Policy allowing `retries` retries after the first attempt.
    pub fn with_retries(retries: u32, backoff: Duration, attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: retries + 1,
            backoff,
            backoff_multiplier: 2.0,
            attempt_timeout,
        }
    }

    /// Pause after failed attempt number `attempt` (1-based).
    pub fn delay_after(&self, attempt: u32) -> Duration {
        let factor = self
            .backoff_multiplier
            .max(1.0)
            .powi(attempt.saturating_sub(1) as i32);
        self.backoff.mul_f64(factor)
    }
}

/// Runs `operation` until it succeeds, fails with a non-retryable error or
/// the attempts run out.
///
/// Each attempt is bounded by `attempt_timeout` (a timeout counts as a
/// retryable failure) and raced against `cancel`.
pub async fn with_retry<T, F, Fut, R>(
    policy: &RetryPolicy,
    operation_name: &'static str,
    cancel: &CancellationToken,
    is_retryable: R,
    mut operation: F,
) -> Result<T, ServiceError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, ServiceError>>,
    R: Fn(&ServiceError) -> bool,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        if cancel.is_cancelled() {
            return Err(ServiceError::Cancelled);
        }

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ServiceError::Cancelled),
            timed = tokio::time::timeout(policy.attempt_timeout, operation(attempt)) => match timed {
                Ok(result) => result,
                Err(_) => Err(ServiceError::Timeout {
                    millis: policy.attempt_timeout.as_millis() as u64,
                }),
            },
        };

        match outcome {
            Ok(value) => {
                if attempt > 1 {
                    tracing::info!(operation = operation_name, attempt, "Succeeded after retry");
                }
                return Ok(value);
            }
            Err(err) if attempt < max_attempts && is_retryable(&err) => {
                let delay = policy.delay_after(attempt);
                tracing::warn!(
                    operation = operation_name,
                    attempt,
                    max_attempts,
                    delay_ms = delay.as_millis() as u64,
                    error = %err,
                    "Retrying after failure"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(ServiceError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
                attempt += 1;
            }
            Err(err) => {
                tracing::error!(
                    operation = operation_name,
                    attempt,
                    error = %err,
                    "Giving up"
                );
                return Err(err);
            }
        }
    }
}
