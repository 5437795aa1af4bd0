//! Retry logic.
//!
//! # Responsibilities
//! - Run an async operation up to `max_attempts` times
//! - Wait a fixed backoff between attempts
//! - Abort promptly when the shutdown signal fires

use std::future::Future;
use std::time::Duration;

use crate::lifecycle::ShutdownSignal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first. Treated as at least 1.
    pub max_attempts: u32,
    pub backoff: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts,
            backoff,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RetryOutcome<T, E> {
    Success { value: T, attempts: u32 },
    Exhausted { attempts: u32, last_error: E },
    Cancelled,
}

/// Run `op` until it succeeds, attempts run out, or `signal` fires.
///
/// `op` receives the 1-based attempt number.
pub async fn retry_with_backoff<T, E, F, Fut>(
    policy: RetryPolicy,
    signal: &mut ShutdownSignal,
    mut op: F,
) -> RetryOutcome<T, E>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, E>>,
{
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 1;

    loop {
        if signal.is_triggered() {
            return RetryOutcome::Cancelled;
        }

        let result = tokio::select! {
            biased;
            _ = signal.recv() => return RetryOutcome::Cancelled,
            result = op(attempt) => result,
        };

        let last_error = match result {
            Ok(value) => {
                return RetryOutcome::Success {
                    value,
                    attempts: attempt,
                }
            }
            Err(e) => e,
        };

        if attempt >= max_attempts {
            return RetryOutcome::Exhausted {
                attempts: attempt,
                last_error,
            };
        }

        tokio::select! {
            biased;
            _ = signal.recv() => return RetryOutcome::Cancelled,
            _ = tokio::time::sleep(policy.backoff) => {}
        }
        attempt += 1;
    }
}
