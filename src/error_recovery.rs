// src/error_recovery.rs
//! Retry with exponential backoff for API operations.

use crate::constants::{DEFAULT_RETRIES, RETRY_BACKOFF_INITIAL, RETRY_BACKOFF_MAX};
use crate::error::AppError;
use std::time::Duration;

/// How often and how patiently a failing call is retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt; zero disables retrying.
    pub max_retries: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_RETRIES,
            initial_delay: RETRY_BACKOFF_INITIAL,
            max_delay: RETRY_BACKOFF_MAX,
        }
    }
}

impl RetryPolicy {
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Policy that retries immediately, without sleeping between attempts.
    pub fn immediate(max_retries: u32) -> Self {
        Self {
            max_retries,
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
        }
    }
}

/// Retries an async operation with exponential backoff.
///
/// Only errors reporting [`AppError::is_retryable`] are retried. `before_retry`
/// runs after a failed attempt and before the next one starts, receiving the
/// number of the upcoming retry.
pub async fn retry_with_backoff<F, T, Fut, R>(
    mut operation: F,
    policy: &RetryPolicy,
    mut before_retry: R,
) -> Result<T, AppError>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T, AppError>>,
    R: FnMut(u32, &AppError),
{
    let mut delay = policy.initial_delay;
    let mut retry = 0u32;

    loop {
        match operation().await {
            Ok(result) => return Ok(result),
            Err(e) if retry < policy.max_retries && e.is_retryable() => {
                retry += 1;
                log::warn!(
                    "Attempt {} failed ({}), retrying after {:?}",
                    retry,
                    e,
                    delay
                );
                before_retry(retry, &e);
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }

                // Exponential backoff with cap
                delay = std::cmp::min(delay * 2, policy.max_delay);
            }
            Err(e) => {
                if retry > 0 {
                    log::error!("Giving up after {} retries: {}", retry, e);
                }
                return Err(e);
            }
        }
    }
}
