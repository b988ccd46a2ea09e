//! Fixed-delay retry policy
//!
//! Quick generation absorbs exactly one provider failure, waiting a fixed
//! delay before the second attempt. The contract is expressed as a policy
//! value so the attempt count and delay are testable independently of the
//! code using them.

use std::future::Future;
use std::time::Duration;
use tracing::warn;
use vestia_common::errors::{AppError, Result};

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, including the first
    pub max_attempts: u32,
    /// Fixed delay between attempts
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    /// Run `op` until it succeeds or attempts are exhausted, sleeping the
    /// fixed delay between attempts. Returns the last error on exhaustion.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                tokio::time::sleep(self.delay).await;
            }

            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) => {
                    warn!(
                        attempt,
                        max_attempts = self.max_attempts,
                        error = %e,
                        "Attempt failed"
                    );
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| AppError::Internal {
            message: "Retry policy ran zero attempts".to_string(),
        }))
    }
}

impl Default for RetryPolicy {
    /// The quick-generation contract: one retry after a 2-second delay
    fn default() -> Self {
        Self::new(2, Duration::from_millis(2000))
    }
}
