//! Retry with exponential backoff and jitter.
//!
//! Decoupled from the HTTP specifics so the same policy wraps both the
//! route-compute and route-matrix calls.

use std::future::Future;
use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;
use tracing::warn;

const JITTER_MAX_MS: u64 = 200;

/// Errors that know whether a retry could help.
pub trait Retryable {
    fn is_retryable(&self) -> bool;
}

impl Retryable for crate::error::RoutesError {
    fn is_retryable(&self) -> bool {
        self.retryable
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Runs `op` until it succeeds, returns a non-retryable error, or
    /// attempts are exhausted. Backoff doubles per attempt
    /// (`base_delay * 2^(attempt-1)`) with up to 200ms of random jitter.
    pub async fn run<T, E, F, Fut>(&self, mut op: F) -> Result<T, E>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: Retryable + std::fmt::Display,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;

        loop {
            match op(attempt).await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    if !err.is_retryable() || attempt >= max_attempts {
                        return Err(err);
                    }

                    let backoff = self.base_delay * 2u32.saturating_pow(attempt - 1);
                    let jitter =
                        Duration::from_millis(rand::thread_rng().gen_range(0..=JITTER_MAX_MS));
                    warn!(
                        attempt,
                        max_attempts,
                        delay_ms = (backoff + jitter).as_millis() as u64,
                        error = %err,
                        "attempt failed, retrying"
                    );
                    sleep(backoff + jitter).await;
                    attempt += 1;
                }
            }
        }
    }
}
