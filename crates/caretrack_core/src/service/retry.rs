//! Bounded retry for status writes hitting a busy/locked database.
//!
//! # Invariants
//! - Only errors with [`crate::repo::RepoError::is_busy`] are retried.
//! - Retry `n` (1-based) sleeps `n * backoff_step` first.

use crate::repo::RepoResult;
use log::warn;
use std::thread;
use std::time::Duration;

const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_BACKOFF_STEP: Duration = Duration::from_millis(100);

/// Linear backoff retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts made after the first one.
    pub max_retries: u32,
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_step: DEFAULT_BACKOFF_STEP,
        }
    }
}

impl RetryPolicy {
    /// Policy that never retries.
    pub fn disabled() -> Self {
        Self {
            max_retries: 0,
            backoff_step: Duration::ZERO,
        }
    }

    /// Delay slept before retry number `retry` (1-based).
    pub fn backoff(&self, retry: u32) -> Duration {
        self.backoff_step.saturating_mul(retry)
    }

    /// Runs `write`, retrying busy/locked failures.
    ///
    /// The last error is returned unchanged once retries are exhausted.
    pub fn run<T, F>(&self, operation: &'static str, mut write: F) -> RepoResult<T>
    where
        F: FnMut() -> RepoResult<T>,
    {
        let mut retry = 0;
        loop {
            match write() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_busy() && retry < self.max_retries => {
                    retry += 1;
                    let delay = self.backoff(retry);
                    warn!(
                        "event=storage_retry module=retry status=retrying operation={} attempt={} delay_ms={}",
                        operation,
                        retry,
                        delay.as_millis()
                    );
                    thread::sleep(delay);
                }
                Err(err) => {
                    if err.is_busy() {
                        warn!(
                            "event=storage_retry module=retry status=exhausted operation={} retries={}",
                            operation, retry
                        );
                    }
                    return Err(err);
                }
            }
        }
    }
}
