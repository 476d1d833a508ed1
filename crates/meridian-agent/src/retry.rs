// SPDX-FileCopyrightText: 2026 Meridian Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded exponential backoff for gateway calls.
//!
//! Each call result is classified into a [`CallOutcome`]. Transient failures
//! wait `base * 2^(attempt-1)` and try again, up to `max_attempts` total
//! attempts; fatal failures return immediately.

use std::future::Future;
use std::time::Duration;

use meridian_config::model::RetryConfig;
use meridian_core::MeridianError;
use tracing::{debug, warn};

/// Classified result of one attempt.
#[derive(Debug)]
pub enum CallOutcome<T> {
    Ok(T),
    /// Worth retrying after a backoff.
    Transient(MeridianError),
    /// Returned to the caller as is.
    Fatal(MeridianError),
}

impl<T> From<Result<T, MeridianError>> for CallOutcome<T> {
    fn from(result: Result<T, MeridianError>) -> Self {
        match result {
            Ok(value) => CallOutcome::Ok(value),
            Err(e) if e.is_transient() => CallOutcome::Transient(e),
            Err(e) => CallOutcome::Fatal(e),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
        }
    }

    pub fn from_config(config: &RetryConfig) -> Self {
        Self::new(
            config.max_attempts,
            Duration::from_millis(config.base_delay_ms),
        )
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Wait after the given failed attempt (1-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_delay.saturating_mul(factor)
    }

    /// Run `op` until it succeeds, fails fatally, or attempts run out.
    pub async fn run<T, F, Fut>(&self, label: &str, mut op: F) -> Result<T, MeridianError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, MeridianError>>,
    {
        let mut attempt = 1;
        loop {
            match CallOutcome::from(op().await) {
                CallOutcome::Ok(value) => {
                    if attempt > 1 {
                        debug!(label, attempt, "call succeeded after retry");
                    }
                    return Ok(value);
                }
                CallOutcome::Fatal(e) => return Err(e),
                CallOutcome::Transient(e) if attempt >= self.max_attempts => {
                    warn!(label, attempts = attempt, error = %e, "retries exhausted");
                    return Err(e);
                }
                CallOutcome::Transient(e) => {
                    let delay = self.delay_for(attempt);
                    warn!(
                        label,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %e,
                        "transient error, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_millis(1000))
    }
}
