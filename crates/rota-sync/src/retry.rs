#![forbid(unsafe_code)]

//! Bounded retry with deterministic backoff for remote writes.
//!
//! Backoff delays use fixed formulas (no jitter) so tests can assert exact
//! attempt counts and timing. Transient failures (network loss) back off
//! linearly — `base × attempt` — while busy/unavailable responses from the
//! remote wait a fixed longer delay. Any non-transient failure aborts after
//! the first attempt and surfaces the underlying cause unchanged.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use rota_core::SyncError;

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackoffStrategy {
    /// Fixed delay after every failed attempt.
    Fixed {
        /// Delay in milliseconds.
        delay_ms: u64,
    },
    /// Linear backoff: `base_ms × attempt`, capped at `max_ms`.
    Linear {
        /// Base delay in milliseconds.
        base_ms: u64,
        /// Maximum delay cap in milliseconds.
        max_ms: u64,
    },
}

impl BackoffStrategy {
    /// Delay after the given failed attempt (1-indexed).
    #[must_use]
    pub fn delay(&self, attempt: u32) -> Duration {
        match self {
            Self::Fixed { delay_ms } => Duration::from_millis(*delay_ms),
            Self::Linear { base_ms, max_ms } => {
                let ms = base_ms.saturating_mul(u64::from(attempt)).min(*max_ms);
                Duration::from_millis(ms)
            }
        }
    }
}

/// Retry policy for remote writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first (1 = no retries).
    pub max_attempts: u32,
    /// Backoff after a plain transient failure (network loss).
    pub transient: BackoffStrategy,
    /// Backoff after the remote reports busy/unavailable.
    pub busy: BackoffStrategy,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            transient: BackoffStrategy::Linear {
                base_ms: 1_000,
                max_ms: 5_000,
            },
            busy: BackoffStrategy::Fixed { delay_ms: 3_000 },
        }
    }
}

impl RetryPolicy {
    /// Execute once, never retry.
    #[must_use]
    pub const fn no_retry() -> Self {
        Self {
            max_attempts: 1,
            transient: BackoffStrategy::Fixed { delay_ms: 0 },
            busy: BackoffStrategy::Fixed { delay_ms: 0 },
        }
    }

    /// Default attempt bound with zero delays (for tests).
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            max_attempts: 3,
            transient: BackoffStrategy::Fixed { delay_ms: 0 },
            busy: BackoffStrategy::Fixed { delay_ms: 0 },
        }
    }

    /// Delay before retrying after `err` failed the given attempt.
    #[must_use]
    pub fn delay_for(&self, err: &SyncError, attempt: u32) -> Duration {
        if err.is_busy() {
            self.busy.delay(attempt)
        } else {
            self.transient.delay(attempt)
        }
    }

    /// Run `op` under this policy.
    ///
    /// Retries only transient failures, sleeping between attempts. The
    /// final error — transient but out of attempts, or fatal on the first —
    /// is returned unchanged.
    pub fn run<T>(
        &self,
        what: &str,
        mut op: impl FnMut() -> Result<T, SyncError>,
    ) -> Result<T, SyncError> {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            attempt += 1;
            match op() {
                Ok(value) => return Ok(value),
                Err(err) if err.is_transient() && attempt < max_attempts => {
                    let delay = self.delay_for(&err, attempt);
                    tracing::debug!(
                        target: "rota.sync",
                        what,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "transient failure, retrying"
                    );
                    std::thread::sleep(delay);
                }
                Err(err) => return Err(err),
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
