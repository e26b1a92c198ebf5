//! Bounded exponential-backoff retry for network-touching calls.
//!
//! Every origin/hub interaction in a run goes through [`RetryPolicy::run`].
//! Transient failures are retried with `base_delay * 2^attempt` waits;
//! non-transient failures return immediately. Exhaustion always surfaces the
//! final error to the caller — the one place allowed to downgrade it to
//! "metadata unavailable" is the mirror lookup in the runner.

use std::fmt::Display;
use std::thread;
use std::time::Duration;

use skiff_core::remote::TransportError;

/// Errors that can say whether another attempt could help.
pub trait Retryable {
    fn is_transient(&self) -> bool;
}

impl Retryable for TransportError {
    fn is_transient(&self) -> bool {
        TransportError::is_transient(self)
    }
}

/// Bounded exponential backoff: `attempts` tries, waiting
/// `base_delay * 2^attempt` after the n-th failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            base_delay: Duration::from_secs(1),
        }
    }
}

impl RetryPolicy {
    /// A policy that never waits between attempts (tests).
    pub fn immediate(attempts: u32) -> Self {
        Self {
            attempts,
            base_delay: Duration::ZERO,
        }
    }

    /// Run `op` until it succeeds, fails non-transiently, or the attempt
    /// bound is exhausted. Each failure is logged with `label` before the
    /// wait; the final error propagates unchanged.
    pub fn run<T, E>(&self, label: &str, mut op: impl FnMut() -> Result<T, E>) -> Result<T, E>
    where
        E: Retryable + Display,
    {
        let mut attempt = 1u32;
        loop {
            match op() {
                Ok(value) => return Ok(value),
                Err(e) if !e.is_transient() => {
                    tracing::warn!("{label}: non-transient failure: {e}");
                    return Err(e);
                }
                Err(e) if attempt >= self.attempts => {
                    tracing::warn!("{label}: attempt {attempt} failed: {e}; giving up");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!("{label}: attempt {attempt} failed: {e}");
                    thread::sleep(self.base_delay * 2u32.pow(attempt));
                    attempt += 1;
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
