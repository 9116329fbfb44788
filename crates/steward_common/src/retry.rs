//! Bounded retry policy for network-facing collaborators
//!
//! Owned by whoever makes the call (key server fetches, sync checks), never
//! by the UI.

use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::thread;
use std::time::Duration;
use tracing::warn;

/// Upper bound for exponential delays
const MAX_BACKOFF: Duration = Duration::from_secs(300);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Backoff {
    #[default]
    Fixed,
    Exponential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first one (at least 1)
    pub max_attempts: u32,
    pub delay: Duration,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn fixed(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff: Backoff::Fixed,
        }
    }

    pub fn exponential(max_attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
            backoff: Backoff::Exponential,
        }
    }

    /// A policy that tries exactly once
    pub fn once() -> Self {
        Self::fixed(1, Duration::ZERO)
    }

    /// Delay to wait after failed attempt number `attempt` (0-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match self.backoff {
            Backoff::Fixed => self.delay,
            Backoff::Exponential => self
                .delay
                .saturating_mul(1u32 << attempt.min(10))
                .min(MAX_BACKOFF),
        }
    }

    /// Run `op` until it succeeds or attempts run out, returning the last error
    ///
    /// `op` receives the 0-based attempt index, which callers use to rotate
    /// between mirrors.
    pub fn run<T, E, F>(&self, what: &str, mut op: F) -> Result<T, E>
    where
        E: Display,
        F: FnMut(u32) -> Result<T, E>,
    {
        let attempts = self.max_attempts.max(1);
        let mut attempt = 0;
        loop {
            match op(attempt) {
                Ok(value) => return Ok(value),
                Err(e) => {
                    attempt += 1;
                    if attempt >= attempts {
                        warn!("{} failed after {} attempts: {}", what, attempts, e);
                        return Err(e);
                    }
                    let delay = self.delay_for(attempt - 1);
                    warn!(
                        "{} failed (attempt {}/{}): {}. Retrying in {:?}",
                        what, attempt, attempts, e, delay
                    );
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
            }
        }
    }
}
