//! Fixed-delay retry policy
//!
//! The policy only hands out delays; callers own the loop and the sleeping
//! so that the same policy serves async connect retries and busy polling.

use std::time::Duration;

use crate::constants::{DEFAULT_CONNECT_RETRIES, DEFAULT_CONNECT_RETRY_DELAY_MS};

/// Bounded retry with a fixed delay between attempts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub retries: u32,

    /// Delay before each retry
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, delay: Duration) -> Self {
        Self { retries, delay }
    }

    /// Single attempt, no retry
    pub fn none() -> Self {
        Self::new(0, Duration::ZERO)
    }

    /// Total number of attempts including the first
    pub fn max_attempts(&self) -> u32 {
        self.retries.saturating_add(1)
    }

    /// Delays to wait before each retry
    pub fn backoff(&self) -> Backoff {
        Backoff {
            remaining: self.retries,
            delay: self.delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(
            DEFAULT_CONNECT_RETRIES,
            Duration::from_millis(DEFAULT_CONNECT_RETRY_DELAY_MS),
        )
    }
}

/// Iterator over retry delays; exhausted when no retry is left
#[derive(Debug, Clone)]
pub struct Backoff {
    remaining: u32,
    delay: Duration,
}

impl Backoff {
    pub fn remaining(&self) -> u32 {
        self.remaining
    }
}

impl Iterator for Backoff {
    type Item = Duration;

    fn next(&mut self) -> Option<Duration> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        Some(self.delay)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.remaining as usize;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Backoff {}
