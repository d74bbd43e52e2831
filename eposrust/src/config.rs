//! Printer session configuration

use std::time::Duration;

use eposrust_core::constants::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_DISCONNECT_INTERVAL_MS, DEFAULT_DISCOVERY_WINDOW_MS,
    DEFAULT_MAX_DISCONNECT_ATTEMPTS,
};
use eposrust_core::{Halftone, RetryPolicy};

/// Timing and retry settings for a [`Printer`](crate::Printer)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrinterConfig {
    /// Passed unmodified to the vendor connect call
    pub connect_timeout: Duration,

    /// How long a discovery session collects devices
    pub discovery_window: Duration,

    /// Sleep between disconnect attempts while the printer is busy
    pub disconnect_interval: Duration,

    /// Upper bound on busy disconnect attempts
    pub max_disconnect_attempts: u32,

    /// Retry applied by `connect_with_retry` and `open_cash_drawer`
    pub connect_retry: RetryPolicy,

    /// Halftone used for images
    pub halftone: Halftone,
}

impl PrinterConfig {
    pub fn new() -> Self {
        Self {
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            discovery_window: Duration::from_millis(DEFAULT_DISCOVERY_WINDOW_MS),
            disconnect_interval: Duration::from_millis(DEFAULT_DISCONNECT_INTERVAL_MS),
            max_disconnect_attempts: DEFAULT_MAX_DISCONNECT_ATTEMPTS,
            connect_retry: RetryPolicy::default(),
            halftone: Halftone::default(),
        }
    }

    /// Set connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Set discovery window
    pub fn with_discovery_window(mut self, window: Duration) -> Self {
        self.discovery_window = window;
        self
    }

    /// Set busy disconnect polling
    pub fn with_disconnect_retry(mut self, interval: Duration, max_attempts: u32) -> Self {
        self.disconnect_interval = interval;
        self.max_disconnect_attempts = max_attempts.max(1);
        self
    }

    /// Set connect retry policy
    pub fn with_connect_retry(mut self, policy: RetryPolicy) -> Self {
        self.connect_retry = policy;
        self
    }

    pub fn with_halftone(mut self, halftone: Halftone) -> Self {
        self.halftone = halftone;
        self
    }
}

impl Default for PrinterConfig {
    fn default() -> Self {
        Self::new()
    }
}
