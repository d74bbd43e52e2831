//! Session state for one printer handle
//!
//! A session tracks:
//! - The vendor handle (present once set up)
//! - The target bound at setup time
//! - Whether the transport link is open
//! - The connect timeout passed to the vendor

use std::time::Duration;

use crate::constants::DEFAULT_CONNECT_TIMEOUT_MS;
use crate::error::{Error, Result};

/// Session state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No handle
    Unconfigured,

    /// Handle and target present, link closed
    Configured,

    /// Link open
    Connected,
}

/// Owner of a printer handle and its connection flag
///
/// `connected` can only be true while a handle is installed.
#[derive(Debug)]
pub struct Session<H> {
    handle: Option<H>,
    target: Option<String>,
    connected: bool,
    timeout: Duration,
}

impl<H> Session<H> {
    /// Create an unconfigured session
    pub fn new() -> Self {
        Self {
            handle: None,
            target: None,
            connected: false,
            timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
        }
    }

    /// Get current state
    pub fn state(&self) -> SessionState {
        match (&self.handle, self.connected) {
            (None, _) => SessionState::Unconfigured,
            (Some(_), false) => SessionState::Configured,
            (Some(_), true) => SessionState::Connected,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.handle.is_some()
    }

    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub fn target(&self) -> Option<&str> {
        self.target.as_deref()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = timeout;
    }

    /// Install a freshly constructed handle bound to `target`
    ///
    /// Any previous handle must have been taken first; the link starts closed.
    pub fn install(&mut self, handle: H, target: impl Into<String>) {
        self.handle = Some(handle);
        self.target = Some(target.into());
        self.connected = false;
    }

    /// Remove the handle, returning it for teardown
    pub fn take_handle(&mut self) -> Option<H> {
        self.connected = false;
        self.target = None;
        self.handle.take()
    }

    /// Borrow the handle or fail with `PrinterNotFound`
    pub fn handle_mut(&mut self) -> Result<&mut H> {
        self.handle.as_mut().ok_or(Error::PrinterNotFound)
    }

    /// Borrow the handle together with its bound target
    ///
    /// Fails with `PrinterNotFound` without a handle and `MissingTarget`
    /// when the target is absent or empty.
    pub fn connectable(&mut self) -> Result<(&mut H, String)> {
        let handle = self.handle.as_mut().ok_or(Error::PrinterNotFound)?;
        let target = self
            .target
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or(Error::MissingTarget)?;
        Ok((handle, target.to_owned()))
    }

    /// Record an open link
    pub fn mark_connected(&mut self) -> Result<()> {
        if self.handle.is_none() {
            return Err(Error::InvalidSessionState(format!(
                "Cannot connect from state: {:?}",
                self.state()
            )));
        }

        self.connected = true;
        Ok(())
    }

    /// Record a closed link
    pub fn mark_disconnected(&mut self) {
        self.connected = false;
    }
}

impl<H> Default for Session<H> {
    fn default() -> Self {
        Self::new()
    }
}
