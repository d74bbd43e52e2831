//! Transport layer for ePOS printers
//!
//! Defines the vendor boundary as two traits: [`PrinterSdk`] for discovery
//! and handle construction, [`PrinterHandle`] for one printer's connection
//! and command buffer. Every call reports an [`Outcome`].
//!
//! [`NetworkSdk`] is a native implementation speaking ESC/POS over TCP.

pub mod error;
pub mod escpos;
pub mod tcp;

pub use error::{Error, Result};
pub use escpos::EscPosEncoder;
pub use tcp::{NetworkHandle, NetworkSdk};

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eposrust_core::{BluetoothStatus, Instruction, Outcome, StatusEvent, VendorStatus};
use eposrust_types::{DeviceDescriptor, PortType, PrinterLanguage, PrinterSeries};
use tracing::debug;

/// Invoked once per device reported during discovery
pub type DiscoveryCallback = Arc<dyn Fn(DeviceDescriptor) + Send + Sync>;

/// Invoked on asynchronous printer status reports
pub type StatusListener = Arc<dyn Fn(StatusEvent) + Send + Sync>;

/// Vendor SDK entry points
#[cfg_attr(any(test, feature = "mock"), mockall::automock)]
#[async_trait]
pub trait PrinterSdk: Send + Sync {
    /// Start a discovery session; devices are reported through `on_device`
    fn start_discovery(&self, filter: PortType, on_device: DiscoveryCallback) -> Outcome;

    /// Stop the running discovery session
    fn stop_discovery(&self) -> Outcome;

    /// Construct a printer handle for a series and language
    fn create_handle(
        &self,
        series: PrinterSeries,
        language: PrinterLanguage,
    ) -> std::result::Result<Box<dyn PrinterHandle>, VendorStatus>;

    /// Serial number of an attached USB device, when the host can tell
    fn usb_serial_number(&self, _address: &str) -> Option<String> {
        None
    }

    /// Run the host pairing flow for a bluetooth printer
    async fn pair_bluetooth(&self) -> BluetoothStatus {
        BluetoothStatus::ErrorUnsupported
    }
}

/// One printer's connection and command buffer
#[async_trait]
pub trait PrinterHandle: Send + Sync {
    /// Open the link to `target`
    async fn connect(&mut self, target: &str, timeout: Duration) -> Outcome;

    /// Close the link
    async fn disconnect(&mut self) -> Outcome;

    /// Append an instruction to the command buffer
    fn add(&mut self, instruction: &Instruction) -> Outcome;

    fn clear_command_buffer(&mut self) -> Outcome;

    fn begin_transaction(&mut self) -> Outcome;

    fn end_transaction(&mut self) -> Outcome;

    /// Transmit the command buffer
    async fn send_data(&mut self, timeout: Duration) -> Outcome;

    /// Transmit bytes outside the command buffer
    async fn send_raw(&mut self, data: &[u8]) -> Outcome;

    /// Attach or detach the status listener
    fn set_status_listener(&mut self, listener: Option<StatusListener>);
}

/// Convert a transport result into the vendor outcome
pub(crate) fn outcome(operation: &str, result: Result<()>) -> Outcome {
    match result {
        Ok(()) => Outcome::Ok,
        Err(e) => {
            let status = e.status();
            debug!(operation, error = %e, %status, "Transport call failed");
            Outcome::from_status(status)
        }
    }
}
