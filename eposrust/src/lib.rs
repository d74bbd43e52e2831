//! # eposrust
//!
//! Session orchestration for Epson ePOS thermal printers.
//!
//! ## Features
//!
//! - Bounded discovery with duplicate merging
//! - One printer session per [`Printer`]: setup, connect, disconnect
//! - Command buffer with clear-on-failure semantics
//! - Raw ESC/POS passthrough and cash drawer kick
//! - Pluggable vendor boundary ([`PrinterSdk`]), with a native TCP backend
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use eposrust::{PortType, Printer};
//! use eposrust_transport::NetworkSdk;
//!
//! #[tokio::main]
//! async fn main() -> eposrust::Result<()> {
//!     let printer = Printer::new(Arc::new(NetworkSdk::new(["192.168.1.50"])));
//!
//!     for device in printer.discover_printers(PortType::Lan).await? {
//!         println!("{device}");
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod bluetooth;
pub mod config;
pub mod discovery;
pub mod error;
pub mod printer;

#[cfg(test)]
mod fake;

// Re-exports
pub use bluetooth::BluetoothResponse;
pub use config::PrinterConfig;
pub use discovery::Discovery;
pub use error::{Error, Result};
pub use printer::Printer;

pub use eposrust_core::command::{
    Barcode, BarcodeType, CutType, DrawerPin, Hri, PulseTime, QrCode, QrLevel, QrModel, TextStyle,
};
pub use eposrust_core::{ErrorCode, Halftone, Instruction, RetryPolicy, StatusEvent, StatusFlags};
pub use eposrust_transport::{PrinterHandle, PrinterSdk};
pub use eposrust_types::{Align, DeviceDescriptor, PortType, PrinterLanguage, PrinterSeries};
