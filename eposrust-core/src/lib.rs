//! # eposrust-core
//!
//! Orchestration primitives for ESC/POS thermal printers.
//!
//! This crate performs no I/O. It provides:
//! - The stable error taxonomy and vendor status codes
//! - Print instruction definitions
//! - Session state for a printer handle
//! - Discovery result merging
//! - Retry policy
//! - Image rasterization

pub mod command;
pub mod constants;
pub mod error;
pub mod merge;
pub mod raster;
pub mod retry;
pub mod session;
pub mod status;

pub use command::Instruction;
pub use error::{Error, ErrorCode, Result};
pub use merge::merge_devices;
pub use raster::{Halftone, Raster};
pub use retry::{Backoff, RetryPolicy};
pub use session::{Session, SessionState};
pub use status::{BluetoothStatus, Outcome, StatusEvent, StatusFlags, VendorStatus};
