//! Type definitions for eposrust

pub mod device_info;
pub mod error;
pub mod printer;

pub use device_info::{DeviceDescriptor, TargetKind};
pub use error::{Error, Result};
pub use printer::{Align, PortType, PrinterLanguage, PrinterSeries};
