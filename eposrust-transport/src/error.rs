//! Transport errors

use std::io;

use eposrust_core::VendorStatus;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Not connected")]
    NotConnected,

    #[error("Already connected")]
    AlreadyConnected,

    #[error("Connection timeout")]
    ConnectionTimeout,

    #[error("Connection closed by remote")]
    ConnectionClosed,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    #[error("Unsupported target: {0}")]
    Unsupported(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("No async runtime available")]
    NoRuntime,
}

impl Error {
    /// Vendor status reported for this error
    pub fn status(&self) -> VendorStatus {
        match self {
            Self::NotConnected | Self::ConnectionClosed => VendorStatus::Disconnect,
            Self::AlreadyConnected => VendorStatus::AlreadyOpened,
            Self::ConnectionTimeout => VendorStatus::Timeout,
            Self::Io(e) if e.kind() == io::ErrorKind::TimedOut => VendorStatus::Timeout,
            Self::Io(_) => VendorStatus::Connect,
            Self::InvalidAddress(_) | Self::InvalidParameter(_) => VendorStatus::Param,
            Self::Unsupported(_) => VendorStatus::Unsupported,
            Self::NoRuntime => VendorStatus::Illegal,
        }
    }
}
