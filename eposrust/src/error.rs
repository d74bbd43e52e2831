//! High-level error types

use eposrust_core::ErrorCode;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{0}")]
    Core(#[from] eposrust_core::Error),

    #[error("Type error: {0}")]
    Types(#[from] eposrust_types::Error),
}

impl Error {
    /// Stable identifier surfaced to callers
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::Core(e) => e.code(),
            Self::Types(_) => ErrorCode::SetupPrinter,
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_busy())
    }

    /// Check if a retry might succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Core(e) if e.is_recoverable())
    }

    /// Core error, if this is one
    pub fn as_core(&self) -> Option<&eposrust_core::Error> {
        match self {
            Self::Core(e) => Some(e),
            Self::Types(_) => None,
        }
    }
}
