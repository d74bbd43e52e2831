//! Error types for eposrust-core

use std::fmt;

use crate::status::{BluetoothStatus, VendorStatus};

/// Result type alias for eposrust operations
pub type Result<T> = std::result::Result<T, Error>;

/// Stable error identifiers surfaced to callers
///
/// The string forms are part of the public contract and must not change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConnectPrinter,
    DisconnectPrinter,
    StartDiscovery,
    PrinterNotFound,
    ImageNotValid,
    PrintImage,
    ConnectBluetooth,
    StartBluetooth,
    MissingTarget,
    SetupPrinter,
    CommandAddCut,
    CommandAddFeedLine,
    CommandAddImage,
    CommandAddText,
    CommandAddTextAlign,
    CommandAddTextSize,
    CommandAddTextStyle,
    CommandAddTextSmooth,
    CommandAddPulse,
    CommandAddBarcode,
    CommandAddQrCode,
    CommandAddCommand,
    CommandClearBuffer,
    CommandBeginTransaction,
    CommandEndTransaction,
    CommandSendData,
    CommandConnect,
    CommandDisconnect,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 28] = [
        Self::ConnectPrinter,
        Self::DisconnectPrinter,
        Self::StartDiscovery,
        Self::PrinterNotFound,
        Self::ImageNotValid,
        Self::PrintImage,
        Self::ConnectBluetooth,
        Self::StartBluetooth,
        Self::MissingTarget,
        Self::SetupPrinter,
        Self::CommandAddCut,
        Self::CommandAddFeedLine,
        Self::CommandAddImage,
        Self::CommandAddText,
        Self::CommandAddTextAlign,
        Self::CommandAddTextSize,
        Self::CommandAddTextStyle,
        Self::CommandAddTextSmooth,
        Self::CommandAddPulse,
        Self::CommandAddBarcode,
        Self::CommandAddQrCode,
        Self::CommandAddCommand,
        Self::CommandClearBuffer,
        Self::CommandBeginTransaction,
        Self::CommandEndTransaction,
        Self::CommandSendData,
        Self::CommandConnect,
        Self::CommandDisconnect,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::ConnectPrinter => "ERROR_CONNECT_PRINTER",
            Self::DisconnectPrinter => "ERROR_DISCONNECT_PRINTER",
            Self::StartDiscovery => "ERROR_START_DISCOVERY",
            Self::PrinterNotFound => "ERROR_PRINTER_NOT_FOUND",
            Self::ImageNotValid => "ERROR_IMAGE_NOT_VALID",
            Self::PrintImage => "ERROR_PRINT_IMAGE",
            Self::ConnectBluetooth => "ERROR_CONNECT_BLUETOOTH",
            Self::StartBluetooth => "ERROR_START_BLUETOOTH",
            Self::MissingTarget => "ERROR_MISSING_TARGET",
            Self::SetupPrinter => "ERROR_SETUP_PRINTER",
            Self::CommandAddCut => "ERROR_COMMAND_ADD_CUT",
            Self::CommandAddFeedLine => "ERROR_COMMAND_ADD_FEED_LINE",
            Self::CommandAddImage => "ERROR_COMMAND_ADD_IMAGE",
            Self::CommandAddText => "ERROR_COMMAND_ADD_TEXT",
            Self::CommandAddTextAlign => "ERROR_COMMAND_ADD_TEXT_ALIGN",
            Self::CommandAddTextSize => "ERROR_COMMAND_ADD_TEXT_SIZE",
            Self::CommandAddTextStyle => "ERROR_COMMAND_ADD_TEXT_STYLE",
            Self::CommandAddTextSmooth => "ERROR_COMMAND_ADD_TEXT_SMOOTH",
            Self::CommandAddPulse => "ERROR_COMMAND_ADD_PULSE",
            Self::CommandAddBarcode => "ERROR_COMMAND_ADD_BARCODE",
            Self::CommandAddQrCode => "ERROR_COMMAND_ADD_QRCODE",
            Self::CommandAddCommand => "ERROR_COMMAND_ADD_COMMAND",
            Self::CommandClearBuffer => "ERROR_COMMAND_CLEAR_BUFFER",
            Self::CommandBeginTransaction => "ERROR_COMMAND_BEGIN_TRANSACTION",
            Self::CommandEndTransaction => "ERROR_COMMAND_END_TRANSACTION",
            Self::CommandSendData => "ERROR_COMMAND_SEND_DATA",
            Self::CommandConnect => "ERROR_COMMAND_CONNECT",
            Self::CommandDisconnect => "ERROR_COMMAND_DISCONNECT",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Orchestration errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// No printer handle has been set up
    #[error("Printer not set up - call setup first")]
    PrinterNotFound,

    /// Handle exists but no target is bound
    #[error("No target bound to the printer")]
    MissingTarget,

    /// The vendor rejected a specific operation
    #[error("{code}: vendor returned {status}")]
    Command {
        code: ErrorCode,
        status: VendorStatus,
    },

    /// Handle construction failed (series/language rejected)
    #[error("Printer setup failed: vendor returned {0}")]
    Setup(VendorStatus),

    /// Discovery session could not be started
    #[error("Discovery failed to start: vendor returned {0}")]
    StartDiscovery(VendorStatus),

    /// Image payload could not be decoded or has no area
    #[error("Invalid image: {0}")]
    InvalidImage(String),

    /// Bluetooth pairing did not succeed
    #[error("Bluetooth pairing failed ({status}): {}", .status.reason())]
    Bluetooth {
        status: BluetoothStatus,
    },

    /// Invalid session state
    #[error("Invalid session state: {0}")]
    InvalidSessionState(String),
}

impl Error {
    /// Stable identifier for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::PrinterNotFound | Self::InvalidSessionState(_) => ErrorCode::PrinterNotFound,
            Self::MissingTarget => ErrorCode::MissingTarget,
            Self::Command { code, .. } => *code,
            Self::Setup(_) => ErrorCode::SetupPrinter,
            Self::StartDiscovery(_) => ErrorCode::StartDiscovery,
            Self::InvalidImage(_) => ErrorCode::ImageNotValid,
            Self::Bluetooth {
                status: BluetoothStatus::ErrorUnsupported,
            } => ErrorCode::StartBluetooth,
            Self::Bluetooth { .. } => ErrorCode::ConnectBluetooth,
        }
    }

    /// Vendor status behind this error, if any
    pub fn vendor_status(&self) -> Option<VendorStatus> {
        match self {
            Self::Command { status, .. } | Self::Setup(status) | Self::StartDiscovery(status) => {
                Some(*status)
            }
            _ => None,
        }
    }

    /// Printer reported it is mid-operation
    pub fn is_busy(&self) -> bool {
        self.vendor_status() == Some(VendorStatus::Processing)
    }

    /// Check if error is recoverable (retry might succeed)
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Command {
                status: VendorStatus::Processing
                    | VendorStatus::Timeout
                    | VendorStatus::Connect
                    | VendorStatus::InUse
                    | VendorStatus::Disconnect
                    | VendorStatus::Failure,
                ..
            }
        )
    }

    /// Check if error is a missing handle or target
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::PrinterNotFound | Self::MissingTarget)
    }
}
