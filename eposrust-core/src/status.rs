//! Vendor status codes and the uniform call outcome
//!
//! Every vendor call reports one of the codes below. Instead of comparing
//! codes at each call site, transports return an [`Outcome`]: success, the
//! transient busy state, or a fatal status.

use std::fmt;

use bitflags::bitflags;
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::error::{Error, ErrorCode, Result};

/// Result codes reported by the vendor SDK
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum VendorStatus {
    Success = 0,
    Param = 1,
    Connect = 2,
    Timeout = 3,
    Memory = 4,
    Illegal = 5,
    Processing = 6,
    NotFound = 7,
    InUse = 8,
    TypeInvalid = 9,
    Disconnect = 10,
    AlreadyOpened = 11,
    AlreadyUsed = 12,
    BoxCountOver = 13,
    BoxClientOver = 14,
    Unsupported = 15,
    Failure = 255,
}

impl VendorStatus {
    /// Get status name
    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::Param => "ERR_PARAM",
            Self::Connect => "ERR_CONNECT",
            Self::Timeout => "ERR_TIMEOUT",
            Self::Memory => "ERR_MEMORY",
            Self::Illegal => "ERR_ILLEGAL",
            Self::Processing => "ERR_PROCESSING",
            Self::NotFound => "ERR_NOT_FOUND",
            Self::InUse => "ERR_IN_USE",
            Self::TypeInvalid => "ERR_TYPE_INVALID",
            Self::Disconnect => "ERR_DISCONNECT",
            Self::AlreadyOpened => "ERR_ALREADY_OPENED",
            Self::AlreadyUsed => "ERR_ALREADY_USED",
            Self::BoxCountOver => "ERR_BOX_COUNT_OVER",
            Self::BoxClientOver => "ERR_BOX_CLIENT_OVER",
            Self::Unsupported => "ERR_UNSUPPORTED",
            Self::Failure => "ERR_FAILURE",
        }
    }

    /// Map a raw vendor code; unknown codes collapse to `ERR_FAILURE`
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::Param,
            2 => Self::Connect,
            3 => Self::Timeout,
            4 => Self::Memory,
            5 => Self::Illegal,
            6 => Self::Processing,
            7 => Self::NotFound,
            8 => Self::InUse,
            9 => Self::TypeInvalid,
            10 => Self::Disconnect,
            11 => Self::AlreadyOpened,
            12 => Self::AlreadyUsed,
            13 => Self::BoxCountOver,
            14 => Self::BoxClientOver,
            15 => Self::Unsupported,
            _ => Self::Failure,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

impl fmt::Display for VendorStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Outcome of a single vendor call
#[must_use]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Call succeeded
    Ok,

    /// Printer is mid-operation; the call may be retried
    Busy,

    /// Call failed with a terminal status
    Fatal(VendorStatus),
}

impl Outcome {
    pub fn from_status(status: VendorStatus) -> Self {
        match status {
            VendorStatus::Success => Self::Ok,
            VendorStatus::Processing => Self::Busy,
            other => Self::Fatal(other),
        }
    }

    /// Vendor status equivalent of this outcome
    pub fn status(self) -> VendorStatus {
        match self {
            Self::Ok => VendorStatus::Success,
            Self::Busy => VendorStatus::Processing,
            Self::Fatal(status) => status,
        }
    }

    pub fn is_ok(self) -> bool {
        matches!(self, Self::Ok)
    }

    pub fn is_busy(self) -> bool {
        matches!(self, Self::Busy)
    }

    /// Convert into a `Result`, tagging failures with the operation's code
    pub fn into_result(self, code: ErrorCode) -> Result<()> {
        match self {
            Self::Ok => Ok(()),
            other => Err(Error::Command {
                code,
                status: other.status(),
            }),
        }
    }
}

impl From<VendorStatus> for Outcome {
    fn from(status: VendorStatus) -> Self {
        Self::from_status(status)
    }
}

bitflags! {
    /// Printer state reported through the receive listener
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct StatusFlags: u32 {
        const ONLINE = 1;
        const COVER_OPEN = 1 << 1;
        const PAPER_NEAR_END = 1 << 2;
        const PAPER_EMPTY = 1 << 3;
        const PAPER_FEED = 1 << 4;
        const PANEL_SWITCH = 1 << 5;
        const DRAWER_OPEN = 1 << 6;
        /// Auto-recoverable error (head overheat and similar)
        const AUTO_RECOVER_ERROR = 1 << 7;
        const MECHANICAL_ERROR = 1 << 8;
        const AUTOCUTTER_ERROR = 1 << 9;
        const UNRECOVER_ERROR = 1 << 10;
        const BATTERY_LOW = 1 << 11;
    }
}

impl StatusFlags {
    /// Flags that indicate the printer cannot print right now
    pub const ERRORS: StatusFlags = StatusFlags::COVER_OPEN
        .union(StatusFlags::PAPER_EMPTY)
        .union(StatusFlags::AUTO_RECOVER_ERROR)
        .union(StatusFlags::MECHANICAL_ERROR)
        .union(StatusFlags::AUTOCUTTER_ERROR)
        .union(StatusFlags::UNRECOVER_ERROR);

    pub fn has_error(self) -> bool {
        self.intersects(Self::ERRORS) || !self.contains(Self::ONLINE)
    }
}

/// Asynchronous printer status notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusEvent {
    pub flags: StatusFlags,
    pub received_at: DateTime<Utc>,
}

impl StatusEvent {
    pub fn new(flags: StatusFlags) -> Self {
        Self {
            flags,
            received_at: Utc::now(),
        }
    }

    /// Log the event; status events never drive control flow
    pub fn log(&self, target: &str) {
        if self.flags.has_error() {
            warn!(
                target_addr = target,
                flags = ?self.flags,
                at = %self.received_at,
                "Printer reported an error status"
            );
        } else {
            debug!(target_addr = target, flags = ?self.flags, "Printer status");
        }
    }
}

/// Result of a bluetooth pairing request
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum BluetoothStatus {
    Success = 0,
    ErrorParam = 1,
    ErrorUnsupported = 2,
    ErrorCancel = 3,
    ErrorAlreadyConnect = 4,
    ErrorIllegalDevice = 5,
    ErrorFailure = 255,
    ErrorUnknown = -1,
}

impl BluetoothStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            0 => Self::Success,
            1 => Self::ErrorParam,
            2 => Self::ErrorUnsupported,
            3 => Self::ErrorCancel,
            4 => Self::ErrorAlreadyConnect,
            5 => Self::ErrorIllegalDevice,
            255 => Self::ErrorFailure,
            _ => Self::ErrorUnknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Success => "BLUETOOTH_SUCCESS",
            Self::ErrorParam => "BLUETOOTH_ERROR_PARAM",
            Self::ErrorUnsupported => "BLUETOOTH_ERROR_UNSUPPORTED",
            Self::ErrorCancel => "BLUETOOTH_ERROR_CANCEL",
            Self::ErrorAlreadyConnect => "BLUETOOTH_ERROR_ALREADY_CONNECT",
            Self::ErrorIllegalDevice => "BLUETOOTH_ERROR_ILLEGAL_DEVICE",
            Self::ErrorFailure => "BLUETOOTH_ERROR_FAILURE",
            Self::ErrorUnknown => "BLUETOOTH_ERROR_UNKNOWN",
        }
    }

    /// Human-readable reason shown to operators
    pub fn reason(self) -> &'static str {
        match self {
            Self::ErrorAlreadyConnect => "The function was executed successfully",
            Self::ErrorCancel => "Pairing connection was canceled.",
            Self::ErrorFailure => "An unknown error occurred.",
            Self::ErrorIllegalDevice => "An invalid device was selected.",
            Self::ErrorParam => "An invalid parameter was passed.",
            Self::ErrorUnknown => "An unexpected error ocurred.",
            Self::Success => "The function was executed successfully.",
            Self::ErrorUnsupported => "The function was executed on an unsupported OS.",
        }
    }

    /// Pairing is usable (newly paired or already paired)
    pub fn is_paired(self) -> bool {
        matches!(self, Self::Success | Self::ErrorAlreadyConnect)
    }
}

impl fmt::Display for BluetoothStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
