//! Bluetooth pairing

use std::fmt;

use eposrust_core::BluetoothStatus;
use eposrust_transport::PrinterSdk;
use tracing::{info, warn};

use crate::error::Result;

/// Outcome of a successful pairing request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BluetoothResponse {
    pub status: BluetoothStatus,
    pub reason: &'static str,
}

impl From<BluetoothStatus> for BluetoothResponse {
    fn from(status: BluetoothStatus) -> Self {
        Self {
            status,
            reason: status.reason(),
        }
    }
}

impl fmt::Display for BluetoothResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.status, self.reason)
    }
}

/// Run the host pairing flow
///
/// Newly paired and already paired printers resolve; anything else is an
/// error carrying the vendor status.
pub async fn pair(sdk: &dyn PrinterSdk) -> Result<BluetoothResponse> {
    let status = sdk.pair_bluetooth().await;

    if status.is_paired() {
        info!(%status, "Bluetooth printer paired");
        Ok(status.into())
    } else {
        warn!(%status, reason = status.reason(), "Bluetooth pairing failed");
        Err(eposrust_core::Error::Bluetooth { status }.into())
    }
}

#[cfg(test)]
mod tests {
    use eposrust_core::ErrorCode;

    use super::*;
    use crate::fake::FakeSdk;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_already_paired_resolves() {
        let sdk = FakeSdk::new();
        sdk.set_pairing(BluetoothStatus::ErrorAlreadyConnect);

        let response = pair(&sdk).await.unwrap();
        assert_eq!(response.status, BluetoothStatus::ErrorAlreadyConnect);
        assert_eq!(response.reason, "The function was executed successfully");
    }

    #[tokio::test]
    async fn test_unsupported_rejects() {
        let sdk = FakeSdk::new();
        let err = pair(&sdk).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::StartBluetooth);
        assert_eq!(
            err.to_string(),
            "Bluetooth pairing failed (BLUETOOTH_ERROR_UNSUPPORTED): The function was executed on an unsupported OS."
        );
    }

    #[tokio::test]
    async fn test_cancel_rejects() {
        let sdk = FakeSdk::new();
        sdk.set_pairing(BluetoothStatus::ErrorCancel);
        let err = pair(&sdk).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ConnectBluetooth);
    }
}
