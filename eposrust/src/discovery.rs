//! Bounded discovery window
//!
//! A discovery run stops any previous session, starts a new one, collects
//! devices until the window elapses, stops the session and merges the
//! results.

use std::sync::{Arc, Weak};
use std::time::Duration;

use eposrust_core::constants::DEFAULT_DISCOVERY_WINDOW_MS;
use eposrust_core::merge_devices;
use eposrust_transport::PrinterSdk;
use eposrust_types::{DeviceDescriptor, PortType};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::error::Result;

/// Discovery over a vendor SDK
pub struct Discovery {
    sdk: Arc<dyn PrinterSdk>,
    window: Duration,
}

impl Discovery {
    pub fn new(sdk: Arc<dyn PrinterSdk>) -> Self {
        Self {
            sdk,
            window: Duration::from_millis(DEFAULT_DISCOVERY_WINDOW_MS),
        }
    }

    /// Set collection window
    pub fn with_window(mut self, window: Duration) -> Self {
        self.window = window;
        self
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Discover printers and merge duplicates
    pub async fn run(&self, filter: PortType) -> Result<Vec<DeviceDescriptor>> {
        let raw = self.collect(filter).await?;
        let raw_count = raw.len();
        let devices = merge_devices(raw);

        info!(%filter, found = raw_count, unique = devices.len(), "Discovery finished");
        Ok(devices)
    }

    /// Discover printers without merging, in arrival order
    pub async fn collect(&self, filter: PortType) -> Result<Vec<DeviceDescriptor>> {
        // The vendor rejects stop when nothing is running
        let stopped = self.sdk.stop_discovery();
        if !stopped.is_ok() {
            debug!(status = %stopped.status(), "No previous discovery to stop");
        }

        let found: Arc<Mutex<Vec<DeviceDescriptor>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&found);
        let sdk: Weak<dyn PrinterSdk> = Arc::downgrade(&self.sdk);

        let started = self.sdk.start_discovery(
            filter,
            Arc::new(move |mut device: DeviceDescriptor| {
                if let Some(address) = device.usb_address().map(str::to_owned) {
                    device.usb_serial_number =
                        sdk.upgrade().and_then(|sdk| sdk.usb_serial_number(&address));
                    device.usb = Some(address);
                }
                debug!(%device, "Discovered");
                sink.lock().push(device);
            }),
        );

        if !started.is_ok() {
            warn!(%filter, status = %started.status(), "Failed to start discovery");
            return Err(eposrust_core::Error::StartDiscovery(started.status()).into());
        }

        debug!(%filter, window = ?self.window, "Collecting devices");
        tokio::time::sleep(self.window).await;

        let stopped = self.sdk.stop_discovery();
        if !stopped.is_ok() {
            warn!(status = %stopped.status(), "Failed to stop discovery");
        }

        let devices = std::mem::take(&mut *found.lock());
        Ok(devices)
    }
}
