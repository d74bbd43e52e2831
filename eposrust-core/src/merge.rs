//! Deduplication of discovery results
//!
//! The vendor reports the same printer once per transport it is reachable
//! on. Records sharing a MAC address are collapsed into one, preferring a
//! secure TCP target. Records without a MAC are only collapsed when their
//! targets are identical.

use std::collections::HashMap;

use eposrust_types::DeviceDescriptor;
use tracing::trace;

/// Merge raw discovery results
///
/// Output keeps first-seen order. Merging an already merged list is a no-op.
pub fn merge_devices(devices: Vec<DeviceDescriptor>) -> Vec<DeviceDescriptor> {
    let mut merged: Vec<DeviceDescriptor> = Vec::with_capacity(devices.len());
    let mut by_mac: HashMap<String, usize> = HashMap::new();
    let mut by_target: HashMap<String, usize> = HashMap::new();

    for device in devices {
        let slot = match device.identity() {
            Some(mac) => by_mac.get(mac).copied(),
            None => by_target.get(&device.target).copied(),
        };

        match slot {
            Some(index) => {
                let kept = &mut merged[index];
                trace!(kept = %kept.target, duplicate = %device.target, "Merging duplicate printer");

                if device.is_secure() && !kept.is_secure() {
                    kept.target = device.target.clone();
                }
                kept.fill_missing_from(&device);
            }
            None => {
                let index = merged.len();
                match device.identity() {
                    Some(mac) => {
                        by_mac.insert(mac.to_owned(), index);
                    }
                    None => {
                        by_target.insert(device.target.clone(), index);
                    }
                }
                merged.push(device);
            }
        }
    }

    merged
}
