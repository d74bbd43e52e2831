//! Scripted vendor SDK for tests
//!
//! Outcomes are queued per operation; an empty queue answers `Ok`. Every
//! call is counted so tests can assert exactly which vendor I/O happened.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eposrust_core::{BluetoothStatus, Instruction, Outcome, VendorStatus};
use eposrust_transport::{DiscoveryCallback, PrinterHandle, PrinterSdk, StatusListener};
use eposrust_types::{DeviceDescriptor, PortType, PrinterLanguage, PrinterSeries};
use parking_lot::Mutex;

/// Vendor call counters
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Calls {
    pub start_discovery: usize,
    pub stop_discovery: usize,
    pub create_handle: usize,
    pub connect: usize,
    pub disconnect: usize,
    pub add: usize,
    pub clear: usize,
    pub begin_transaction: usize,
    pub end_transaction: usize,
    pub send_data: usize,
    pub send_raw: usize,
}

#[derive(Default)]
struct Script {
    devices: Vec<DeviceDescriptor>,
    usb_serials: HashMap<String, String>,
    create_failure: Option<VendorStatus>,
    connect: VecDeque<Outcome>,
    disconnect: VecDeque<Outcome>,
    add_failures: HashMap<&'static str, VendorStatus>,
    begin_transaction: VecDeque<Outcome>,
    end_transaction: VecDeque<Outcome>,
    send_data: VecDeque<Outcome>,
    pairing: Option<BluetoothStatus>,
    discovering: bool,

    calls: Calls,
    last_connect: Option<(String, Duration)>,
    handle: Option<(PrinterSeries, PrinterLanguage)>,
    buffer: Vec<Instruction>,
    sent: Vec<Vec<Instruction>>,
    raw: Vec<Vec<u8>>,
    listener: Option<StatusListener>,
}

#[derive(Clone, Default)]
pub struct FakeSdk {
    script: Arc<Mutex<Script>>,
}

impl FakeSdk {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_devices(self, devices: Vec<DeviceDescriptor>) -> Self {
        self.script.lock().devices = devices;
        self
    }

    pub fn set_usb_serial(&self, address: &str, serial: &str) {
        self.script
            .lock()
            .usb_serials
            .insert(address.to_owned(), serial.to_owned());
    }

    pub fn fail_create(&self, status: VendorStatus) {
        self.script.lock().create_failure = Some(status);
    }

    pub fn script_connect(&self, outcomes: impl IntoIterator<Item = Outcome>) {
        self.script.lock().connect.extend(outcomes);
    }

    pub fn script_disconnect(&self, outcomes: impl IntoIterator<Item = Outcome>) {
        self.script.lock().disconnect.extend(outcomes);
    }

    /// Fail every `add` of the named instruction with `status`
    pub fn fail_add(&self, name: &'static str, status: VendorStatus) {
        self.script.lock().add_failures.insert(name, status);
    }

    pub fn script_begin_transaction(&self, outcomes: impl IntoIterator<Item = Outcome>) {
        self.script.lock().begin_transaction.extend(outcomes);
    }

    pub fn script_end_transaction(&self, outcomes: impl IntoIterator<Item = Outcome>) {
        self.script.lock().end_transaction.extend(outcomes);
    }

    pub fn script_send_data(&self, outcomes: impl IntoIterator<Item = Outcome>) {
        self.script.lock().send_data.extend(outcomes);
    }

    pub fn set_pairing(&self, status: BluetoothStatus) {
        self.script.lock().pairing = Some(status);
    }

    pub fn calls(&self) -> Calls {
        self.script.lock().calls
    }

    pub fn last_connect(&self) -> Option<(String, Duration)> {
        self.script.lock().last_connect.clone()
    }

    /// Series and language of the last constructed handle
    pub fn handle(&self) -> Option<(PrinterSeries, PrinterLanguage)> {
        self.script.lock().handle
    }

    /// Current command buffer
    pub fn buffer(&self) -> Vec<Instruction> {
        self.script.lock().buffer.clone()
    }

    /// Buffers transmitted by `send_data`
    pub fn sent(&self) -> Vec<Vec<Instruction>> {
        self.script.lock().sent.clone()
    }

    pub fn raw(&self) -> Vec<Vec<u8>> {
        self.script.lock().raw.clone()
    }

    pub fn listener_attached(&self) -> bool {
        self.script.lock().listener.is_some()
    }

    /// Deliver a status event to the attached listener
    pub fn emit_status(&self, event: eposrust_core::StatusEvent) {
        let listener = self.script.lock().listener.clone();
        if let Some(listener) = listener {
            listener(event);
        }
    }
}

fn next(queue: &mut VecDeque<Outcome>) -> Outcome {
    queue.pop_front().unwrap_or(Outcome::Ok)
}

#[async_trait]
impl PrinterSdk for FakeSdk {
    fn start_discovery(&self, _filter: PortType, on_device: DiscoveryCallback) -> Outcome {
        let devices = {
            let mut script = self.script.lock();
            script.calls.start_discovery += 1;
            script.discovering = true;
            script.devices.clone()
        };

        // Callbacks may call back into the SDK
        for device in devices {
            on_device(device);
        }
        Outcome::Ok
    }

    fn stop_discovery(&self) -> Outcome {
        let mut script = self.script.lock();
        script.calls.stop_discovery += 1;
        if std::mem::take(&mut script.discovering) {
            Outcome::Ok
        } else {
            Outcome::Fatal(VendorStatus::Illegal)
        }
    }

    fn create_handle(
        &self,
        series: PrinterSeries,
        language: PrinterLanguage,
    ) -> Result<Box<dyn PrinterHandle>, VendorStatus> {
        let mut script = self.script.lock();
        script.calls.create_handle += 1;
        if let Some(status) = script.create_failure {
            return Err(status);
        }
        script.handle = Some((series, language));
        script.buffer.clear();

        Ok(Box::new(FakeHandle {
            script: Arc::clone(&self.script),
        }))
    }

    fn usb_serial_number(&self, address: &str) -> Option<String> {
        self.script.lock().usb_serials.get(address).cloned()
    }

    async fn pair_bluetooth(&self) -> BluetoothStatus {
        self.script
            .lock()
            .pairing
            .unwrap_or(BluetoothStatus::ErrorUnsupported)
    }
}

struct FakeHandle {
    script: Arc<Mutex<Script>>,
}

#[async_trait]
impl PrinterHandle for FakeHandle {
    async fn connect(&mut self, target: &str, timeout: Duration) -> Outcome {
        let mut script = self.script.lock();
        script.calls.connect += 1;
        script.last_connect = Some((target.to_owned(), timeout));
        next(&mut script.connect)
    }

    async fn disconnect(&mut self) -> Outcome {
        let mut script = self.script.lock();
        script.calls.disconnect += 1;
        next(&mut script.disconnect)
    }

    fn add(&mut self, instruction: &Instruction) -> Outcome {
        let mut script = self.script.lock();
        script.calls.add += 1;
        if let Some(status) = script.add_failures.get(instruction.name()) {
            return Outcome::from_status(*status);
        }
        script.buffer.push(instruction.clone());
        Outcome::Ok
    }

    fn clear_command_buffer(&mut self) -> Outcome {
        let mut script = self.script.lock();
        script.calls.clear += 1;
        script.buffer.clear();
        Outcome::Ok
    }

    fn begin_transaction(&mut self) -> Outcome {
        let mut script = self.script.lock();
        script.calls.begin_transaction += 1;
        next(&mut script.begin_transaction)
    }

    fn end_transaction(&mut self) -> Outcome {
        let mut script = self.script.lock();
        script.calls.end_transaction += 1;
        next(&mut script.end_transaction)
    }

    async fn send_data(&mut self, _timeout: Duration) -> Outcome {
        let mut script = self.script.lock();
        script.calls.send_data += 1;
        let outcome = next(&mut script.send_data);
        if outcome.is_ok() {
            let job = script.buffer.clone();
            script.sent.push(job);
        }
        outcome
    }

    async fn send_raw(&mut self, data: &[u8]) -> Outcome {
        let mut script = self.script.lock();
        script.calls.send_raw += 1;
        script.raw.push(data.to_vec());
        Outcome::Ok
    }

    fn set_status_listener(&mut self, listener: Option<StatusListener>) {
        self.script.lock().listener = listener;
    }
}
