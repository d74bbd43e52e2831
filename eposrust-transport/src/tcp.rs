//! Raw ESC/POS over TCP
//!
//! [`NetworkSdk`] discovers printers by probing a candidate host list on the
//! raw print port. [`NetworkHandle`] keeps the command buffer as encoded
//! bytes and writes it to the socket on send.

use std::time::Duration;

use async_trait::async_trait;
use bytes::BytesMut;
use eposrust_core::constants::RAW_PRINT_PORT;
use eposrust_core::{Instruction, Outcome, StatusEvent, VendorStatus};
use eposrust_types::{DeviceDescriptor, PortType, PrinterLanguage, PrinterSeries, TargetKind};
use parking_lot::Mutex;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::timeout;
use tracing::{debug, info, trace, warn};

use crate::escpos::{self, EscPosEncoder, MODEL_NAME_REQUEST, STATUS_REQUESTS};
use crate::{DiscoveryCallback, PrinterHandle, PrinterSdk, StatusListener, error::*, outcome};

/// Timeout for each real-time status reply
const STATUS_REPLY_TIMEOUT: Duration = Duration::from_millis(500);

/// Write timeout for raw passthrough data
const RAW_WRITE_TIMEOUT: Duration = Duration::from_millis(5000);

/// Split a `TCP:` target into host and port
pub fn parse_target(target: &str) -> Result<(String, u16)> {
    match TargetKind::of(target) {
        TargetKind::Tcp => {}
        TargetKind::TcpSecure | TargetKind::Bluetooth | TargetKind::Usb => {
            return Err(Error::Unsupported(target.to_owned()));
        }
        TargetKind::Unknown => return Err(Error::InvalidAddress(target.to_owned())),
    }

    let rest = &target[TargetKind::TCP_PREFIX.len()..];
    split_host_port(rest).ok_or_else(|| Error::InvalidAddress(target.to_owned()))
}

/// `host`, `host:port`, `[v6]` or `[v6]:port`
fn split_host_port(addr: &str) -> Option<(String, u16)> {
    if addr.is_empty() {
        return None;
    }

    if let Some(v6) = addr.strip_prefix('[') {
        let (host, tail) = v6.split_once(']')?;
        let port = match tail.strip_prefix(':') {
            Some(port) => port.parse().ok()?,
            None if tail.is_empty() => RAW_PRINT_PORT,
            None => return None,
        };
        return Some((host.to_owned(), port));
    }

    match addr.split_once(':') {
        // A bare IPv6 address has more than one colon
        Some((host, port)) if !port.contains(':') => Some((host.to_owned(), port.parse().ok()?)),
        _ => Some((addr.to_owned(), RAW_PRINT_PORT)),
    }
}

/// State of the discovery session
enum DiscoveryState {
    Idle,
    /// Started for a filter without network ports; nothing to probe
    Skipped,
    Probing(JoinHandle<()>),
}

/// Discovery and handle construction for network printers
pub struct NetworkSdk {
    hosts: Vec<String>,
    probe_timeout: Duration,
    discovery: Mutex<DiscoveryState>,
}

impl NetworkSdk {
    /// Create an SDK probing `hosts` (`host` or `host:port`) during discovery
    pub fn new<I, S>(hosts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            hosts: hosts.into_iter().map(Into::into).collect(),
            probe_timeout: Duration::from_millis(1000),
            discovery: Mutex::new(DiscoveryState::Idle),
        }
    }

    /// Set per-host probe timeout
    pub fn with_probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = timeout;
        self
    }

    pub fn hosts(&self) -> &[String] {
        &self.hosts
    }
}

/// Connect to a candidate and ask for its model name
async fn probe(host: String, probe_timeout: Duration) -> Result<DeviceDescriptor> {
    let (addr, port) =
        split_host_port(&host).ok_or_else(|| Error::InvalidAddress(host.clone()))?;

    let mut stream = timeout(probe_timeout, TcpStream::connect((addr.as_str(), port)))
        .await
        .map_err(|_| Error::ConnectionTimeout)??;

    let target = if port == RAW_PRINT_PORT {
        format!("{}{addr}", TargetKind::TCP_PREFIX)
    } else {
        format!("{}{host}", TargetKind::TCP_PREFIX)
    };
    let mut device = DeviceDescriptor::new(target).with_ip(addr);

    stream.write_all(&MODEL_NAME_REQUEST).await?;
    let mut reply = [0u8; 64];
    match timeout(probe_timeout, stream.read(&mut reply)).await {
        Ok(Ok(n)) if n > 0 => {
            trace!(host = %host, reply = %hex::encode(&reply[..n]), "Model name reply");
            if let Some(name) = escpos::parse_model_name(&reply[..n]) {
                device = device.with_name(name);
            }
        }
        _ => debug!(host = %host, "No model name reply"),
    }

    let _ = stream.shutdown().await;
    Ok(device)
}

#[async_trait]
impl PrinterSdk for NetworkSdk {
    fn start_discovery(&self, filter: PortType, on_device: DiscoveryCallback) -> Outcome {
        let mut discovery = self.discovery.lock();
        if matches!(&*discovery, DiscoveryState::Probing(task) if !task.is_finished()) {
            return Outcome::Busy;
        }

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            return outcome("start_discovery", Err(Error::NoRuntime));
        };

        if !filter.includes(PortType::Lan) {
            debug!(%filter, "Network discovery skipped for port filter");
            *discovery = DiscoveryState::Skipped;
            return Outcome::Ok;
        }

        let hosts = self.hosts.clone();
        let probe_timeout = self.probe_timeout;
        info!(hosts = hosts.len(), "Starting network discovery");

        *discovery = DiscoveryState::Probing(runtime.spawn(async move {
            let mut probes = JoinSet::new();
            for host in hosts {
                probes.spawn(probe(host, probe_timeout));
            }

            while let Some(joined) = probes.join_next().await {
                match joined {
                    Ok(Ok(device)) => {
                        debug!(%device, "Found printer");
                        on_device(device);
                    }
                    Ok(Err(e)) => trace!(error = %e, "Probe failed"),
                    Err(e) => warn!(error = %e, "Probe task failed"),
                }
            }
        }));

        Outcome::Ok
    }

    fn stop_discovery(&self) -> Outcome {
        match std::mem::replace(&mut *self.discovery.lock(), DiscoveryState::Idle) {
            DiscoveryState::Probing(task) => {
                task.abort();
                Outcome::Ok
            }
            DiscoveryState::Skipped => Outcome::Ok,
            DiscoveryState::Idle => Outcome::Fatal(VendorStatus::Illegal),
        }
    }

    fn create_handle(
        &self,
        series: PrinterSeries,
        language: PrinterLanguage,
    ) -> std::result::Result<Box<dyn PrinterHandle>, VendorStatus> {
        Ok(Box::new(NetworkHandle::new(series, language)))
    }
}

/// One network printer
pub struct NetworkHandle {
    series: PrinterSeries,
    encoder: EscPosEncoder,
    buffer: BytesMut,
    in_transaction: bool,
    stream: Option<TcpStream>,
    peer: Option<String>,
    listener: Option<StatusListener>,
}

impl NetworkHandle {
    pub fn new(series: PrinterSeries, language: PrinterLanguage) -> Self {
        Self {
            series,
            encoder: EscPosEncoder::new(language),
            buffer: BytesMut::new(),
            in_transaction: false,
            stream: None,
            peer: None,
            listener: None,
        }
    }

    pub fn series(&self) -> PrinterSeries {
        self.series
    }

    /// Encoded command buffer
    pub fn buffer(&self) -> &[u8] {
        &self.buffer
    }

    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    async fn open(&mut self, target: &str, connect_timeout: Duration) -> Result<()> {
        if self.is_connected() {
            return Err(Error::AlreadyConnected);
        }

        let (host, port) = parse_target(target)?;
        debug!(host = %host, port, "Connecting...");

        let stream = timeout(connect_timeout, TcpStream::connect((host.as_str(), port)))
            .await
            .map_err(|_| Error::ConnectionTimeout)??;
        stream.set_nodelay(true)?;

        info!(target_addr = target, series = %self.series, "Connected");
        self.stream = Some(stream);
        self.peer = Some(target.to_owned());
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut stream) = self.stream.take() {
            debug!(target_addr = ?self.peer, "Disconnecting...");
            let _ = stream.shutdown().await;
        }
        self.peer = None;
        Ok(())
    }

    async fn write(&mut self, data: &[u8], write_timeout: Duration) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        trace!(
            len = data.len(),
            head = %hex::encode(&data[..data.len().min(32)]),
            "Sending"
        );

        timeout(write_timeout, async {
            stream.write_all(data).await?;
            stream.flush().await
        })
        .await
        .map_err(|_| Error::ConnectionTimeout)??;

        Ok(())
    }

    /// Poll real-time status and hand it to the listener
    async fn poll_status(&mut self) -> Result<()> {
        let Some(listener) = self.listener.clone() else {
            return Ok(());
        };
        let stream = self.stream.as_mut().ok_or(Error::NotConnected)?;

        let mut replies = [0u8; 4];
        for (request, reply) in STATUS_REQUESTS.iter().zip(replies.iter_mut()) {
            stream.write_all(request).await?;
            let mut byte = [0u8; 1];
            let n = timeout(STATUS_REPLY_TIMEOUT, stream.read(&mut byte))
                .await
                .map_err(|_| Error::ConnectionTimeout)??;
            if n == 0 {
                return Err(Error::ConnectionClosed);
            }
            *reply = byte[0];
        }

        listener(StatusEvent::new(escpos::status_flags(replies)));
        Ok(())
    }
}

#[async_trait]
impl PrinterHandle for NetworkHandle {
    async fn connect(&mut self, target: &str, timeout: Duration) -> Outcome {
        let result = self.open(target, timeout).await;
        outcome("connect", result)
    }

    async fn disconnect(&mut self) -> Outcome {
        let result = self.close().await;
        outcome("disconnect", result)
    }

    fn add(&mut self, instruction: &Instruction) -> Outcome {
        let mut encoded = BytesMut::new();
        if let Err(e) = self.encoder.encode(instruction, &mut encoded) {
            return outcome(instruction.name(), Err(e));
        }

        if self.buffer.is_empty() {
            self.encoder.prologue(&mut self.buffer);
        }
        self.buffer.extend_from_slice(&encoded);
        Outcome::Ok
    }

    fn clear_command_buffer(&mut self) -> Outcome {
        self.buffer.clear();
        self.in_transaction = false;
        Outcome::Ok
    }

    fn begin_transaction(&mut self) -> Outcome {
        if self.in_transaction {
            return Outcome::Fatal(VendorStatus::Illegal);
        }
        self.in_transaction = true;
        Outcome::Ok
    }

    fn end_transaction(&mut self) -> Outcome {
        if !self.in_transaction {
            return Outcome::Fatal(VendorStatus::Illegal);
        }
        self.in_transaction = false;
        Outcome::Ok
    }

    async fn send_data(&mut self, timeout: Duration) -> Outcome {
        if !self.is_connected() {
            return outcome("send_data", Err(Error::NotConnected));
        }
        if self.buffer.is_empty() {
            return Outcome::Ok;
        }

        let data = self.buffer.clone().freeze();
        if let Err(e) = self.write(&data, timeout).await {
            return outcome("send_data", Err(e));
        }

        if let Err(e) = self.poll_status().await {
            debug!(error = %e, "Status poll failed");
        }
        Outcome::Ok
    }

    async fn send_raw(&mut self, data: &[u8]) -> Outcome {
        let result = self.write(data, RAW_WRITE_TIMEOUT).await;
        outcome("send_raw", result)
    }

    fn set_status_listener(&mut self, listener: Option<StatusListener>) {
        self.listener = listener;
    }
}

impl Drop for NetworkHandle {
    fn drop(&mut self) {
        if self.is_connected() {
            warn!(target_addr = ?self.peer, "Printer handle dropped while still connected");
        }
    }
}
