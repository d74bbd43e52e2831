//! Printer session orchestrator

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use eposrust_core::command::{Barcode, CutType, DrawerPin, PulseTime, QrCode, TextStyle};
use eposrust_core::constants::OPEN_DRAWER_SEQUENCE;
use eposrust_core::{ErrorCode, Instruction, Outcome, Raster, RetryPolicy, Session, StatusEvent};
use eposrust_transport::{PrinterHandle, PrinterSdk, StatusListener};
use eposrust_types::{Align, DeviceDescriptor, PortType, PrinterLanguage, PrinterSeries};
use image::DynamicImage;
use tracing::{debug, info, warn};

use crate::bluetooth::{self, BluetoothResponse};
use crate::config::PrinterConfig;
use crate::discovery::Discovery;
use crate::error::Result;

/// One logical printer session
///
/// Owns the vendor handle, the bound target and the connection flag.
/// Buffer operations are applied in call order; a failing buffer operation
/// clears the whole command buffer before the error is returned.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use eposrust::{Printer, PrinterSeries, PrinterLanguage};
/// use eposrust_transport::NetworkSdk;
///
/// #[tokio::main]
/// async fn main() -> eposrust::Result<()> {
///     let mut printer = Printer::new(Arc::new(NetworkSdk::new(["192.168.1.50"])));
///
///     printer
///         .setup("TCP:192.168.1.50", PrinterSeries::TmT88, PrinterLanguage::En)
///         .await?;
///     printer.connect().await?;
///
///     printer.add_text("Hello\n")?;
///     printer.add_cut(Default::default())?;
///     printer.send_data().await?;
///     printer.clear_buffer()?;
///
///     printer.disconnect().await?;
///     Ok(())
/// }
/// ```
pub struct Printer {
    sdk: Arc<dyn PrinterSdk>,
    session: Session<Box<dyn PrinterHandle>>,
    config: PrinterConfig,
    pending: bool,
}

impl Printer {
    pub fn new(sdk: Arc<dyn PrinterSdk>) -> Self {
        Self::with_config(sdk, PrinterConfig::default())
    }

    pub fn with_config(sdk: Arc<dyn PrinterSdk>, config: PrinterConfig) -> Self {
        let mut session = Session::new();
        session.set_timeout(config.connect_timeout);

        Self {
            sdk,
            session,
            config,
            pending: false,
        }
    }

    pub fn config(&self) -> &PrinterConfig {
        &self.config
    }

    /// Set connect timeout in milliseconds
    ///
    /// The value also becomes the discovery window of `discover_printers`.
    pub fn set_timeout(&mut self, millis: u64) {
        let timeout = Duration::from_millis(millis);
        self.config.connect_timeout = timeout;
        self.config.discovery_window = timeout;
        self.session.set_timeout(timeout);
    }

    pub fn timeout(&self) -> Duration {
        self.session.timeout()
    }

    /// Check if a printer handle is set up
    pub fn is_setup(&self) -> bool {
        self.session.is_configured()
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_connected()
    }

    pub fn target(&self) -> Option<&str> {
        self.session.target()
    }

    /// Check if instructions were added since the buffer was last cleared
    pub fn has_pending(&self) -> bool {
        self.pending
    }

    /// Discover printers for the configured window and merge duplicates
    pub async fn discover_printers(&self, filter: PortType) -> Result<Vec<DeviceDescriptor>> {
        Discovery::new(Arc::clone(&self.sdk))
            .with_window(self.config.discovery_window)
            .run(filter)
            .await
    }

    /// Bind a new printer handle to `target`
    ///
    /// An existing handle is released first: disconnected if connected,
    /// buffer cleared, listener detached. On construction failure no handle
    /// remains.
    pub async fn setup(
        &mut self,
        target: &str,
        series: PrinterSeries,
        language: PrinterLanguage,
    ) -> Result<()> {
        let was_connected = self.session.is_connected();
        if let Some(mut old) = self.session.take_handle() {
            debug!("Releasing previous printer handle");
            if was_connected {
                let outcome = old.disconnect().await;
                if !outcome.is_ok() {
                    warn!(status = %outcome.status(), "Failed to disconnect previous printer");
                }
            }
            let cleared = old.clear_command_buffer();
            if !cleared.is_ok() {
                warn!(status = %cleared.status(), "Failed to clear previous command buffer");
            }
            old.set_status_listener(None);
        }
        self.pending = false;

        let mut handle = self.sdk.create_handle(series, language).map_err(|status| {
            warn!(%series, %language, %status, "Failed to create printer handle");
            eposrust_core::Error::Setup(status)
        })?;

        handle.set_status_listener(Some(logging_listener(target)));
        self.session.install(handle, target);

        info!(target_addr = target, %series, %language, "Printer set up");
        Ok(())
    }

    /// [`setup`](Self::setup) from vendor names
    ///
    /// A missing series means `SERIES_TM_T20`; a missing or unknown language
    /// means `LANG_EN`.
    pub async fn setup_by_name(
        &mut self,
        target: &str,
        series: Option<&str>,
        language: Option<&str>,
    ) -> Result<()> {
        let series = match series {
            Some(name) => name.parse()?,
            None => PrinterSeries::default(),
        };
        let language = language
            .map(PrinterLanguage::from_name_or_default)
            .unwrap_or_default();

        self.setup(target, series, language).await
    }

    /// Open the link to the bound target, single attempt
    pub async fn connect(&mut self) -> Result<()> {
        let timeout = self.session.timeout();
        let was_connected = self.session.is_connected();
        let (handle, target) = self.session.connectable()?;

        if was_connected {
            let outcome = handle.disconnect().await;
            if !outcome.is_ok() {
                warn!(status = %outcome.status(), "Failed to disconnect before reconnecting");
            }
        }

        info!(target_addr = %target, ?timeout, "Connecting...");
        let outcome = handle.connect(&target, timeout).await;
        self.session.mark_disconnected();

        if let Err(e) = outcome.into_result(ErrorCode::CommandConnect) {
            warn!(target_addr = %target, error = %e, "Connect failed");
            return Err(e.into());
        }

        self.session.mark_connected()?;
        info!(target_addr = %target, "Connected");
        Ok(())
    }

    /// Connect, retrying recoverable failures per `policy`
    pub async fn connect_with_retry(&mut self, policy: RetryPolicy) -> Result<()> {
        let mut backoff = policy.backoff();

        loop {
            match self.connect().await {
                Ok(()) => return Ok(()),
                Err(e) if e.is_recoverable() => match backoff.next() {
                    Some(delay) => {
                        warn!(error = %e, remaining = backoff.remaining(), ?delay, "Retrying connect");
                        tokio::time::sleep(delay).await;
                    }
                    None => return Err(e),
                },
                Err(e) => return Err(e),
            }
        }
    }

    /// Close the link
    ///
    /// Succeeds without a handle. A busy printer is polled every
    /// `disconnect_interval` up to `max_disconnect_attempts` times; any
    /// failure leaves the connection flag unchanged.
    pub async fn disconnect(&mut self) -> Result<()> {
        let interval = self.config.disconnect_interval;
        let max_attempts = self.config.max_disconnect_attempts.max(1);

        let Ok(handle) = self.session.handle_mut() else {
            debug!("No printer to disconnect");
            return Ok(());
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match handle.disconnect().await {
                Outcome::Ok => break,
                Outcome::Busy if attempt < max_attempts => {
                    debug!(attempt, "Printer busy, retrying disconnect");
                    tokio::time::sleep(interval).await;
                }
                outcome => {
                    warn!(attempt, status = %outcome.status(), "Disconnect failed");
                    return outcome
                        .into_result(ErrorCode::CommandDisconnect)
                        .map_err(Into::into);
                }
            }
        }

        self.session.mark_disconnected();
        info!("Disconnected");
        Ok(())
    }

    /// Append an instruction to the command buffer
    pub fn add(&mut self, instruction: Instruction) -> Result<()> {
        debug!(%instruction, "Adding instruction");
        let code = instruction.error_code();
        self.buffer_op(code, |handle| handle.add(&instruction))?;
        self.pending = true;
        Ok(())
    }

    pub fn add_text(&mut self, text: &str) -> Result<()> {
        self.add(Instruction::Text(text.to_owned()))
    }

    pub fn add_text_align(&mut self, align: Align) -> Result<()> {
        self.add(Instruction::TextAlign(align))
    }

    /// Character magnification, 1..=8 in each direction
    pub fn add_text_size(&mut self, width: u8, height: u8) -> Result<()> {
        self.add(Instruction::TextSize { width, height })
    }

    pub fn add_text_style(&mut self, style: TextStyle) -> Result<()> {
        self.add(Instruction::TextStyle(style))
    }

    pub fn add_text_smooth(&mut self, smooth: bool) -> Result<()> {
        self.add(Instruction::TextSmooth(smooth))
    }

    /// Decode a base64 image and enqueue it fitted to `width x height`
    ///
    /// Decode failures are reported before the buffer is touched.
    pub fn add_image(&mut self, base64: &str, width: u32, height: u32) -> Result<()> {
        self.session.handle_mut()?;
        let raster = Raster::from_base64(base64, width, height, self.config.halftone)?;
        self.add(Instruction::Image(raster))
    }

    /// Enqueue a decoded image fitted to `width x height`
    pub fn add_image_bitmap(&mut self, image: &DynamicImage, width: u32, height: u32) -> Result<()> {
        self.session.handle_mut()?;
        let raster = Raster::from_image(image, width, height, self.config.halftone)?;
        self.add(Instruction::Image(raster))
    }

    pub fn add_feed_line(&mut self, lines: u8) -> Result<()> {
        self.add(Instruction::FeedLine(lines))
    }

    pub fn add_cut(&mut self, cut: CutType) -> Result<()> {
        self.add(Instruction::Cut(cut))
    }

    pub fn add_pulse(&mut self, pin: DrawerPin, time: PulseTime) -> Result<()> {
        self.add(Instruction::Pulse { pin, time })
    }

    pub fn add_barcode(&mut self, barcode: Barcode) -> Result<()> {
        self.add(Instruction::Barcode(barcode))
    }

    pub fn add_qr_code(&mut self, qr: QrCode) -> Result<()> {
        self.add(Instruction::QrCode(qr))
    }

    /// Append raw printer commands to the command buffer
    ///
    /// Unlike [`send_raw_data`](Self::send_raw_data) the bytes keep their
    /// place among buffered instructions.
    pub fn add_command(&mut self, data: &[u8]) -> Result<()> {
        self.add(Instruction::Command(Bytes::copy_from_slice(data)))
    }

    /// Reset the command buffer
    pub fn clear_buffer(&mut self) -> Result<()> {
        let handle = self.session.handle_mut()?;
        handle
            .clear_command_buffer()
            .into_result(ErrorCode::CommandClearBuffer)?;
        self.pending = false;
        Ok(())
    }

    pub fn begin_transaction(&mut self) -> Result<()> {
        self.buffer_op(ErrorCode::CommandBeginTransaction, |handle| {
            handle.begin_transaction()
        })
    }

    pub fn end_transaction(&mut self) -> Result<()> {
        self.buffer_op(ErrorCode::CommandEndTransaction, |handle| {
            handle.end_transaction()
        })
    }

    /// Transmit the command buffer
    ///
    /// The buffer is forwarded as is, even when empty, and is kept after the
    /// send; call [`clear_buffer`](Self::clear_buffer) before the next job.
    pub async fn send_data(&mut self) -> Result<()> {
        let timeout = self.session.timeout();
        let pending = self.pending;
        let handle = self.session.handle_mut()?;

        debug!(pending, "Sending command buffer");
        let outcome = handle.send_data(timeout).await;
        if let Err(e) = outcome.into_result(ErrorCode::CommandSendData) {
            warn!(error = %e, "Send failed");
            return Err(e.into());
        }

        info!("Print job sent");
        Ok(())
    }

    /// Send bytes to the printer without interpretation
    pub async fn send_raw_data(&mut self, data: &[u8]) -> Result<()> {
        let handle = self.session.handle_mut()?;
        debug!(len = data.len(), "Sending raw data");
        handle
            .send_raw(data)
            .await
            .into_result(ErrorCode::CommandSendData)?;
        Ok(())
    }

    /// Kick both drawer pins
    ///
    /// Connects first (with the configured retry) when not connected.
    pub async fn open_cash_drawer(&mut self) -> Result<()> {
        if !self.session.is_connected() {
            self.connect_with_retry(self.config.connect_retry).await?;
        }
        self.clear_buffer()?;
        self.send_raw_data(&OPEN_DRAWER_SEQUENCE).await?;

        info!("Cash drawer opened");
        Ok(())
    }

    /// Run the bluetooth pairing flow
    pub async fn pair_bluetooth_printer(&self) -> Result<BluetoothResponse> {
        bluetooth::pair(self.sdk.as_ref()).await
    }

    /// Run a buffer operation; on failure clear the buffer once and report `code`
    fn buffer_op<F>(&mut self, code: ErrorCode, op: F) -> Result<()>
    where
        F: FnOnce(&mut Box<dyn PrinterHandle>) -> Outcome,
    {
        let handle = self.session.handle_mut()?;

        if let Err(e) = op(handle).into_result(code) {
            warn!(error = %e, "Command failed, clearing buffer");
            let cleared = handle.clear_command_buffer();
            if !cleared.is_ok() {
                warn!(status = %cleared.status(), "Failed to clear command buffer");
            }
            self.pending = false;
            return Err(e.into());
        }

        Ok(())
    }
}

/// Status listener that only logs
fn logging_listener(target: &str) -> StatusListener {
    let target = target.to_owned();
    Arc::new(move |event: StatusEvent| event.log(&target))
}

#[cfg(test)]
mod tests {
    use base64::Engine;
    use base64::engine::general_purpose::STANDARD;
    use eposrust_core::{BluetoothStatus, StatusFlags, VendorStatus};
    use eposrust_transport::MockPrinterSdk;

    use super::*;
    use crate::fake::FakeSdk;
    use pretty_assertions::assert_eq;

    async fn connected_printer(sdk: &FakeSdk) -> Printer {
        let mut printer = Printer::new(Arc::new(sdk.clone()));
        printer
            .setup("TCP:1.2.3.4", PrinterSeries::TmT20, PrinterLanguage::En)
            .await
            .unwrap();
        printer.connect().await.unwrap();
        printer
    }

    #[tokio::test]
    async fn test_setup_then_connect() {
        let sdk = FakeSdk::new();
        let mut printer = Printer::new(Arc::new(sdk.clone()));

        printer
            .setup_by_name("TCP:1.2.3.4", Some("SERIES_TM_T20"), Some("LANG_EN"))
            .await
            .unwrap();
        assert!(printer.is_setup());
        assert!(!printer.is_connected());

        printer.connect().await.unwrap();

        assert!(printer.is_connected());
        assert_eq!(sdk.handle(), Some((PrinterSeries::TmT20, PrinterLanguage::En)));
        assert_eq!(
            sdk.last_connect(),
            Some(("TCP:1.2.3.4".to_owned(), Duration::from_millis(5000)))
        );
    }

    #[tokio::test]
    async fn test_connect_without_setup_does_no_io() {
        // Any vendor call on an expectation-free mock panics
        let sdk = MockPrinterSdk::new();
        let mut printer = Printer::new(Arc::new(sdk));

        let err = printer.connect().await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::PrinterNotFound);
        assert_eq!(err.code().as_str(), "ERROR_PRINTER_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_connect_missing_target() {
        let sdk = FakeSdk::new();
        let mut printer = Printer::new(Arc::new(sdk.clone()));
        printer
            .setup("", PrinterSeries::TmM30, PrinterLanguage::Ja)
            .await
            .unwrap();

        let err = printer.connect().await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::MissingTarget);
        assert_eq!(sdk.calls().connect, 0);
    }

    #[tokio::test]
    async fn test_busy_connect_is_single_attempt() {
        let sdk = FakeSdk::new();
        sdk.script_connect([Outcome::Busy]);
        let mut printer = Printer::new(Arc::new(sdk.clone()));
        printer
            .setup("TCP:1.2.3.4", PrinterSeries::TmT20, PrinterLanguage::En)
            .await
            .unwrap();

        let err = printer.connect().await.unwrap_err();
        assert!(err.is_busy());
        assert_eq!(err.code(), ErrorCode::CommandConnect);
        assert_eq!(sdk.calls().connect, 1);
        assert!(!printer.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_retry_after_busy() {
        let sdk = FakeSdk::new();
        sdk.script_connect([Outcome::Busy, Outcome::Ok]);
        let mut printer = Printer::new(Arc::new(sdk.clone()));
        printer
            .setup("TCP:1.2.3.4", PrinterSeries::TmT20, PrinterLanguage::En)
            .await
            .unwrap();

        printer
            .connect_with_retry(RetryPolicy::new(1, Duration::from_millis(10)))
            .await
            .unwrap();

        assert!(printer.is_connected());
        assert_eq!(sdk.calls().connect, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_retry_gives_up() {
        let sdk = FakeSdk::new();
        sdk.script_connect([Outcome::Fatal(VendorStatus::Timeout); 5]);
        let mut printer = Printer::new(Arc::new(sdk.clone()));
        printer
            .setup("TCP:1.2.3.4", PrinterSeries::TmT20, PrinterLanguage::En)
            .await
            .unwrap();

        let err = printer
            .connect_with_retry(RetryPolicy::new(2, Duration::from_millis(2000)))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::CommandConnect);
        assert_eq!(sdk.calls().connect, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_retry_skips_fatal_param() {
        let sdk = FakeSdk::new();
        sdk.script_connect([Outcome::Fatal(VendorStatus::Param)]);
        let mut printer = Printer::new(Arc::new(sdk.clone()));
        printer
            .setup("TCP:1.2.3.4", PrinterSeries::TmT20, PrinterLanguage::En)
            .await
            .unwrap();

        assert!(printer.connect_with_retry(RetryPolicy::default()).await.is_err());
        assert_eq!(sdk.calls().connect, 1);
    }

    #[tokio::test]
    async fn test_reconnect_disconnects_first() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;

        printer.connect().await.unwrap();

        assert_eq!(sdk.calls().disconnect, 1);
        assert_eq!(sdk.calls().connect, 2);
        assert!(printer.is_connected());
    }

    #[tokio::test]
    async fn test_setup_resets_connection() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;
        printer.add_text("stale").unwrap();

        printer
            .setup("TCP:5.6.7.8", PrinterSeries::TmM30III, PrinterLanguage::Ja)
            .await
            .unwrap();

        assert!(printer.is_setup());
        assert!(!printer.is_connected());
        assert!(!printer.has_pending());
        assert_eq!(printer.target(), Some("TCP:5.6.7.8"));

        let calls = sdk.calls();
        assert_eq!(calls.disconnect, 1);
        assert_eq!(calls.clear, 1);
        assert_eq!(calls.create_handle, 2);
        assert!(sdk.listener_attached());
    }

    #[tokio::test]
    async fn test_failed_setup_leaves_no_handle() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;
        sdk.fail_create(VendorStatus::Param);

        let err = printer
            .setup("TCP:5.6.7.8", PrinterSeries::TmT88, PrinterLanguage::En)
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::SetupPrinter);
        assert!(!printer.is_setup());
        assert!(!printer.is_connected());
        assert!(!sdk.listener_attached());
    }

    #[tokio::test]
    async fn test_setup_by_name_unknown_series() {
        let sdk = FakeSdk::new();
        let mut printer = Printer::new(Arc::new(sdk.clone()));

        let err = printer
            .setup_by_name("TCP:1.2.3.4", Some("SERIES_TM_X"), None)
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::SetupPrinter);
        assert_eq!(sdk.calls().create_handle, 0);

        printer
            .setup_by_name("TCP:1.2.3.4", None, Some("LANG_XX"))
            .await
            .unwrap();
        assert_eq!(sdk.handle(), Some((PrinterSeries::TmT20, PrinterLanguage::En)));
    }

    #[tokio::test]
    async fn test_disconnect_without_handle() {
        let mut printer = Printer::new(Arc::new(MockPrinterSdk::new()));
        printer.disconnect().await.unwrap();
        printer.disconnect().await.unwrap();
        assert!(!printer.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_polls_while_busy() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;
        sdk.script_disconnect([Outcome::Busy, Outcome::Busy, Outcome::Ok]);

        let started = tokio::time::Instant::now();
        printer.disconnect().await.unwrap();

        assert!(!printer.is_connected());
        assert_eq!(sdk.calls().disconnect, 3);
        assert!(started.elapsed() >= Duration::from_millis(1000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_disconnect_gives_up_when_busy() {
        let sdk = FakeSdk::new();
        let config = PrinterConfig::new().with_disconnect_retry(Duration::from_millis(500), 4);
        let mut printer = Printer::with_config(Arc::new(sdk.clone()), config);
        printer
            .setup("TCP:1.2.3.4", PrinterSeries::TmT20, PrinterLanguage::En)
            .await
            .unwrap();
        printer.connect().await.unwrap();
        sdk.script_disconnect([Outcome::Busy; 10]);

        let err = printer.disconnect().await.unwrap_err();

        assert!(err.is_busy());
        assert_eq!(err.code(), ErrorCode::CommandDisconnect);
        assert_eq!(sdk.calls().disconnect, 4);
        assert!(printer.is_connected());
    }

    #[tokio::test]
    async fn test_failed_disconnect_keeps_connected() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;
        sdk.script_disconnect([Outcome::Fatal(VendorStatus::Failure)]);

        let err = printer.disconnect().await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::CommandDisconnect);
        assert!(printer.is_connected());
    }

    #[tokio::test]
    async fn test_add_without_setup() {
        let mut printer = Printer::new(Arc::new(MockPrinterSdk::new()));
        assert_eq!(printer.add_text("hi").unwrap_err().code(), ErrorCode::PrinterNotFound);
        assert_eq!(printer.add_cut(CutType::Feed).unwrap_err().code(), ErrorCode::PrinterNotFound);
        assert_eq!(printer.clear_buffer().unwrap_err().code(), ErrorCode::PrinterNotFound);
        assert_eq!(
            printer.send_data().await.unwrap_err().code(),
            ErrorCode::PrinterNotFound
        );
    }

    #[tokio::test]
    async fn test_failed_add_clears_buffer_once() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;
        sdk.fail_add("addCut", VendorStatus::Param);

        printer.add_text("hi").unwrap();
        assert!(printer.has_pending());

        let err = printer.add_cut(CutType::Feed).unwrap_err();
        assert_eq!(err.code(), ErrorCode::CommandAddCut);
        assert_eq!(err.code().as_str(), "ERROR_COMMAND_ADD_CUT");
        assert_eq!(sdk.calls().clear, 1);
        assert!(sdk.buffer().is_empty());
        assert!(!printer.has_pending());

        // The emptied buffer is still forwarded
        printer.send_data().await.unwrap();
        assert_eq!(sdk.calls().send_data, 1);
        assert_eq!(sdk.sent(), vec![Vec::<Instruction>::new()]);
    }

    #[tokio::test]
    async fn test_every_add_failure_names_operation() {
        let cases = [
            ("addText", ErrorCode::CommandAddText),
            ("addTextAlign", ErrorCode::CommandAddTextAlign),
            ("addTextSize", ErrorCode::CommandAddTextSize),
            ("addTextStyle", ErrorCode::CommandAddTextStyle),
            ("addFeedLine", ErrorCode::CommandAddFeedLine),
            ("addPulse", ErrorCode::CommandAddPulse),
            ("addBarcode", ErrorCode::CommandAddBarcode),
            ("addQrCode", ErrorCode::CommandAddQrCode),
            ("addTextSmooth", ErrorCode::CommandAddTextSmooth),
            ("addCommand", ErrorCode::CommandAddCommand),
        ];

        for (name, code) in cases {
            let sdk = FakeSdk::new();
            let mut printer = connected_printer(&sdk).await;
            sdk.fail_add(name, VendorStatus::Failure);

            let result = match name {
                "addText" => printer.add_text("x"),
                "addTextAlign" => printer.add_text_align(Align::Right),
                "addTextSize" => printer.add_text_size(2, 2),
                "addTextStyle" => printer.add_text_style(TextStyle::default()),
                "addFeedLine" => printer.add_feed_line(2),
                "addPulse" => printer.add_pulse(DrawerPin::Pin2, PulseTime::Ms100),
                "addBarcode" => printer.add_barcode(Barcode::new(
                    "4901234567894",
                    eposrust_core::command::BarcodeType::Ean13,
                )),
                "addQrCode" => printer.add_qr_code(QrCode::new("https://example.com")),
                "addTextSmooth" => printer.add_text_smooth(true),
                _ => printer.add_command(&[0x1b, 0x40]),
            };

            assert_eq!(result.unwrap_err().code(), code);
            assert_eq!(sdk.calls().clear, 1, "{name}");
        }
    }

    #[tokio::test]
    async fn test_transaction_failure_clears_buffer() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;
        sdk.script_end_transaction([Outcome::Fatal(VendorStatus::Illegal)]);

        printer.begin_transaction().unwrap();
        printer.add_text("receipt").unwrap();
        let err = printer.end_transaction().unwrap_err();

        assert_eq!(err.code(), ErrorCode::CommandEndTransaction);
        assert_eq!(sdk.calls().clear, 1);
        assert!(sdk.buffer().is_empty());
    }

    #[tokio::test]
    async fn test_begin_transaction_failure_clears_buffer() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;
        sdk.script_begin_transaction([Outcome::Busy]);

        printer.add_text("header").unwrap();
        let err = printer.begin_transaction().unwrap_err();

        assert_eq!(err.code(), ErrorCode::CommandBeginTransaction);
        assert!(err.is_busy());
        assert_eq!(sdk.calls().begin_transaction, 1);
        assert_eq!(sdk.calls().clear, 1);
        assert!(sdk.buffer().is_empty());
        assert!(!printer.has_pending());
    }

    #[tokio::test]
    async fn test_command_keeps_buffer_order() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;

        printer.add_text("A").unwrap();
        printer.add_command(&[0x1b, 0x45, 0x01]).unwrap();
        printer.add_text_smooth(true).unwrap();
        printer.add_text("B").unwrap();

        assert_eq!(
            sdk.buffer(),
            vec![
                Instruction::Text("A".into()),
                Instruction::Command(Bytes::from_static(&[0x1b, 0x45, 0x01])),
                Instruction::TextSmooth(true),
                Instruction::Text("B".into()),
            ]
        );
        assert!(sdk.raw().is_empty());
    }

    #[tokio::test]
    async fn test_send_failure_keeps_buffer() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;
        sdk.script_send_data([Outcome::Fatal(VendorStatus::Timeout)]);

        printer.add_text("receipt").unwrap();
        let err = printer.send_data().await.unwrap_err();

        assert_eq!(err.code(), ErrorCode::CommandSendData);
        assert!(err.is_recoverable());
        assert_eq!(sdk.calls().clear, 0);
        assert_eq!(sdk.buffer().len(), 1);
    }

    #[tokio::test]
    async fn test_buffer_order_preserved() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;

        printer.add_text_align(Align::Center).unwrap();
        printer.add_text_size(2, 2).unwrap();
        printer.add_text("TOTAL\n").unwrap();
        printer.add_feed_line(3).unwrap();
        printer.add_cut(CutType::Feed).unwrap();
        printer.send_data().await.unwrap();

        assert_eq!(
            sdk.sent(),
            vec![vec![
                Instruction::TextAlign(Align::Center),
                Instruction::TextSize { width: 2, height: 2 },
                Instruction::Text("TOTAL\n".into()),
                Instruction::FeedLine(3),
                Instruction::Cut(CutType::Feed),
            ]]
        );

        printer.clear_buffer().unwrap();
        assert!(!printer.has_pending());
        assert!(sdk.buffer().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_image_touches_nothing() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;
        let before = sdk.calls();

        let err = printer.add_image("definitely not an image", 200, 100).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ImageNotValid);

        let not_png = STANDARD.encode(b"GIF89a but not really");
        let err = printer.add_image(&not_png, 200, 100).unwrap_err();
        assert_eq!(err.code(), ErrorCode::ImageNotValid);

        assert_eq!(sdk.calls(), before);
    }

    #[tokio::test]
    async fn test_add_image_bitmap_fits_box() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;
        let image = DynamicImage::new_luma8(300, 120);

        printer.add_image_bitmap(&image, 200, 100).unwrap();

        match sdk.buffer().as_slice() {
            [Instruction::Image(raster)] => {
                assert_eq!((raster.width(), raster.height()), (200, 100));
            }
            other => panic!("unexpected buffer: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_raw_data() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;

        printer.send_raw_data(&[0x1b, 0x40]).await.unwrap();
        assert_eq!(sdk.raw(), vec![vec![0x1b, 0x40]]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_open_cash_drawer_connects_first() {
        let sdk = FakeSdk::new();
        sdk.script_connect([Outcome::Fatal(VendorStatus::Connect), Outcome::Ok]);
        let mut printer = Printer::new(Arc::new(sdk.clone()));
        printer
            .setup("TCP:1.2.3.4", PrinterSeries::TmT20, PrinterLanguage::En)
            .await
            .unwrap();

        printer.open_cash_drawer().await.unwrap();

        let calls = sdk.calls();
        assert_eq!(calls.connect, 2);
        assert_eq!(calls.clear, 1);
        assert_eq!(
            sdk.raw(),
            vec![vec![
                0x1b, 0x40, 0x1b, 0x70, 0x00, 0x19, 0xfa, 0x1b, 0x70, 0x01, 0x19, 0xfa, 0x1b, 0x40,
            ]]
        );
    }

    #[tokio::test]
    async fn test_open_cash_drawer_when_connected() {
        let sdk = FakeSdk::new();
        let mut printer = connected_printer(&sdk).await;

        printer.open_cash_drawer().await.unwrap();

        assert_eq!(sdk.calls().connect, 1);
        assert_eq!(sdk.calls().send_raw, 1);
    }

    #[tokio::test]
    async fn test_status_events_do_not_change_state() {
        let sdk = FakeSdk::new();
        let printer = connected_printer(&sdk).await;

        sdk.emit_status(StatusEvent::new(StatusFlags::COVER_OPEN));

        assert!(printer.is_connected());
    }

    #[tokio::test]
    async fn test_set_timeout_passes_through() {
        let sdk = FakeSdk::new();
        let mut printer = Printer::new(Arc::new(sdk.clone()));
        printer.set_timeout(3000);
        printer
            .setup("TCP:1.2.3.4", PrinterSeries::TmT20, PrinterLanguage::En)
            .await
            .unwrap();
        printer.connect().await.unwrap();

        assert_eq!(printer.config().discovery_window, Duration::from_millis(3000));
        assert_eq!(
            sdk.last_connect(),
            Some(("TCP:1.2.3.4".to_owned(), Duration::from_millis(3000)))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_discover_printers_merges() {
        let sdk = FakeSdk::new().with_devices(vec![
            DeviceDescriptor::new("TCP:1.2.3.4").with_mac("AA:BB:CC"),
            DeviceDescriptor::new("TCPS:1.2.3.4").with_mac("AA:BB:CC"),
            DeviceDescriptor::new("BT:00:01:90:AA").with_mac("DD:EE:FF"),
        ]);
        let printer = Printer::new(Arc::new(sdk));

        let devices = printer.discover_printers(PortType::All).await.unwrap();

        let targets: Vec<_> = devices.iter().map(|d| d.target.as_str()).collect();
        assert_eq!(targets, vec!["TCPS:1.2.3.4", "BT:00:01:90:AA"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_shared_printer_runs_on_spawned_tasks() {
        let sdk = FakeSdk::new()
            .with_devices(vec![DeviceDescriptor::new("TCP:1.2.3.4").with_mac("AA:BB:CC")]);
        sdk.set_pairing(BluetoothStatus::Success);
        let printer = Arc::new(Printer::new(Arc::new(sdk)));

        let discovering = Arc::clone(&printer);
        let devices = tokio::spawn(async move { discovering.discover_printers(PortType::All).await })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(devices.len(), 1);

        let pairing = Arc::clone(&printer);
        let response = tokio::spawn(async move { pairing.pair_bluetooth_printer().await })
            .await
            .unwrap()
            .unwrap();
        assert_eq!(response.status, BluetoothStatus::Success);
    }

    #[tokio::test]
    async fn test_pair_bluetooth_printer() {
        let sdk = FakeSdk::new();
        sdk.set_pairing(BluetoothStatus::Success);
        let printer = Printer::new(Arc::new(sdk));

        let response = printer.pair_bluetooth_printer().await.unwrap();
        assert_eq!(response.reason, "The function was executed successfully.");
    }
}
