//! Receipt printing example

use std::sync::Arc;

use anyhow::Context;
use eposrust::{
    Align, Barcode, BarcodeType, CutType, Printer, PrinterLanguage, PrinterSeries, QrCode,
    TextStyle,
};
use eposrust_transport::NetworkSdk;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let target = std::env::var("PRINTER_TARGET").unwrap_or_else(|_| "TCP:192.168.1.50".to_string());
    let host = target.trim_start_matches("TCP:").to_string();

    let mut printer = Printer::new(Arc::new(NetworkSdk::new([host])));
    printer
        .setup(&target, PrinterSeries::TmT88, PrinterLanguage::En)
        .await
        .context("setup")?;
    printer.connect().await.context("connect")?;
    println!("✓ Connected to {target}");

    printer.begin_transaction()?;
    printer.add_text_align(Align::Center)?;
    printer.add_text_size(2, 2)?;
    printer.add_text("eposrust\n")?;
    printer.add_text_size(1, 1)?;
    printer.add_text_style(TextStyle {
        bold: true,
        ..Default::default()
    })?;
    printer.add_text("Thank you!\n")?;
    printer.add_text_style(TextStyle::default())?;
    printer.add_feed_line(1)?;
    printer.add_barcode(Barcode::new("4901234567894", BarcodeType::Ean13))?;
    printer.add_qr_code(QrCode::new("https://github.com/eposrust/eposrust"))?;
    printer.add_cut(CutType::Feed)?;
    printer.end_transaction()?;

    printer.send_data().await.context("send")?;
    printer.clear_buffer()?;
    println!("✓ Receipt sent");

    printer.disconnect().await?;
    println!("✓ Disconnected");

    Ok(())
}
