//! LAN discovery example
//!
//! Probes every host in `PRINTER_HOSTS` (comma separated) on the raw print
//! port and lists the merged results.

use std::sync::Arc;
use std::time::Duration;

use eposrust::{PortType, Printer, PrinterConfig};
use eposrust_transport::NetworkSdk;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> eposrust::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("eposrust=debug")),
        )
        .init();

    let hosts = std::env::var("PRINTER_HOSTS").unwrap_or_else(|_| "192.168.1.50".to_string());
    let sdk = NetworkSdk::new(hosts.split(',').map(str::trim));

    let config = PrinterConfig::new().with_discovery_window(Duration::from_secs(3));
    let printer = Printer::with_config(Arc::new(sdk), config);

    println!("Discovering printers...");
    let devices = printer.discover_printers(PortType::Lan).await?;

    if devices.is_empty() {
        println!("No printers found");
    }
    for device in devices {
        println!("✓ {device}");
    }

    Ok(())
}
