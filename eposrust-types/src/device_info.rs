//! Discovered printer descriptors

use std::fmt;

/// Transport family encoded in a target string prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TargetKind {
    /// `TCP:` plain network connection
    Tcp,

    /// `TCPS:` secure network connection
    TcpSecure,

    /// `BT:` bluetooth address
    Bluetooth,

    /// `USB:` local USB device
    Usb,

    /// No recognised prefix
    Unknown,
}

impl TargetKind {
    pub const TCP_PREFIX: &'static str = "TCP:";
    pub const TCPS_PREFIX: &'static str = "TCPS:";
    pub const BT_PREFIX: &'static str = "BT:";
    pub const USB_PREFIX: &'static str = "USB:";

    /// Classify a target string by its prefix
    pub fn of(target: &str) -> Self {
        if target.starts_with(Self::TCPS_PREFIX) {
            Self::TcpSecure
        } else if target.starts_with(Self::TCP_PREFIX) {
            Self::Tcp
        } else if target.starts_with(Self::BT_PREFIX) {
            Self::Bluetooth
        } else if target.starts_with(Self::USB_PREFIX) {
            Self::Usb
        } else {
            Self::Unknown
        }
    }
}

/// One printer reported by a discovery cycle
///
/// Everything except `target` is transport dependent and may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceDescriptor {
    /// Device name as advertised by the printer
    pub name: Option<String>,

    /// Transport-qualified address (`TCP:192.168.1.5`, `USB:001`, `BT:00:01:...`)
    pub target: String,

    /// IP address (network printers)
    pub ip: Option<String>,

    /// MAC address, used as hardware identity when merging
    pub mac: Option<String>,

    /// Bluetooth device address
    pub bt: Option<String>,

    /// USB address (target without its `USB:` prefix)
    pub usb: Option<String>,

    /// Serial number resolved from the host USB subsystem
    pub usb_serial_number: Option<String>,
}

impl DeviceDescriptor {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn with_mac(mut self, mac: impl Into<String>) -> Self {
        self.mac = Some(mac.into());
        self
    }

    pub fn with_bt(mut self, bt: impl Into<String>) -> Self {
        self.bt = Some(bt.into());
        self
    }

    /// Transport family of the target
    pub fn kind(&self) -> TargetKind {
        TargetKind::of(&self.target)
    }

    /// Whether the target denotes the secure TCP transport
    pub fn is_secure(&self) -> bool {
        self.kind() == TargetKind::TcpSecure
    }

    /// MAC address when present and non-empty
    pub fn identity(&self) -> Option<&str> {
        self.mac.as_deref().filter(|mac| !mac.is_empty())
    }

    /// USB address carried in the target, if this is a USB target
    pub fn usb_address(&self) -> Option<&str> {
        self.target
            .strip_prefix(TargetKind::USB_PREFIX)
            .filter(|addr| !addr.is_empty())
    }

    /// Copy optional fields from `other` that are missing here
    pub fn fill_missing_from(&mut self, other: &DeviceDescriptor) {
        fn fill(slot: &mut Option<String>, value: &Option<String>) {
            if slot.as_deref().is_none_or(str::is_empty) {
                if let Some(v) = value.as_ref().filter(|v| !v.is_empty()) {
                    *slot = Some(v.clone());
                }
            }
        }

        fill(&mut self.name, &other.name);
        fill(&mut self.ip, &other.ip);
        fill(&mut self.mac, &other.mac);
        fill(&mut self.bt, &other.bt);
        fill(&mut self.usb, &other.usb);
        fill(&mut self.usb_serial_number, &other.usb_serial_number);
    }
}

impl fmt::Display for DeviceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Printer[{}, target: {}]",
            self.name.as_deref().unwrap_or("unnamed"),
            self.target
        )
    }
}
