//! Protocol constants

/// Default connect timeout (milliseconds)
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 5000;

/// Default discovery window (milliseconds)
pub const DEFAULT_DISCOVERY_WINDOW_MS: u64 = 5000;

/// Interval between disconnect attempts while the printer is busy (milliseconds)
pub const DEFAULT_DISCONNECT_INTERVAL_MS: u64 = 500;

/// Upper bound on busy disconnect attempts
pub const DEFAULT_MAX_DISCONNECT_ATTEMPTS: u32 = 20;

/// Connect retries applied by callers on top of the single-attempt connect
pub const DEFAULT_CONNECT_RETRIES: u32 = 3;

/// Delay between connect retries (milliseconds)
pub const DEFAULT_CONNECT_RETRY_DELAY_MS: u64 = 2000;

/// Raw ESC/POS port of network printers
pub const RAW_PRINT_PORT: u16 = 9100;

/// ESC/POS byte values
pub mod escpos {
    pub const ESC: u8 = 0x1b;
    pub const GS: u8 = 0x1d;
    pub const DLE: u8 = 0x10;
    pub const EOT: u8 = 0x04;
    pub const LF: u8 = 0x0a;
}

/// Cash drawer kick: reset, pulse pin 2, pulse pin 5, reset
///
/// Each pulse is `ESC p m t1 t2` with 25 * 2 ms on and 250 * 2 ms off.
pub const OPEN_DRAWER_SEQUENCE: [u8; 14] = [
    0x1b, 0x40, //
    0x1b, 0x70, 0x00, 0x19, 0xfa, //
    0x1b, 0x70, 0x01, 0x19, 0xfa, //
    0x1b, 0x40,
];
