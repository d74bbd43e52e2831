//! Print instructions accumulated in a printer's command buffer

use std::fmt;

use bytes::Bytes;
use eposrust_types::Align;

use crate::error::ErrorCode;
use crate::raster::Raster;

/// Paper cut mode
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum CutType {
    /// Feed paper to the cutter, then cut
    #[default]
    Feed,

    /// Cut at the current position
    NoFeed,
}

/// Cash drawer connector pin
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum DrawerPin {
    #[default]
    Pin2,
    Pin5,
}

/// Drawer kick pulse width in milliseconds
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum PulseTime {
    #[default]
    Ms100,
    Ms200,
    Ms300,
    Ms400,
    Ms500,
}

impl PulseTime {
    pub fn millis(self) -> u16 {
        match self {
            Self::Ms100 => 100,
            Self::Ms200 => 200,
            Self::Ms300 => 300,
            Self::Ms400 => 400,
            Self::Ms500 => 500,
        }
    }
}

/// Text decoration
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct TextStyle {
    pub bold: bool,
    pub underline: bool,
    pub reverse: bool,
}

/// Barcode symbologies
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BarcodeType {
    UpcA,
    UpcE,
    Ean13,
    Jan13,
    Ean8,
    Jan8,
    Code39,
    Itf,
    Codabar,
    Code93,
    Code128,
    Gs1_128,
    Gs1DataBarOmnidirectional,
    Gs1DataBarTruncated,
    Gs1DataBarLimited,
    Gs1DataBarExpanded,
    Code128Auto,
}

/// Human readable interpretation placement
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum Hri {
    None,
    Above,
    #[default]
    Below,
    Both,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    pub data: String,
    pub kind: BarcodeType,
    pub hri: Hri,
    /// Module width in dots (2..=6)
    pub width: u8,
    /// Bar height in dots (1..=255)
    pub height: u8,
}

impl Barcode {
    pub fn new(data: impl Into<String>, kind: BarcodeType) -> Self {
        Self {
            data: data.into(),
            kind,
            hri: Hri::default(),
            width: 3,
            height: 162,
        }
    }
}

/// QR code model
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum QrModel {
    Model1,
    #[default]
    Model2,
    Micro,
}

/// QR code error correction level
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum QrLevel {
    L,
    #[default]
    M,
    Q,
    H,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrCode {
    pub data: String,
    pub model: QrModel,
    pub level: QrLevel,
    /// Module size in dots (1..=16)
    pub size: u8,
}

impl QrCode {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            model: QrModel::default(),
            level: QrLevel::default(),
            size: 3,
        }
    }
}

/// One buffer-mutating operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    Text(String),
    TextAlign(Align),
    TextSize {
        width: u8,
        height: u8,
    },
    TextStyle(TextStyle),
    /// Smooth enlarged characters
    TextSmooth(bool),
    FeedLine(u8),
    Image(Raster),
    Cut(CutType),
    Pulse {
        pin: DrawerPin,
        time: PulseTime,
    },
    Barcode(Barcode),
    QrCode(QrCode),
    /// Raw printer commands, passed through unchanged
    Command(Bytes),
}

impl Instruction {
    /// Get instruction name
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text(_) => "addText",
            Self::TextAlign(_) => "addTextAlign",
            Self::TextSize { .. } => "addTextSize",
            Self::TextStyle(_) => "addTextStyle",
            Self::TextSmooth(_) => "addTextSmooth",
            Self::FeedLine(_) => "addFeedLine",
            Self::Image(_) => "addImage",
            Self::Cut(_) => "addCut",
            Self::Pulse { .. } => "addPulse",
            Self::Barcode(_) => "addBarcode",
            Self::QrCode(_) => "addQrCode",
            Self::Command(_) => "addCommand",
        }
    }

    /// Error reported when the vendor rejects this instruction
    pub fn error_code(&self) -> ErrorCode {
        match self {
            Self::Text(_) => ErrorCode::CommandAddText,
            Self::TextAlign(_) => ErrorCode::CommandAddTextAlign,
            Self::TextSize { .. } => ErrorCode::CommandAddTextSize,
            Self::TextStyle(_) => ErrorCode::CommandAddTextStyle,
            Self::TextSmooth(_) => ErrorCode::CommandAddTextSmooth,
            Self::FeedLine(_) => ErrorCode::CommandAddFeedLine,
            Self::Image(_) => ErrorCode::CommandAddImage,
            Self::Cut(_) => ErrorCode::CommandAddCut,
            Self::Pulse { .. } => ErrorCode::CommandAddPulse,
            Self::Barcode(_) => ErrorCode::CommandAddBarcode,
            Self::QrCode(_) => ErrorCode::CommandAddQrCode,
            Self::Command(_) => ErrorCode::CommandAddCommand,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => write!(f, "{}({} chars)", self.name(), text.chars().count()),
            Self::Image(raster) => write!(f, "{}({}x{})", self.name(), raster.width(), raster.height()),
            Self::Command(data) => write!(f, "{}({} bytes)", self.name(), data.len()),
            _ => f.write_str(self.name()),
        }
    }
}
