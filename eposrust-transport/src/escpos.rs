//! ESC/POS encoding of print instructions

use byteorder::{ByteOrder, LittleEndian};
use bytes::{BufMut, BytesMut};
use encoding_rs::Encoding;
use eposrust_core::StatusFlags;
use eposrust_core::command::{
    Barcode, BarcodeType, CutType, DrawerPin, Hri, Instruction, QrCode, QrLevel, QrModel,
    TextStyle,
};
use eposrust_core::constants::escpos::{DLE, EOT, ESC, GS};
use eposrust_core::raster::Raster;
use eposrust_types::PrinterLanguage;
use tracing::debug;

use crate::error::{Error, Result};

/// Maximum QR payload accepted by the printer's symbol storage
const MAX_QR_DATA: usize = 7089;

/// `GS I 67`: transmit printer model name
pub const MODEL_NAME_REQUEST: [u8; 3] = [GS, 0x49, 0x43];

/// `DLE EOT n` requests polled after a send, in order
pub const STATUS_REQUESTS: [[u8; 3]; 4] = [
    [DLE, EOT, 1],
    [DLE, EOT, 2],
    [DLE, EOT, 3],
    [DLE, EOT, 4],
];

/// Encodes instructions for one printer language
#[derive(Debug, Clone)]
pub struct EscPosEncoder {
    language: PrinterLanguage,
    encoding: &'static Encoding,
}

impl EscPosEncoder {
    pub fn new(language: PrinterLanguage) -> Self {
        let encoding = match language {
            PrinterLanguage::En => encoding_rs::WINDOWS_1252,
            PrinterLanguage::Ja => encoding_rs::SHIFT_JIS,
            PrinterLanguage::ZhCn => encoding_rs::GBK,
            PrinterLanguage::ZhTw => encoding_rs::BIG5,
            PrinterLanguage::Ko => encoding_rs::EUC_KR,
            PrinterLanguage::Th => encoding_rs::WINDOWS_874,
            PrinterLanguage::Vi => encoding_rs::WINDOWS_1258,
            PrinterLanguage::Multi => encoding_rs::UTF_8,
        };
        Self { language, encoding }
    }

    pub fn language(&self) -> PrinterLanguage {
        self.language
    }

    /// Initialize and select the character table for the language
    pub fn prologue(&self, buf: &mut BytesMut) {
        buf.put_slice(&[ESC, b'@']);
        match self.language {
            PrinterLanguage::En => buf.put_slice(&[ESC, b't', 16]),
            PrinterLanguage::Th => buf.put_slice(&[ESC, b't', 26]),
            PrinterLanguage::Vi => buf.put_slice(&[ESC, b't', 52]),
            // Kanji / multibyte mode
            PrinterLanguage::Ja
            | PrinterLanguage::ZhCn
            | PrinterLanguage::ZhTw
            | PrinterLanguage::Ko => buf.put_slice(&[0x1c, b'&']),
            PrinterLanguage::Multi => {}
        }
    }

    /// Append the encoding of `instruction` to `buf`
    ///
    /// `buf` is untouched when the instruction is rejected.
    pub fn encode(&self, instruction: &Instruction, buf: &mut BytesMut) -> Result<()> {
        let mut out = BytesMut::new();

        match instruction {
            Instruction::Text(text) => self.text(text, &mut out),
            Instruction::TextAlign(align) => out.put_slice(&[ESC, b'a', *align as u8]),
            Instruction::TextSize { width, height } => {
                let w = check_range("text width", *width, 1, 8)?;
                let h = check_range("text height", *height, 1, 8)?;
                out.put_slice(&[GS, b'!', ((w - 1) << 4) | (h - 1)]);
            }
            Instruction::TextStyle(style) => text_style(style, &mut out),
            Instruction::TextSmooth(on) => out.put_slice(&[GS, b'b', u8::from(*on)]),
            Instruction::FeedLine(lines) => out.put_slice(&[ESC, b'd', *lines]),
            Instruction::Image(raster) => raster_image(raster, &mut out)?,
            Instruction::Cut(CutType::Feed) => out.put_slice(&[GS, b'V', 65, 0]),
            Instruction::Cut(CutType::NoFeed) => out.put_slice(&[GS, b'V', 0]),
            Instruction::Pulse { pin, time } => {
                let m = match pin {
                    DrawerPin::Pin2 => 0,
                    DrawerPin::Pin5 => 1,
                };
                let on = (time.millis() / 2) as u8;
                out.put_slice(&[ESC, b'p', m, on, 0xfa]);
            }
            Instruction::Barcode(barcode) => self.barcode(barcode, &mut out)?,
            Instruction::QrCode(qr) => qr_code(qr, &mut out)?,
            Instruction::Command(data) => {
                if data.is_empty() {
                    return Err(Error::InvalidParameter("empty command data".into()));
                }
                out.put_slice(data);
            }
        }

        buf.extend_from_slice(&out);
        Ok(())
    }

    fn text(&self, text: &str, out: &mut BytesMut) {
        let (encoded, _, unmappable) = self.encoding.encode(text);
        if unmappable {
            debug!(
                language = %self.language,
                encoding = self.encoding.name(),
                "Text contains characters outside the printer codepage"
            );
        }
        out.put_slice(&encoded);
    }

    fn barcode(&self, barcode: &Barcode, out: &mut BytesMut) -> Result<()> {
        if barcode.data.is_empty() || !barcode.data.is_ascii() {
            return Err(Error::InvalidParameter(format!(
                "barcode data must be non-empty ASCII: {:?}",
                barcode.data
            )));
        }
        let width = check_range("barcode width", barcode.width, 2, 6)?;
        let height = check_range("barcode height", barcode.height, 1, 255)?;

        let mut data = Vec::with_capacity(barcode.data.len() + 2);
        if barcode.kind == BarcodeType::Code128 && !barcode.data.starts_with('{') {
            // Code set B unless the caller picked one
            data.extend_from_slice(b"{B");
        }
        data.extend_from_slice(barcode.data.as_bytes());
        let len = u8::try_from(data.len())
            .map_err(|_| Error::InvalidParameter(format!("barcode data too long: {}", data.len())))?;

        let hri = match barcode.hri {
            Hri::None => 0,
            Hri::Above => 1,
            Hri::Below => 2,
            Hri::Both => 3,
        };

        out.put_slice(&[GS, b'H', hri]);
        out.put_slice(&[GS, b'w', width]);
        out.put_slice(&[GS, b'h', height]);
        out.put_slice(&[GS, b'k', barcode_system(barcode.kind), len]);
        out.put_slice(&data);
        Ok(())
    }
}

impl Default for EscPosEncoder {
    fn default() -> Self {
        Self::new(PrinterLanguage::default())
    }
}

fn check_range(what: &str, value: u8, min: u8, max: u8) -> Result<u8> {
    if (min..=max).contains(&value) {
        Ok(value)
    } else {
        Err(Error::InvalidParameter(format!(
            "{what} {value} outside {min}..={max}"
        )))
    }
}

fn text_style(style: &TextStyle, out: &mut BytesMut) {
    out.put_slice(&[ESC, b'E', u8::from(style.bold)]);
    out.put_slice(&[ESC, b'-', u8::from(style.underline)]);
    out.put_slice(&[GS, b'B', u8::from(style.reverse)]);
}

/// `GS v 0`: print raster bit image
fn raster_image(raster: &Raster, out: &mut BytesMut) -> Result<()> {
    let too_large = || {
        Error::InvalidParameter(format!(
            "raster {}x{} too large",
            raster.width(),
            raster.height()
        ))
    };
    let row_bytes = u16::try_from(raster.row_bytes()).map_err(|_| too_large())?;
    let rows = u16::try_from(raster.height()).map_err(|_| too_large())?;

    let mut header = [GS, b'v', b'0', 0, 0, 0, 0, 0];
    LittleEndian::write_u16(&mut header[4..6], row_bytes);
    LittleEndian::write_u16(&mut header[6..8], rows);

    out.put_slice(&header);
    out.put_slice(raster.data());
    Ok(())
}

/// `GS ( k` sequence for a QR symbol: model, size, level, store, print
fn qr_code(qr: &QrCode, out: &mut BytesMut) -> Result<()> {
    if qr.data.is_empty() || qr.data.len() > MAX_QR_DATA {
        return Err(Error::InvalidParameter(format!(
            "QR data length {} outside 1..={MAX_QR_DATA}",
            qr.data.len()
        )));
    }
    let size = check_range("QR module size", qr.size, 1, 16)?;

    let model = match qr.model {
        QrModel::Model1 => 49,
        QrModel::Model2 => 50,
        QrModel::Micro => 51,
    };
    let level = match qr.level {
        QrLevel::L => 48,
        QrLevel::M => 49,
        QrLevel::Q => 50,
        QrLevel::H => 51,
    };

    out.put_slice(&[GS, b'(', b'k', 4, 0, 49, 65, model, 0]);
    out.put_slice(&[GS, b'(', b'k', 3, 0, 49, 67, size]);
    out.put_slice(&[GS, b'(', b'k', 3, 0, 49, 69, level]);

    let mut store = [GS, b'(', b'k', 0, 0, 49, 80, 48];
    LittleEndian::write_u16(&mut store[3..5], (qr.data.len() + 3) as u16);
    out.put_slice(&store);
    out.put_slice(qr.data.as_bytes());

    out.put_slice(&[GS, b'(', b'k', 3, 0, 49, 81, 48]);
    Ok(())
}

fn barcode_system(kind: BarcodeType) -> u8 {
    match kind {
        BarcodeType::UpcA => 65,
        BarcodeType::UpcE => 66,
        BarcodeType::Ean13 | BarcodeType::Jan13 => 67,
        BarcodeType::Ean8 | BarcodeType::Jan8 => 68,
        BarcodeType::Code39 => 69,
        BarcodeType::Itf => 70,
        BarcodeType::Codabar => 71,
        BarcodeType::Code93 => 72,
        BarcodeType::Code128 => 73,
        BarcodeType::Gs1_128 => 74,
        BarcodeType::Gs1DataBarOmnidirectional => 75,
        BarcodeType::Gs1DataBarTruncated => 76,
        BarcodeType::Gs1DataBarLimited => 77,
        BarcodeType::Gs1DataBarExpanded => 78,
        BarcodeType::Code128Auto => 79,
    }
}

/// Decode the replies to [`STATUS_REQUESTS`]
pub fn status_flags(replies: [u8; 4]) -> StatusFlags {
    let [printer, offline, error, paper] = replies;
    let mut flags = StatusFlags::empty();

    flags.set(StatusFlags::ONLINE, printer & 0x08 == 0);
    flags.set(StatusFlags::DRAWER_OPEN, printer & 0x04 != 0);
    flags.set(StatusFlags::COVER_OPEN, offline & 0x04 != 0);
    flags.set(StatusFlags::PAPER_FEED, offline & 0x08 != 0);
    flags.set(StatusFlags::PAPER_EMPTY, offline & 0x20 != 0 || paper & 0x60 != 0);
    flags.set(StatusFlags::MECHANICAL_ERROR, error & 0x04 != 0);
    flags.set(StatusFlags::AUTOCUTTER_ERROR, error & 0x08 != 0);
    flags.set(StatusFlags::UNRECOVER_ERROR, error & 0x20 != 0);
    flags.set(StatusFlags::AUTO_RECOVER_ERROR, error & 0x40 != 0);
    flags.set(StatusFlags::PAPER_NEAR_END, paper & 0x0c != 0);

    flags
}

/// Parse a `GS I 67` reply: `_` model name, NUL terminated
pub fn parse_model_name(reply: &[u8]) -> Option<String> {
    let body = reply.strip_prefix(b"_")?;
    let end = body.iter().position(|b| *b == 0).unwrap_or(body.len());
    let name = String::from_utf8_lossy(&body[..end]).trim().to_owned();
    (!name.is_empty()).then_some(name)
}
