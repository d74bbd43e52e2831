//! Vendor enumerations: printer series, languages, port filters, alignment

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::{Error, Result};

/// Port filter applied to a discovery session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PortType {
    #[default]
    All,
    Lan,
    Bluetooth,
    Usb,
}

impl PortType {
    pub fn name(self) -> &'static str {
        match self {
            Self::All => "ALL",
            Self::Lan => "LAN",
            Self::Bluetooth => "BLUETOOTH",
            Self::Usb => "USB",
        }
    }

    /// Check whether devices on `other` are included by this filter
    pub fn includes(self, other: PortType) -> bool {
        self == Self::All || self == other
    }
}

impl FromStr for PortType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ALL" => Ok(Self::All),
            "LAN" => Ok(Self::Lan),
            "BLUETOOTH" => Ok(Self::Bluetooth),
            "USB" => Ok(Self::Usb),
            _ => Err(Error::Parse(format!("unknown port type: {s}"))),
        }
    }
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Printer model family
///
/// Discriminants are the vendor SDK's series identifiers.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum PrinterSeries {
    TmM10 = 0,
    TmM30 = 1,
    TmP20 = 2,
    TmP60 = 3,
    TmP60II = 4,
    TmP80 = 5,
    #[default]
    TmT20 = 6,
    TmT60 = 7,
    TmT70 = 8,
    TmT81 = 9,
    TmT82 = 10,
    TmT83 = 11,
    TmT88 = 12,
    TmT90 = 13,
    TmT90KP = 14,
    TmU220 = 15,
    TmU330 = 16,
    TmL90 = 17,
    TmH6000 = 18,
    TmT83III = 19,
    TmT100 = 20,
    TmM30II = 21,
    Ts100 = 22,
    TmM50 = 23,
    TmT88VII = 24,
    TmL90LFC = 25,
    TmL100 = 26,
    TmM30III = 29,
}

impl PrinterSeries {
    pub const ALL: [PrinterSeries; 28] = [
        Self::TmM10,
        Self::TmM30,
        Self::TmM30II,
        Self::TmM30III,
        Self::TmP20,
        Self::TmP60,
        Self::TmP60II,
        Self::TmP80,
        Self::TmT20,
        Self::TmT60,
        Self::TmT70,
        Self::TmT81,
        Self::TmT82,
        Self::TmT83,
        Self::TmT88,
        Self::TmT90,
        Self::TmT90KP,
        Self::TmU220,
        Self::TmU330,
        Self::TmL90,
        Self::TmH6000,
        Self::TmT83III,
        Self::TmT100,
        Self::Ts100,
        Self::TmM50,
        Self::TmT88VII,
        Self::TmL90LFC,
        Self::TmL100,
    ];

    /// Vendor series identifier
    pub fn id(self) -> i32 {
        self as i32
    }

    /// Get series name
    pub fn name(self) -> &'static str {
        match self {
            Self::TmM10 => "SERIES_TM_M10",
            Self::TmM30 => "SERIES_TM_M30",
            Self::TmM30II => "SERIES_TM_M30II",
            Self::TmM30III => "SERIES_TM_M30III",
            Self::TmP20 => "SERIES_TM_P20",
            Self::TmP60 => "SERIES_TM_P60",
            Self::TmP60II => "SERIES_TM_P60II",
            Self::TmP80 => "SERIES_TM_P80",
            Self::TmT20 => "SERIES_TM_T20",
            Self::TmT60 => "SERIES_TM_T60",
            Self::TmT70 => "SERIES_TM_T70",
            Self::TmT81 => "SERIES_TM_T81",
            Self::TmT82 => "SERIES_TM_T82",
            Self::TmT83 => "SERIES_TM_T83",
            Self::TmT88 => "SERIES_TM_T88",
            Self::TmT90 => "SERIES_TM_T90",
            Self::TmT90KP => "SERIES_TM_T90KP",
            Self::TmU220 => "SERIES_TM_U220",
            Self::TmU330 => "SERIES_TM_U330",
            Self::TmL90 => "SERIES_TM_L90",
            Self::TmH6000 => "SERIES_TM_H6000",
            Self::TmT83III => "SERIES_TM_T83III",
            Self::TmT100 => "SERIES_TM_T100",
            Self::Ts100 => "SERIES_TS_100",
            Self::TmM50 => "SERIES_TM_M50",
            Self::TmT88VII => "SERIES_TM_T88VII",
            Self::TmL90LFC => "SERIES_TM_L90LFC",
            Self::TmL100 => "SERIES_TM_L100",
        }
    }

    /// Model token of the series name (`SERIES_TM_T88VII` -> `T88VII`)
    pub fn model(self) -> &'static str {
        self.name().split('_').nth(2).unwrap_or_default()
    }

    /// Guess the series from an advertised device name
    ///
    /// Matches model tokens case-insensitively; the longest matching token
    /// wins so that `TM-T88VII` resolves to `SERIES_TM_T88VII` rather than
    /// `SERIES_TM_T88`. Falls back to `SERIES_TM_T20`.
    pub fn from_model_name(device_name: &str) -> Self {
        let name = device_name.to_lowercase();

        Self::ALL
            .iter()
            .copied()
            .filter(|series| {
                let model = series.model();
                !model.is_empty() && name.contains(&model.to_lowercase())
            })
            .fold(None, |best: Option<PrinterSeries>, series| match best {
                Some(b) if b.model().len() >= series.model().len() => Some(b),
                _ => Some(series),
            })
            .unwrap_or_default()
    }
}

impl FromStr for PrinterSeries {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|series| series.name() == s)
            .ok_or_else(|| Error::Parse(format!("unknown printer series: {s}")))
    }
}

impl TryFrom<i32> for PrinterSeries {
    type Error = Error;

    fn try_from(value: i32) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|series| series.id() == value)
            .ok_or_else(|| Error::Validation(format!("unknown printer series id: {value}")))
    }
}

impl fmt::Display for PrinterSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name(), self.id())
    }
}

/// Receipt text language
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[repr(i32)]
pub enum PrinterLanguage {
    #[default]
    En = 0,
    Ja = 1,
    ZhCn = 2,
    ZhTw = 3,
    Ko = 4,
    Th = 5,
    Vi = 6,
    Multi = 7,
}

impl PrinterLanguage {
    pub const ALL: [PrinterLanguage; 8] = [
        Self::En,
        Self::Ja,
        Self::ZhCn,
        Self::ZhTw,
        Self::Ko,
        Self::Th,
        Self::Vi,
        Self::Multi,
    ];

    pub fn id(self) -> i32 {
        self as i32
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::En => "LANG_EN",
            Self::Ja => "LANG_JA",
            Self::ZhCn => "LANG_ZH_CN",
            Self::ZhTw => "LANG_ZH_TW",
            Self::Ko => "LANG_KO",
            Self::Th => "LANG_TH",
            Self::Vi => "LANG_VI",
            Self::Multi => "LANG_MULTI",
        }
    }

    /// Parse a language name, falling back to `LANG_EN`
    pub fn from_name_or_default(name: &str) -> Self {
        name.parse().unwrap_or_else(|_| {
            warn!(language = name, "An invalid parameter of language was passed, using LANG_EN");
            Self::En
        })
    }
}

impl FromStr for PrinterLanguage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.name() == s)
            .ok_or_else(|| Error::Parse(format!("unknown printer language: {s}")))
    }
}

impl fmt::Display for PrinterLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Text alignment
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Align {
    #[default]
    Left = 0,
    Center = 1,
    Right = 2,
}

impl Align {
    /// Map a caller-facing alignment name; anything unrecognised centers
    pub fn from_name(name: &str) -> Self {
        match name {
            "left" => Self::Left,
            "right" => Self::Right,
            _ => Self::Center,
        }
    }
}

impl TryFrom<u8> for Align {
    type Error = Error;

    fn try_from(value: u8) -> Result<Self> {
        match value {
            0 => Ok(Self::Left),
            1 => Ok(Self::Center),
            2 => Ok(Self::Right),
            _ => Err(Error::Validation(format!("invalid alignment: {value}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_port_type_parse() {
        assert_eq!("USB".parse::<PortType>().unwrap(), PortType::Usb);
        assert_eq!("LAN".parse::<PortType>().unwrap(), PortType::Lan);
        assert!("SERIAL".parse::<PortType>().is_err());
        assert!(PortType::All.includes(PortType::Bluetooth));
        assert!(!PortType::Usb.includes(PortType::Lan));
    }

    #[test]
    fn test_series_name_round_trip() {
        for series in PrinterSeries::ALL {
            assert_eq!(series.name().parse::<PrinterSeries>().unwrap(), series);
            assert_eq!(PrinterSeries::try_from(series.id()).unwrap(), series);
        }
    }

    #[test]
    fn test_series_from_model_name() {
        assert_eq!(PrinterSeries::from_model_name("TM-T88VII"), PrinterSeries::TmT88VII);
        assert_eq!(PrinterSeries::from_model_name("TM-T88V"), PrinterSeries::TmT88);
        assert_eq!(PrinterSeries::from_model_name("TM-m30III"), PrinterSeries::TmM30III);
        assert_eq!(PrinterSeries::from_model_name("TM-m30"), PrinterSeries::TmM30);
        assert_eq!(PrinterSeries::from_model_name("TM-T100"), PrinterSeries::TmT100);
        assert_eq!(PrinterSeries::from_model_name("Unknown printer"), PrinterSeries::TmT20);
    }

    #[test]
    fn test_language_fallback() {
        assert_eq!(PrinterLanguage::from_name_or_default("LANG_JA"), PrinterLanguage::Ja);
        assert_eq!(PrinterLanguage::from_name_or_default("LANG_XX"), PrinterLanguage::En);
    }

    #[test]
    fn test_align_from_name() {
        assert_eq!(Align::from_name("left"), Align::Left);
        assert_eq!(Align::from_name("right"), Align::Right);
        assert_eq!(Align::from_name("center"), Align::Center);
        assert_eq!(Align::from_name("justify"), Align::Center);
        assert!(Align::try_from(3).is_err());
    }
}
