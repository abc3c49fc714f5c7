use crate::error::{ChipMapError, Result};
use crate::{
    CCK_11M_CHIPS_PER_BYTE, CCK_5_5M_CHIPS_PER_BYTE, DBPSK_CHIPS_PER_BYTE, DQPSK_CHIPS_PER_BYTE,
    LONG_PREAMBLE_BYTES, PLCP_HEADER_BYTES, SHORT_PREAMBLE_BYTES,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// PLCP preamble format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preamble {
    /// 144-bit preamble and 48-bit header, both at 1 Mbps
    Long,
    /// 72-bit preamble at 1 Mbps, 48-bit header at 2 Mbps
    Short,
}

impl Preamble {
    /// Bytes encoded with DBPSK at the start of every packet
    pub fn dbpsk_bytes(&self) -> usize {
        match self {
            Preamble::Long => LONG_PREAMBLE_BYTES + PLCP_HEADER_BYTES,
            Preamble::Short => SHORT_PREAMBLE_BYTES,
        }
    }

    /// Bytes of PLCP header sent with DQPSK after the DBPSK window
    pub fn dqpsk_header_bytes(&self) -> usize {
        match self {
            Preamble::Long => 0,
            Preamble::Short => PLCP_HEADER_BYTES,
        }
    }
}

/// Payload rate and preamble combination, selected by the first byte of a
/// packet
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rate {
    #[default]
    Long1M,
    Long2M,
    Long5_5M,
    Long11M,
    Short2M,
    Short5_5M,
    Short11M,
}

impl Rate {
    pub const ALL: [Rate; 7] = [
        Rate::Long1M,
        Rate::Long2M,
        Rate::Long5_5M,
        Rate::Long11M,
        Rate::Short2M,
        Rate::Short5_5M,
        Rate::Short11M,
    ];

    /// Rate-selector byte value
    pub fn selector(&self) -> u8 {
        match self {
            Rate::Long1M => 0,
            Rate::Long2M => 1,
            Rate::Long5_5M => 2,
            Rate::Long11M => 3,
            Rate::Short2M => 4,
            Rate::Short5_5M => 5,
            Rate::Short11M => 6,
        }
    }

    pub fn preamble(&self) -> Preamble {
        match self {
            Rate::Long1M | Rate::Long2M | Rate::Long5_5M | Rate::Long11M => Preamble::Long,
            Rate::Short2M | Rate::Short5_5M | Rate::Short11M => Preamble::Short,
        }
    }

    /// Chips written per payload byte
    pub fn chips_per_byte(&self) -> usize {
        match self {
            Rate::Long1M => DBPSK_CHIPS_PER_BYTE,
            Rate::Long2M | Rate::Short2M => DQPSK_CHIPS_PER_BYTE,
            Rate::Long5_5M | Rate::Short5_5M => CCK_5_5M_CHIPS_PER_BYTE,
            Rate::Long11M | Rate::Short11M => CCK_11M_CHIPS_PER_BYTE,
        }
    }

    /// Payload symbols per byte; drives the even/odd parity of 11 Mbps CCK
    pub fn symbols_per_byte(&self) -> u64 {
        match self {
            Rate::Long1M => 8,
            Rate::Long2M | Rate::Short2M => 4,
            Rate::Long5_5M | Rate::Short5_5M => 2,
            Rate::Long11M | Rate::Short11M => 1,
        }
    }

    /// Payload bit rate in Mbps
    pub fn mbps(&self) -> f32 {
        match self {
            Rate::Long1M => 1.0,
            Rate::Long2M | Rate::Short2M => 2.0,
            Rate::Long5_5M | Rate::Short5_5M => 5.5,
            Rate::Long11M | Rate::Short11M => 11.0,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rate::Long1M => "LONG1M",
            Rate::Long2M => "LONG2M",
            Rate::Long5_5M => "LONG5_5M",
            Rate::Long11M => "LONG11M",
            Rate::Short2M => "SHORT2M",
            Rate::Short5_5M => "SHORT5_5M",
            Rate::Short11M => "SHORT11M",
        }
    }
}

impl TryFrom<u8> for Rate {
    type Error = ChipMapError;

    fn try_from(selector: u8) -> Result<Self> {
        Rate::ALL
            .iter()
            .copied()
            .find(|rate| rate.selector() == selector)
            .ok_or(ChipMapError::InvalidRate(selector))
    }
}

impl FromStr for Rate {
    type Err = ChipMapError;

    /// Accepts the rate name in any case, with or without the underscore
    /// (`short11m`, `LONG5_5M`, `long5.5m`), or the numeric selector
    fn from_str(s: &str) -> Result<Self> {
        if let Ok(selector) = s.parse::<u8>() {
            return Rate::try_from(selector);
        }
        let wanted = s.to_ascii_uppercase().replace(['.', '-'], "_");
        Rate::ALL
            .iter()
            .copied()
            .find(|rate| rate.name() == wanted || rate.name().replace('_', "") == wanted)
            .ok_or_else(|| ChipMapError::InvalidConfig(format!("unknown rate '{}'", s)))
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_round_trip() {
        for (i, rate) in Rate::ALL.iter().enumerate() {
            assert_eq!(rate.selector() as usize, i);
            assert_eq!(Rate::try_from(i as u8).unwrap(), *rate);
        }
    }

    #[test]
    fn test_invalid_selector() {
        for selector in [7u8, 9, 0x80, 0xFF] {
            match Rate::try_from(selector) {
                Err(ChipMapError::InvalidRate(s)) => assert_eq!(s, selector),
                other => panic!("expected InvalidRate, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_preamble_windows() {
        assert_eq!(Preamble::Long.dbpsk_bytes(), 24);
        assert_eq!(Preamble::Long.dqpsk_header_bytes(), 0);
        assert_eq!(Preamble::Short.dbpsk_bytes(), 9);
        assert_eq!(Preamble::Short.dqpsk_header_bytes(), 6);
    }

    #[test]
    fn test_chips_times_mbps_is_constant() {
        // 11 Mchip/s: chips per byte * bytes per µs must always equal 11
        for rate in Rate::ALL {
            let chips_per_us = rate.chips_per_byte() as f32 * rate.mbps() / 8.0;
            assert!((chips_per_us - 11.0).abs() < 1e-6, "{}", rate);
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("short11m".parse::<Rate>().unwrap(), Rate::Short11M);
        assert_eq!("LONG5_5M".parse::<Rate>().unwrap(), Rate::Long5_5M);
        assert_eq!("long5.5m".parse::<Rate>().unwrap(), Rate::Long5_5M);
        assert_eq!("4".parse::<Rate>().unwrap(), Rate::Short2M);
        assert!("short1m".parse::<Rate>().is_err());
        assert!("12".parse::<Rate>().is_err());
    }
}
