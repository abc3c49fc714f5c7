use crate::mapper::Modulation;
use crate::rate::Rate;
use crate::spread::BARKER_11;
use crate::{DBPSK_CHIPS_PER_BYTE, DQPSK_CHIPS_PER_BYTE, TRAILER_CHIPS};
use num_complex::Complex32;
use serde::{Deserialize, Serialize};

/// End-of-packet marker appended after every payload
pub const TRAILER: [Complex32; TRAILER_CHIPS] = {
    let mut chips = [Complex32::new(0.0, 0.0); TRAILER_CHIPS];
    let mut i = 0;
    while i < TRAILER_CHIPS {
        chips[i] = Complex32::new(BARKER_11[i], 0.0);
        i += 1;
    }
    chips
};

/// Position of the encoder within a packet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Segment {
    /// PLCP preamble (and, for long preambles, the header) at 1 Mbps
    Preamble,
    /// Short-preamble PLCP header at 2 Mbps
    Header,
    /// PSDU at the packet rate
    Payload,
    /// Waiting to emit the end-of-packet marker
    Trailer,
    /// No packet in progress
    Idle,
}

impl Segment {
    /// Segment holding byte `index` of a packet sent at `rate`
    pub fn at(rate: Rate, index: usize) -> Segment {
        let preamble = rate.preamble();
        let dbpsk = preamble.dbpsk_bytes();
        if index < dbpsk {
            Segment::Preamble
        } else if index < dbpsk + preamble.dqpsk_header_bytes() {
            Segment::Header
        } else {
            Segment::Payload
        }
    }

    /// Modulation applied to bytes of this segment, if it carries bytes
    pub fn modulation(&self, rate: Rate) -> Option<Modulation> {
        match self {
            Segment::Preamble => Some(Modulation::Dbpsk1M),
            Segment::Header => Some(Modulation::Dqpsk2M),
            Segment::Payload => Some(Modulation::for_payload(rate)),
            Segment::Trailer | Segment::Idle => None,
        }
    }
}

/// Chip budget of one packet, split by segment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChipBudget {
    pub preamble_bytes: usize,
    pub header_bytes: usize,
    pub payload_bytes: usize,
    pub preamble_chips: usize,
    pub header_chips: usize,
    pub payload_chips: usize,
    pub trailer_chips: usize,
}

impl ChipBudget {
    /// Budget for `bytes` bytes (preamble + header + payload, excluding the
    /// rate selector) sent at `rate`
    ///
    /// Chip counts saturate at `usize::MAX`; use [`checked_chip_count`] where
    /// the length comes from untrusted input.
    pub fn new(rate: Rate, bytes: usize) -> Self {
        let preamble = rate.preamble();
        let preamble_bytes = bytes.min(preamble.dbpsk_bytes());
        let header_bytes = (bytes - preamble_bytes).min(preamble.dqpsk_header_bytes());
        let payload_bytes = bytes - preamble_bytes - header_bytes;

        Self {
            preamble_bytes,
            header_bytes,
            payload_bytes,
            preamble_chips: preamble_bytes * DBPSK_CHIPS_PER_BYTE,
            header_chips: header_bytes * DQPSK_CHIPS_PER_BYTE,
            payload_chips: payload_bytes.saturating_mul(rate.chips_per_byte()),
            trailer_chips: TRAILER_CHIPS,
        }
    }

    pub fn total(&self) -> usize {
        self.preamble_chips
            .saturating_add(self.header_chips)
            .saturating_add(self.payload_chips)
            .saturating_add(self.trailer_chips)
    }
}

/// Chips a packet of `bytes` bytes will occupy at `rate`, trailer included
pub fn expected_chip_count(rate: Rate, bytes: usize) -> usize {
    ChipBudget::new(rate, bytes).total()
}

/// Like [`expected_chip_count`], but `None` when the count overflows `usize`
pub fn checked_chip_count(rate: Rate, bytes: usize) -> Option<usize> {
    let budget = ChipBudget::new(rate, bytes);
    budget
        .payload_bytes
        .checked_mul(rate.chips_per_byte())?
        .checked_add(budget.preamble_chips)?
        .checked_add(budget.header_chips)?
        .checked_add(budget.trailer_chips)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailer_matches_barker() {
        let expected = [1.0, -1.0, 1.0, 1.0, -1.0, 1.0, 1.0, 1.0, -1.0, -1.0, -1.0];
        for (chip, want) in TRAILER.iter().zip(expected.iter()) {
            assert_eq!(chip.re, *want);
            assert_eq!(chip.im, 0.0);
        }
    }

    #[test]
    fn test_segments_long_preamble() {
        assert_eq!(Segment::at(Rate::Long11M, 0), Segment::Preamble);
        assert_eq!(Segment::at(Rate::Long11M, 17), Segment::Preamble);
        // header bytes stay at 1 Mbps
        assert_eq!(Segment::at(Rate::Long11M, 23), Segment::Preamble);
        assert_eq!(Segment::at(Rate::Long11M, 24), Segment::Payload);
    }

    #[test]
    fn test_segments_short_preamble() {
        assert_eq!(Segment::at(Rate::Short5_5M, 8), Segment::Preamble);
        assert_eq!(Segment::at(Rate::Short5_5M, 9), Segment::Header);
        assert_eq!(Segment::at(Rate::Short5_5M, 14), Segment::Header);
        assert_eq!(Segment::at(Rate::Short5_5M, 15), Segment::Payload);
    }

    #[test]
    fn test_header_modulation_ignores_payload_rate() {
        for rate in [Rate::Short2M, Rate::Short5_5M, Rate::Short11M] {
            assert_eq!(Segment::Header.modulation(rate), Some(Modulation::Dqpsk2M));
            assert_eq!(Segment::Preamble.modulation(rate), Some(Modulation::Dbpsk1M));
        }
        assert_eq!(Segment::Trailer.modulation(Rate::Long1M), None);
        assert_eq!(Segment::Idle.modulation(Rate::Long1M), None);
    }

    #[test]
    fn test_expected_chip_count_scenarios() {
        assert_eq!(expected_chip_count(Rate::Long1M, 20), 1771);
        assert_eq!(expected_chip_count(Rate::Short2M, 16), 1111);
        // long 11M: 24 bytes at 88 chips, then 8 chips per byte
        assert_eq!(expected_chip_count(Rate::Long11M, 34), 24 * 88 + 10 * 8 + 11);
        // short 11M: 9 at 88, 6 at 44, rest at 8
        assert_eq!(
            expected_chip_count(Rate::Short11M, 115),
            9 * 88 + 6 * 44 + 100 * 8 + 11
        );
    }

    #[test]
    fn test_truncated_packets() {
        // a packet shorter than its preamble only pays for what it carries
        assert_eq!(expected_chip_count(Rate::Long5_5M, 5), 5 * 88 + 11);
        assert_eq!(expected_chip_count(Rate::Short11M, 12), 9 * 88 + 3 * 44 + 11);
        assert_eq!(expected_chip_count(Rate::Short11M, 0), 11);
    }

    #[test]
    fn test_oversized_packets() {
        assert_eq!(checked_chip_count(Rate::Long1M, 20), Some(1771));
        assert_eq!(checked_chip_count(Rate::Long1M, usize::MAX), None);
        assert_eq!(checked_chip_count(Rate::Short11M, usize::MAX / 8), None);
        // the unchecked count saturates instead of wrapping
        assert_eq!(expected_chip_count(Rate::Long2M, usize::MAX), usize::MAX);
    }

    #[test]
    fn test_budget_breakdown() {
        let budget = ChipBudget::new(Rate::Short5_5M, 20);
        assert_eq!(budget.preamble_bytes, 9);
        assert_eq!(budget.header_bytes, 6);
        assert_eq!(budget.payload_bytes, 5);
        assert_eq!(budget.payload_chips, 80);
        assert_eq!(budget.total(), 792 + 264 + 80 + 11);
    }
}
