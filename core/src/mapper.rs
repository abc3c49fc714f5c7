//! Per-rate byte to chip mappers
//!
//! Every mapper consumes exactly one byte, advances the shared phase
//! accumulator and writes a fixed number of chips. The caller checks that
//! the output slice has room for the whole run before calling.

use crate::cck::cck_symbol;
use crate::phase::{
    PhaseAccumulator, CCK_DQPSK_PHASE, CCK_QPSK_PHASE, DBPSK_PHASE, DQPSK_PHASE,
};
use crate::rate::Rate;
use crate::spread::spread_symbol;
use crate::{
    BARKER_LEN, CCK_11M_CHIPS_PER_BYTE, CCK_5_5M_CHIPS_PER_BYTE, CCK_CHIPS_PER_SYMBOL,
    DBPSK_CHIPS_PER_BYTE, DQPSK_CHIPS_PER_BYTE,
};
use num_complex::Complex32;
use std::f32::consts::PI;

/// Modulation applied to one byte
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modulation {
    /// DBPSK with Barker spreading, 1 Mbps
    Dbpsk1M,
    /// DQPSK with Barker spreading, 2 Mbps
    Dqpsk2M,
    /// CCK, 4 bits per symbol
    Cck5_5M,
    /// CCK, 8 bits per symbol
    Cck11M,
}

impl Modulation {
    /// Modulation used for the payload of a packet sent at `rate`
    pub fn for_payload(rate: Rate) -> Self {
        match rate {
            Rate::Long1M => Modulation::Dbpsk1M,
            Rate::Long2M | Rate::Short2M => Modulation::Dqpsk2M,
            Rate::Long5_5M | Rate::Short5_5M => Modulation::Cck5_5M,
            Rate::Long11M | Rate::Short11M => Modulation::Cck11M,
        }
    }

    pub fn chips_per_byte(&self) -> usize {
        match self {
            Modulation::Dbpsk1M => DBPSK_CHIPS_PER_BYTE,
            Modulation::Dqpsk2M => DQPSK_CHIPS_PER_BYTE,
            Modulation::Cck5_5M => CCK_5_5M_CHIPS_PER_BYTE,
            Modulation::Cck11M => CCK_11M_CHIPS_PER_BYTE,
        }
    }

    /// Map one byte, returning the number of chips written
    ///
    /// `even` selects the CCK DQPSK column for 11 Mbps and is ignored by the
    /// other modulations.
    pub fn map_byte(
        &self,
        acc: &mut PhaseAccumulator,
        byte: u8,
        even: bool,
        out: &mut [Complex32],
    ) -> usize {
        match self {
            Modulation::Dbpsk1M => dbpsk_1m_chips(acc, byte, out),
            Modulation::Dqpsk2M => dqpsk_2m_chips(acc, byte, out),
            Modulation::Cck5_5M => cck_5_5m_chips(acc, byte, out),
            Modulation::Cck11M => cck_11m_chips(acc, byte, even, out),
        }
    }
}

/// 1 Mbps: one DBPSK symbol per bit, LSB first, 8 × 11 chips
pub fn dbpsk_1m_chips(acc: &mut PhaseAccumulator, byte: u8, out: &mut [Complex32]) -> usize {
    for i in 0..8 {
        let bit = ((byte >> i) & 0x01) as usize;
        let phase = acc.advance(DBPSK_PHASE[bit]);
        let symbol = Complex32::from_polar(1.0, phase);
        spread_symbol(symbol, &mut out[i * BARKER_LEN..]);
    }
    DBPSK_CHIPS_PER_BYTE
}

/// 2 Mbps: one DQPSK symbol per dibit, LSB first, 4 × 11 chips
pub fn dqpsk_2m_chips(acc: &mut PhaseAccumulator, byte: u8, out: &mut [Complex32]) -> usize {
    for i in 0..4 {
        let dibit = ((byte >> (2 * i)) & 0x03) as usize;
        let phase = acc.advance(DQPSK_PHASE[dibit]);
        let symbol = Complex32::from_polar(1.0, phase);
        spread_symbol(symbol, &mut out[i * BARKER_LEN..]);
    }
    DQPSK_CHIPS_PER_BYTE
}

/// 5.5 Mbps: two CCK symbols, one per nibble
///
/// Bits 0-1 (4-5) pick the differential phase, bit 2 (6) picks p2 from
/// {π/2, 3π/2} and bit 3 (7) picks p4 from {0, π}; p3 is always 0.
pub fn cck_5_5m_chips(acc: &mut PhaseAccumulator, byte: u8, out: &mut [Complex32]) -> usize {
    for (half, column) in [(byte & 0x0F, 0usize), (byte >> 4, 1usize)] {
        let p2 = if (half >> 2) & 0x01 == 1 { 1.5 * PI } else { 0.5 * PI };
        let p4 = if (half >> 3) & 0x01 == 1 { PI } else { 0.0 };
        let p1 = acc.advance(CCK_DQPSK_PHASE[(half & 0x03) as usize][column]);
        cck_symbol(&mut out[column * CCK_CHIPS_PER_SYMBOL..], p1, p2, 0.0, p4);
    }
    CCK_5_5M_CHIPS_PER_BYTE
}

/// 11 Mbps: one CCK symbol per byte
///
/// Bits 0-1 pick the differential phase from the even or odd column, bit
/// pairs 2-3, 4-5 and 6-7 pick p2, p3 and p4 by QPSK.
pub fn cck_11m_chips(
    acc: &mut PhaseAccumulator,
    byte: u8,
    even: bool,
    out: &mut [Complex32],
) -> usize {
    let column = if even { 0 } else { 1 };
    let mut terms = [0.0f32; 3];
    for (i, term) in terms.iter_mut().enumerate() {
        let dibit = (byte >> ((i + 1) * 2)) & 0x03;
        *term = CCK_QPSK_PHASE[dibit as usize];
    }
    let p1 = acc.advance(CCK_DQPSK_PHASE[(byte & 0x03) as usize][column]);
    cck_symbol(out, p1, terms[0], terms[1], terms[2]);
    CCK_11M_CHIPS_PER_BYTE
}
