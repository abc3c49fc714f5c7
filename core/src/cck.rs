use crate::phase::wrap_phase;
use crate::CCK_CHIPS_PER_SYMBOL;
use num_complex::Complex32;
use std::f32::consts::PI;

/// Generate one Complementary Code Keying symbol
///
/// `p1` is the accumulated base phase, `p2..p4` the per-dibit phase terms.
/// Chip phases follow the 802.11b code word:
/// {p1+p2+p3+p4, p1+p3+p4, p1+p2+p4, p1+p4+π, p1+p2+p3, p1+p3, p1+p2+π, p1}
pub fn cck_symbol(out: &mut [Complex32], p1: f32, p2: f32, p3: f32, p4: f32) {
    let phases: [f32; CCK_CHIPS_PER_SYMBOL] = [
        p1 + p2 + p3 + p4,
        p1 + p3 + p4,
        p1 + p2 + p4,
        p1 + p4 + PI,
        p1 + p2 + p3,
        p1 + p3,
        p1 + p2 + PI,
        p1,
    ];
    for (chip, phase) in out[..CCK_CHIPS_PER_SYMBOL].iter_mut().zip(phases) {
        *chip = Complex32::from_polar(1.0, wrap_phase(phase));
    }
}
