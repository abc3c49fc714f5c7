use crate::BARKER_LEN;
use num_complex::Complex32;

/// 11-chip Barker code used by the 802.11 DSSS PHY at 1 and 2 Mbps
/// Properties: autocorrelation peak of 11, sidelobe magnitude at most 1
pub const BARKER_11: [f32; BARKER_LEN] = [
    1.0, -1.0, 1.0, 1.0, -1.0, 1.0, 1.0, 1.0, -1.0, -1.0, -1.0,
];

/// Spread one differential symbol across the Barker sequence
///
/// Writes exactly `BARKER_LEN` chips to the front of `out`; the caller
/// guarantees the slice is long enough.
pub fn spread_symbol(symbol: Complex32, out: &mut [Complex32]) {
    for (chip, &barker) in out[..BARKER_LEN].iter_mut().zip(BARKER_11.iter()) {
        *chip = symbol * barker;
    }
}
