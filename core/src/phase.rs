use serde::{Deserialize, Serialize};
use std::f32::consts::{PI, TAU};

/// DBPSK phase change per bit value
pub const DBPSK_PHASE: [f32; 2] = [0.0, PI];

/// DQPSK phase change per dibit value (bit 0 is the first transmitted bit)
pub const DQPSK_PHASE: [f32; 4] = [0.0, 1.5 * PI, 0.5 * PI, PI];

/// CCK DQPSK phase change per dibit, column 0 for even symbols and column 1
/// for odd symbols
pub const CCK_DQPSK_PHASE: [[f32; 2]; 4] = [
    [0.0, PI],
    [1.5 * PI, 0.5 * PI],
    [0.5 * PI, 1.5 * PI],
    [PI, 0.0],
];

/// QPSK phase for the CCK phase terms p2..p4
pub const CCK_QPSK_PHASE: [f32; 4] = [0.0, PI, 0.5 * PI, 1.5 * PI];

/// Wrap a phase into (-2π, 2π)
pub fn wrap_phase(mut phase: f32) -> f32 {
    while phase >= TAU {
        phase -= TAU;
    }
    while phase <= -TAU {
        phase += TAU;
    }
    phase
}

/// Differential phase carried across every symbol of one packet
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PhaseAccumulator {
    phase: f32,
}

impl PhaseAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a phase increment, wrap, and return the new phase
    pub fn advance(&mut self, delta: f32) -> f32 {
        self.phase = wrap_phase(self.phase + delta);
        self.phase
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn reset(&mut self) {
        self.phase = 0.0;
    }
}
