//! IEEE 802.11b DSSS chip mapper
//!
//! Turns rate-prefixed PPDU bytes into the complex chip stream of the
//! 802.11b physical layer: DBPSK/DQPSK with Barker-11 spreading at 1 and
//! 2 Mbps, CCK at 5.5 and 11 Mbps, long or short preamble.

pub mod error;
pub mod phase;
pub mod spread;
pub mod cck;
pub mod rate;
pub mod mapper;
pub mod framing;
pub mod encoder;
pub mod stream;

pub use encoder::{ChipMapper, ChipMapperConfig, MapperState};
pub use error::{ChipMapError, Result};
pub use framing::{checked_chip_count, expected_chip_count, Segment};
pub use rate::{Preamble, Rate};
pub use stream::{encode_packet, encode_packets, Block, StreamRunner, Tag, WorkOutput};

pub use num_complex::Complex32;

// Chip rate of the 802.11b DSSS PHY
pub const CHIP_RATE: u32 = 11_000_000;

// Segment configuration (bytes)
pub const LONG_PREAMBLE_BYTES: usize = 18;
pub const SHORT_PREAMBLE_BYTES: usize = 9;
pub const PLCP_HEADER_BYTES: usize = 6;

// Chips produced per input byte for each modulation
pub const DBPSK_CHIPS_PER_BYTE: usize = 88;
pub const DQPSK_CHIPS_PER_BYTE: usize = 44;
pub const CCK_5_5M_CHIPS_PER_BYTE: usize = 16;
pub const CCK_11M_CHIPS_PER_BYTE: usize = 8;

// Symbol sizes
pub const BARKER_LEN: usize = 11;
pub const CCK_CHIPS_PER_SYMBOL: usize = 8;

/// Largest chip run a single mapper call can write
pub const MAX_CHIPS_PER_BYTE: usize = DBPSK_CHIPS_PER_BYTE;

/// Fixed end-of-packet marker length
pub const TRAILER_CHIPS: usize = 11;

/// Stream tag key carrying packet lengths, unless configured otherwise
pub const DEFAULT_LENGTH_TAG: &str = "packet_len";
