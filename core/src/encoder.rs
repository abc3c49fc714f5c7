use crate::error::{ChipMapError, Result};
use crate::framing::{checked_chip_count, Segment, TRAILER};
use crate::phase::PhaseAccumulator;
use crate::rate::Rate;
use crate::stream::{Block, Tag, WorkOutput};
use crate::{DEFAULT_LENGTH_TAG, TRAILER_CHIPS};
use log::{debug, trace, warn};
use num_complex::Complex32;
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

/// Configuration for the chip mapper block
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChipMapperConfig {
    /// Tag key carrying packet lengths on both the input and output streams
    pub length_tag_key: String,
    /// Source id attached to the tags this block publishes
    pub alias: String,
}

impl Default for ChipMapperConfig {
    fn default() -> Self {
        Self {
            length_tag_key: DEFAULT_LENGTH_TAG.to_string(),
            alias: "ppdu_chip_mapper_bc".to_string(),
        }
    }
}

impl ChipMapperConfig {
    pub fn with_length_tag(key: &str) -> Self {
        Self {
            length_tag_key: key.to_string(),
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.length_tag_key.trim().is_empty() {
            return Err(ChipMapError::InvalidConfig(
                "Length tag key must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Complete encoder state
///
/// Plain data so a host can persist an encoder between calls and resume it
/// later with [`ChipMapper::restore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapperState {
    /// Rate of the packet in progress (or of the last packet)
    pub rate: Rate,
    /// Bytes of the current packet already converted
    pub copied: usize,
    /// Bytes in the current packet, rate selector excluded
    pub count: usize,
    /// Differential phase carried between symbols
    pub phase: PhaseAccumulator,
    /// Payload symbols sent so far; parity picks the 11 Mbps CCK column
    pub psdu_symbols: u64,
    /// Trailer progress, `TRAILER_CHIPS` when no trailer is pending
    pub trailer: usize,
    /// Absolute input items consumed
    pub nitems_read: u64,
    /// Absolute output items produced
    pub nitems_written: u64,
}

impl Default for MapperState {
    fn default() -> Self {
        Self {
            rate: Rate::default(),
            copied: 0,
            count: 0,
            phase: PhaseAccumulator::new(),
            psdu_symbols: 0,
            trailer: TRAILER_CHIPS,
            nitems_read: 0,
            nitems_written: 0,
        }
    }
}

impl MapperState {
    fn segment(&self) -> Segment {
        if self.copied < self.count {
            Segment::at(self.rate, self.copied)
        } else if self.trailer < TRAILER_CHIPS {
            Segment::Trailer
        } else {
            Segment::Idle
        }
    }

    fn check(&self) -> Result<()> {
        if self.copied > self.count {
            return Err(ChipMapError::Snapshot(format!(
                "copied {} exceeds packet length {}",
                self.copied, self.count
            )));
        }
        if self.trailer > TRAILER_CHIPS {
            return Err(ChipMapError::Snapshot(format!(
                "trailer state {} out of range",
                self.trailer
            )));
        }
        let phase = self.phase.phase();
        if !phase.is_finite() || phase <= -TAU || phase >= TAU {
            return Err(ChipMapError::Snapshot(format!("phase {} not wrapped", phase)));
        }
        Ok(())
    }
}

/// Streaming 802.11b PPDU to chip mapper
///
/// Input is a byte stream where every packet starts with a rate-selector
/// byte carrying a length tag (selector included in the length). Output is
/// the chip stream: preamble, header and payload chips followed by an
/// 11-chip trailer, with a length tag on the first chip of each packet.
pub struct ChipMapper {
    config: ChipMapperConfig,
    state: MapperState,
}

impl ChipMapper {
    pub fn new(config: ChipMapperConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: MapperState::default(),
        })
    }

    /// Resume an encoder from a snapshot taken with [`ChipMapper::snapshot`]
    pub fn restore(config: ChipMapperConfig, state: MapperState) -> Result<Self> {
        config.validate()?;
        state.check()?;
        Ok(Self { config, state })
    }

    pub fn snapshot(&self) -> MapperState {
        self.state.clone()
    }

    pub fn config(&self) -> &ChipMapperConfig {
        &self.config
    }

    pub fn segment(&self) -> Segment {
        self.state.segment()
    }

    pub fn rate(&self) -> Rate {
        self.state.rate
    }

    pub fn phase(&self) -> f32 {
        self.state.phase.phase()
    }

    pub fn nitems_read(&self) -> u64 {
        self.state.nitems_read
    }

    pub fn nitems_written(&self) -> u64 {
        self.state.nitems_written
    }

    /// Input bytes needed to produce `noutput_items` chips in the current
    /// segment
    pub fn forecast(&self, noutput_items: usize) -> usize {
        let segment = self.segment();
        match segment.modulation(self.state.rate) {
            Some(modulation) => noutput_items.div_ceil(modulation.chips_per_byte()),
            // the trailer needs no input, an idle mapper needs a rate selector
            None if segment == Segment::Trailer => 0,
            None => 1,
        }
    }

    /// Convert whole bytes of the current packet into chips
    ///
    /// Stops when input runs out, the next byte's chips would not fit, or the
    /// packet is complete. Returns (bytes consumed, chips produced).
    pub fn chip_gen(&mut self, input: &[u8], output: &mut [Complex32]) -> (usize, usize) {
        let state = &mut self.state;
        let mut nconsume = 0;
        let mut nout = 0;

        while nconsume < input.len() && nout < output.len() && state.copied < state.count {
            let segment = Segment::at(state.rate, state.copied);
            let Some(modulation) = segment.modulation(state.rate) else {
                break;
            };
            if nout + modulation.chips_per_byte() > output.len() {
                break;
            }

            let even = state.psdu_symbols % 2 == 0;
            let written =
                modulation.map_byte(&mut state.phase, input[nconsume], even, &mut output[nout..]);
            nout += written;
            nconsume += 1;
            state.copied += 1;
            if segment == Segment::Payload {
                state.psdu_symbols += state.rate.symbols_per_byte();
            }
        }

        (nconsume, nout)
    }

    /// Reset for the packet whose rate selector is `selector` and whose
    /// length tag holds `tag_value`
    ///
    /// Returns the number of chips the packet will produce, or `None` when
    /// the packet is rejected.
    fn start_packet(&mut self, selector: u8, tag_value: i64) -> Option<i64> {
        let state = &mut self.state;
        state.copied = 0;
        state.count = 0;
        state.phase.reset();
        state.psdu_symbols = 0;
        state.trailer = TRAILER_CHIPS;

        let rate = match Rate::try_from(selector) {
            Ok(rate) => rate,
            Err(e) => {
                warn!("{}: dropping packet at item {}", e, state.nitems_read);
                state.rate = Rate::default();
                return None;
            }
        };
        state.rate = rate;

        if tag_value < 1 {
            warn!(
                "Invalid packet length {} at item {}, dropping packet",
                tag_value, state.nitems_read
            );
            return None;
        }

        // the output tag must be able to carry the chip count
        let sized = usize::try_from(tag_value - 1).ok().and_then(|count| {
            let chips = checked_chip_count(rate, count)?;
            i64::try_from(chips).ok().map(|chips| (count, chips))
        });
        let Some((count, chips)) = sized else {
            warn!(
                "Packet length {} at item {} too large, dropping packet",
                tag_value, state.nitems_read
            );
            return None;
        };

        state.count = count;
        if state.count == 0 {
            state.trailer = 0;
        }
        debug!(
            "New packet: rate={} bytes={} chips={}",
            rate, state.count, chips
        );
        Some(chips)
    }

    fn length_tag_at<'a>(&self, tags: &'a [Tag], offset: u64) -> Option<&'a Tag> {
        tags.iter()
            .find(|tag| tag.offset == offset && tag.key == self.config.length_tag_key)
    }

    /// Offset of the first length tag after `offset`, if any
    fn next_length_tag(&self, tags: &[Tag], offset: u64) -> Option<u64> {
        tags.iter()
            .filter(|tag| tag.offset > offset && tag.key == self.config.length_tag_key)
            .map(|tag| tag.offset)
            .min()
    }

    /// Run the mapper over one window of input and output
    ///
    /// `tags` holds the tags attached to the input window with absolute
    /// offsets. The mapper may finish one packet and start the next within a
    /// single call.
    pub fn work(
        &mut self,
        input: &[u8],
        tags: &[Tag],
        output: &mut [Complex32],
    ) -> WorkOutput {
        let mut consumed = 0;
        let mut produced = 0;
        let mut out_tags = Vec::new();

        loop {
            match self.segment() {
                Segment::Preamble | Segment::Header | Segment::Payload => {
                    let remaining = self.state.count - self.state.copied;
                    let nin = remaining.min(input.len() - consumed);
                    let (ncon, nout) = self.chip_gen(
                        &input[consumed..consumed + nin],
                        &mut output[produced..],
                    );
                    consumed += ncon;
                    produced += nout;

                    if self.state.copied == self.state.count {
                        self.state.trailer = 0;
                    } else {
                        break;
                    }
                }
                Segment::Trailer => {
                    if output.len() - produced < TRAILER_CHIPS {
                        break;
                    }
                    output[produced..produced + TRAILER_CHIPS].copy_from_slice(&TRAILER);
                    produced += TRAILER_CHIPS;
                    self.state.trailer = TRAILER_CHIPS;
                    self.state.count = 0;
                    self.state.copied = 0;
                    debug!(
                        "Packet complete at output item {}",
                        self.state.nitems_written + produced as u64
                    );
                }
                Segment::Idle => {
                    if consumed == input.len() {
                        break;
                    }
                    let offset = self.state.nitems_read + consumed as u64;
                    match self.length_tag_at(tags, offset).map(|tag| tag.value) {
                        Some(tag_value) => {
                            let selector = input[consumed];
                            consumed += 1;
                            if let Some(chips) = self.start_packet(selector, tag_value) {
                                out_tags.push(Tag {
                                    offset: self.state.nitems_written + produced as u64,
                                    key: self.config.length_tag_key.clone(),
                                    value: chips,
                                    srcid: Some(self.config.alias.clone()),
                                });
                            }
                        }
                        None => {
                            let available = (input.len() - consumed) as u64;
                            let skip = self
                                .next_length_tag(tags, offset)
                                .map_or(available, |next| (next - offset).min(available));
                            trace!("Discarding {} untagged bytes at item {}", skip, offset);
                            consumed += skip as usize;
                        }
                    }
                }
            }
        }

        self.state.nitems_read += consumed as u64;
        self.state.nitems_written += produced as u64;
        trace!(
            "work: consumed={} produced={} segment={:?}",
            consumed,
            produced,
            self.segment()
        );

        WorkOutput {
            consumed,
            produced,
            tags: out_tags,
        }
    }
}

impl Block for ChipMapper {
    type Input = u8;
    type Output = Complex32;

    fn forecast(&self, noutput_items: usize) -> usize {
        ChipMapper::forecast(self, noutput_items)
    }

    /// Never fails: malformed packets are dropped inside [`ChipMapper::work`]
    fn general_work(
        &mut self,
        input: &[u8],
        tags: &[Tag],
        output: &mut [Complex32],
    ) -> Result<WorkOutput> {
        Ok(self.work(input, tags, output))
    }

    fn nitems_read(&self) -> u64 {
        self.state.nitems_read
    }
}
