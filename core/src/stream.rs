use crate::encoder::{ChipMapper, ChipMapperConfig};
use crate::error::{ChipMapError, Result};
use crate::rate::Rate;
use crate::MAX_CHIPS_PER_BYTE;
use log::trace;
use num_complex::Complex32;

/// Stream tag: a key/value pair attached to one item of a stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Absolute item index the tag is attached to
    pub offset: u64,
    pub key: String,
    pub value: i64,
    /// Name of the block that produced the tag
    pub srcid: Option<String>,
}

impl Tag {
    pub fn new(offset: u64, key: &str, value: i64) -> Self {
        Self {
            offset,
            key: key.to_string(),
            value,
            srcid: None,
        }
    }
}

/// Result of one `general_work` call
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkOutput {
    /// Input items consumed
    pub consumed: usize,
    /// Output items written to the front of the output buffer
    pub produced: usize,
    /// Tags published on the output stream, absolute offsets
    pub tags: Vec<Tag>,
}

/// A streaming block driven by a host scheduler
pub trait Block {
    type Input: Copy;
    type Output: Copy + Default;

    /// Input items needed to produce `noutput_items` output items
    fn forecast(&self, noutput_items: usize) -> usize;

    /// Process as much of `input` into `output` as fits
    ///
    /// `tags` are the input tags in the window, with absolute offsets.
    fn general_work(
        &mut self,
        input: &[Self::Input],
        tags: &[Tag],
        output: &mut [Self::Output],
    ) -> Result<WorkOutput>;

    /// Absolute input items consumed so far
    fn nitems_read(&self) -> u64;
}

/// Items and tags collected from a block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamOutput<T> {
    pub items: Vec<T>,
    pub tags: Vec<Tag>,
}

/// Minimal host: feeds a block bounded input and output windows until the
/// input is exhausted and the block stops producing
#[derive(Debug, Clone, Copy)]
pub struct StreamRunner {
    max_input_items: usize,
    max_output_items: usize,
}

impl Default for StreamRunner {
    fn default() -> Self {
        Self {
            max_input_items: 4096,
            max_output_items: 8192,
        }
    }
}

impl StreamRunner {
    /// Create a runner with per-call buffer limits
    /// max_output_items must hold the largest symbol run (88 chips)
    pub fn new(max_input_items: usize, max_output_items: usize) -> Result<Self> {
        if max_input_items == 0 {
            return Err(ChipMapError::InvalidConfig(
                "Input window must be > 0".to_string(),
            ));
        }
        if max_output_items < MAX_CHIPS_PER_BYTE {
            return Err(ChipMapError::InvalidConfig(format!(
                "Output window must hold at least {} items",
                MAX_CHIPS_PER_BYTE
            )));
        }

        Ok(Self {
            max_input_items,
            max_output_items,
        })
    }

    /// Run `block` over `input`
    ///
    /// Tag offsets in `tags` are indices into `input`; the runner maps them
    /// onto the block's absolute item count. Input windows are sized from
    /// the block's forecast, capped at `max_input_items`.
    pub fn run<B: Block>(
        &self,
        block: &mut B,
        input: &[B::Input],
        tags: &[Tag],
    ) -> Result<StreamOutput<B::Output>> {
        let base = block.nitems_read();
        let mut read = 0usize;
        let mut output = StreamOutput {
            items: Vec::new(),
            tags: Vec::new(),
        };
        let mut out_buf = vec![B::Output::default(); self.max_output_items];

        loop {
            let wanted = block
                .forecast(self.max_output_items)
                .clamp(1, self.max_input_items);
            let end = (read + wanted).min(input.len());
            let window_tags: Vec<Tag> = tags
                .iter()
                .filter(|tag| (read as u64..end as u64).contains(&tag.offset))
                .map(|tag| Tag {
                    offset: base + tag.offset,
                    ..tag.clone()
                })
                .collect();

            let result = block.general_work(&input[read..end], &window_tags, &mut out_buf)?;
            trace!(
                "window {}..{}: consumed={} produced={}",
                read,
                end,
                result.consumed,
                result.produced
            );

            output.items.extend_from_slice(&out_buf[..result.produced]);
            output.tags.extend(result.tags);
            read += result.consumed;

            if result.consumed == 0 && result.produced == 0 {
                if read == input.len() {
                    break;
                }
                return Err(ChipMapError::StreamStalled {
                    consumed: read,
                    produced: output.items.len(),
                });
            }
        }

        Ok(output)
    }
}

/// Build the tagged byte stream for a sequence of packets
///
/// Each packet becomes its rate selector followed by its PPDU bytes, with a
/// length tag (selector included) on the selector byte.
pub fn packet_stream(packets: &[(Rate, &[u8])], length_tag_key: &str) -> (Vec<u8>, Vec<Tag>) {
    let mut bytes = Vec::new();
    let mut tags = Vec::with_capacity(packets.len());
    for (rate, ppdu) in packets {
        tags.push(Tag::new(
            bytes.len() as u64,
            length_tag_key,
            (ppdu.len() + 1) as i64,
        ));
        bytes.push(rate.selector());
        bytes.extend_from_slice(ppdu);
    }
    (bytes, tags)
}

/// Encode several packets back to back into one chip stream
pub fn encode_packets(packets: &[(Rate, &[u8])]) -> Result<Vec<Complex32>> {
    if packets.iter().any(|(_, ppdu)| ppdu.is_empty()) {
        return Err(ChipMapError::InvalidInputSize);
    }

    let config = ChipMapperConfig::default();
    let (bytes, tags) = packet_stream(packets, &config.length_tag_key);
    let mut mapper = ChipMapper::new(config)?;
    let output = StreamRunner::default().run(&mut mapper, &bytes, &tags)?;
    Ok(output.items)
}

/// Encode one PPDU (preamble, header and PSDU bytes) at `rate`
pub fn encode_packet(rate: Rate, ppdu: &[u8]) -> Result<Vec<Complex32>> {
    encode_packets(&[(rate, ppdu)])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{expected_chip_count, DEFAULT_LENGTH_TAG};

    /// Block that doubles each input byte into two output bytes
    struct Doubler {
        read: u64,
    }

    impl Block for Doubler {
        type Input = u8;
        type Output = u8;

        fn forecast(&self, noutput_items: usize) -> usize {
            noutput_items / 2
        }

        fn general_work(
            &mut self,
            input: &[u8],
            _tags: &[Tag],
            output: &mut [u8],
        ) -> Result<WorkOutput> {
            let n = input.len().min(output.len() / 2);
            for (i, &b) in input[..n].iter().enumerate() {
                output[2 * i] = b;
                output[2 * i + 1] = b;
            }
            self.read += n as u64;
            Ok(WorkOutput {
                consumed: n,
                produced: 2 * n,
                tags: Vec::new(),
            })
        }

        fn nitems_read(&self) -> u64 {
            self.read
        }
    }

    /// Block that never makes progress
    struct Stuck;

    impl Block for Stuck {
        type Input = u8;
        type Output = u8;

        fn forecast(&self, _noutput_items: usize) -> usize {
            1
        }

        fn general_work(&mut self, _: &[u8], _: &[Tag], _: &mut [u8]) -> Result<WorkOutput> {
            Ok(WorkOutput::default())
        }

        fn nitems_read(&self) -> u64 {
            0
        }
    }

    #[test]
    fn test_runner_config_validation() {
        assert!(StreamRunner::new(0, 1024).is_err());
        assert!(StreamRunner::new(16, 87).is_err());
        assert!(StreamRunner::new(1, 88).is_ok());
    }

    #[test]
    fn test_runner_drains_input() {
        let runner = StreamRunner::new(3, 100).unwrap();
        let mut block = Doubler { read: 0 };
        let input: Vec<u8> = (0..50).collect();

        let output = runner.run(&mut block, &input, &[]).unwrap();
        assert_eq!(output.items.len(), 100);
        assert_eq!(output.items[98], 49);
        assert_eq!(block.nitems_read(), 50);
    }

    #[test]
    fn test_runner_reports_stall() {
        let runner = StreamRunner::default();
        match runner.run(&mut Stuck, &[1, 2, 3], &[]) {
            Err(ChipMapError::StreamStalled { consumed, produced }) => {
                assert_eq!(consumed, 0);
                assert_eq!(produced, 0);
            }
            other => panic!("expected StreamStalled, got {:?}", other.map(|o| o.items)),
        }
    }

    #[test]
    fn test_packet_stream_layout() {
        let a = [0xAAu8; 3];
        let b = [0xBBu8; 5];
        let (bytes, tags) = packet_stream(&[(Rate::Long2M, &a[..]), (Rate::Short11M, &b[..])], "len");

        assert_eq!(bytes.len(), 10);
        assert_eq!(bytes[0], 1);
        assert_eq!(bytes[4], 6);
        assert_eq!(tags[0], Tag::new(0, "len", 4));
        assert_eq!(tags[1], Tag::new(4, "len", 6));
    }

    #[test]
    fn test_encode_packet_counts() {
        let ppdu = vec![0x5Au8; 40];
        for rate in Rate::ALL {
            let chips = encode_packet(rate, &ppdu).unwrap();
            assert_eq!(chips.len(), expected_chip_count(rate, 40), "{}", rate);
        }
    }

    #[test]
    fn test_encode_packet_rejects_empty() {
        assert!(matches!(
            encode_packet(Rate::Long1M, &[]),
            Err(ChipMapError::InvalidInputSize)
        ));
    }

    #[test]
    fn test_runner_maps_tags_to_absolute_offsets() {
        let mut mapper = ChipMapper::new(ChipMapperConfig::default()).unwrap();
        let runner = StreamRunner::new(7, 200).unwrap();
        let ppdu = [0u8; 20];

        let (bytes, tags) = packet_stream(&[(Rate::Long1M, &ppdu[..])], DEFAULT_LENGTH_TAG);
        let first = runner.run(&mut mapper, &bytes, &tags).unwrap();
        // second run continues the same stream; offsets stay relative to its input
        let second = runner.run(&mut mapper, &bytes, &tags).unwrap();

        assert_eq!(first.tags[0].offset, 0);
        assert_eq!(second.tags[0].offset, first.items.len() as u64);
        assert_eq!(first.items, second.items);
    }
}
