use clap::{Parser, Subcommand};
use hound::WavSpec;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use wifi_dsss_core::framing::ChipBudget;
use wifi_dsss_core::stream::packet_stream;
use wifi_dsss_core::{
    checked_chip_count, ChipMapper, ChipMapperConfig, Complex32, Rate, StreamRunner, CHIP_RATE,
};

#[derive(Parser)]
#[command(name = "wifi-dsss")]
#[command(about = "IEEE 802.11b DSSS/CCK chip mapper")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Encode PPDU files (preamble, header and PSDU bytes) into a chip stream
    Encode {
        /// Input PPDU files, one packet each, encoded back to back
        #[arg(value_name = "PPDU.BIN", required = true)]
        inputs: Vec<PathBuf>,

        /// Output file: .wav (2-channel float I/Q at 11 MHz) or raw cf32
        #[arg(short, long, value_name = "OUTPUT")]
        output: PathBuf,

        /// Rate and preamble (long1m, long2m, long5.5m, long11m, short2m,
        /// short5.5m, short11m, or selector 0-6)
        #[arg(short, long, default_value = "long1m")]
        rate: Rate,

        /// Maximum input bytes handed to the mapper per call
        #[arg(long, default_value = "4096")]
        chunk_size: usize,

        /// Output buffer size in chips per call (at least 88)
        #[arg(long, default_value = "8192")]
        output_buffer: usize,

        /// Length tag key used on the input and output streams
        #[arg(long, default_value = wifi_dsss_core::DEFAULT_LENGTH_TAG)]
        length_tag: String,
    },

    /// Show the chip budget of a packet
    Info {
        /// Rate and preamble
        #[arg(short, long)]
        rate: Rate,

        /// PPDU length in bytes (preamble, header and PSDU)
        #[arg(short, long)]
        bytes: usize,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Serialize)]
struct InfoReport {
    rate: Rate,
    selector: u8,
    mbps: f32,
    bytes: usize,
    budget: ChipBudget,
    total_chips: usize,
    duration_us: f64,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Encode {
            inputs,
            output,
            rate,
            chunk_size,
            output_buffer,
            length_tag,
        } => encode_command(&inputs, &output, rate, chunk_size, output_buffer, &length_tag)?,
        Commands::Info { rate, bytes, json } => info_command(rate, bytes, json)?,
    }

    Ok(())
}

fn encode_command(
    input_paths: &[PathBuf],
    output_path: &PathBuf,
    rate: Rate,
    chunk_size: usize,
    output_buffer: usize,
    length_tag: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    // Read one packet per input file
    let mut ppdus = Vec::with_capacity(input_paths.len());
    for path in input_paths {
        let data = std::fs::read(path)?;
        if data.is_empty() {
            return Err(format!("{} is empty", path.display()).into());
        }
        println!("Read {} bytes from {}", data.len(), path.display());
        ppdus.push(data);
    }

    let packets: Vec<(Rate, &[u8])> = ppdus.iter().map(|p| (rate, p.as_slice())).collect();
    let (bytes, tags) = packet_stream(&packets, length_tag);

    let mut mapper = ChipMapper::new(ChipMapperConfig::with_length_tag(length_tag))?;
    let runner = StreamRunner::new(chunk_size, output_buffer)?;
    let stream = runner.run(&mut mapper, &bytes, &tags)?;

    for tag in &stream.tags {
        info!("packet at chip {}: {} chips", tag.offset, tag.value);
    }
    println!(
        "Encoded {} packet(s) at {} to {} chips",
        stream.tags.len(),
        rate,
        stream.items.len()
    );

    let is_wav = output_path
        .extension()
        .map_or(false, |ext| ext.eq_ignore_ascii_case("wav"));
    if is_wav {
        write_wav(output_path, &stream.items)?;
    } else {
        write_cf32(output_path, &stream.items)?;
    }

    println!("Wrote {} chips to {}", stream.items.len(), output_path.display());
    Ok(())
}

fn write_wav(path: &Path, chips: &[Complex32]) -> Result<(), Box<dyn std::error::Error>> {
    // I on the left channel, Q on the right
    let spec = WavSpec {
        channels: 2,
        sample_rate: CHIP_RATE,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };

    let file = File::create(path)?;
    let mut writer = hound::WavWriter::new(BufWriter::new(file), spec)?;
    for chip in chips {
        writer.write_sample(chip.re)?;
        writer.write_sample(chip.im)?;
    }
    writer.finalize()?;
    Ok(())
}

fn write_cf32(path: &Path, chips: &[Complex32]) -> Result<(), Box<dyn std::error::Error>> {
    // Interleaved little-endian float I/Q
    let mut writer = BufWriter::new(File::create(path)?);
    for chip in chips {
        writer.write_all(&chip.re.to_le_bytes())?;
        writer.write_all(&chip.im.to_le_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

fn info_command(rate: Rate, bytes: usize, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    let total_chips = checked_chip_count(rate, bytes)
        .ok_or_else(|| format!("{} bytes at {} overflows the chip count", bytes, rate))?;
    let budget = ChipBudget::new(rate, bytes);
    let report = InfoReport {
        rate,
        selector: rate.selector(),
        mbps: rate.mbps(),
        bytes,
        budget,
        total_chips,
        duration_us: total_chips as f64 / (CHIP_RATE as f64 / 1e6),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Rate: {} (selector {}, {:?} preamble)", rate, rate.selector(), rate.preamble());
    println!(
        "Preamble: {} bytes -> {} chips",
        budget.preamble_bytes, budget.preamble_chips
    );
    println!(
        "Header:   {} bytes -> {} chips",
        budget.header_bytes, budget.header_chips
    );
    println!(
        "Payload:  {} bytes -> {} chips",
        budget.payload_bytes, budget.payload_chips
    );
    println!("Trailer:  {} chips", budget.trailer_chips);
    println!("Total:    {} chips ({:.1} us)", total_chips, report.duration_us);
    Ok(())
}
