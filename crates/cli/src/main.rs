use std::fs::File;
use std::io::{BufReader, BufWriter, Cursor};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

use walkie_codec_core::stream::{pcm_from_le_bytes, pcm_to_le_bytes, split_frames};
use walkie_codec_core::{
    ApplicationProfile, CodecConfig, EngineBackend, PacketReader, PacketWriter, SampleRate,
};

/// Encode and decode push-to-talk voice files
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Encode raw 16-bit little-endian PCM into a framed packet file
    Encode {
        /// Raw PCM input
        #[arg(short, long)]
        input: PathBuf,

        /// Packet file to write
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        codec: CodecArgs,

        /// Print statistics
        #[arg(short, long)]
        stats: bool,
    },
    /// Decode a framed packet file back into raw PCM
    Decode {
        /// Packet file input
        #[arg(short, long)]
        input: PathBuf,

        /// Raw PCM file to write
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        codec: CodecArgs,

        /// Print statistics
        #[arg(short, long)]
        stats: bool,
    },
    /// Encode and decode raw PCM in memory and report packet statistics
    Roundtrip {
        /// Raw PCM input
        #[arg(short, long)]
        input: PathBuf,

        /// Optionally write the decoded PCM here
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        codec: CodecArgs,
    },
}

/// Session settings; explicit flags override the config file
#[derive(Args, Debug, Default)]
struct CodecArgs {
    /// TOML file with a codec configuration
    #[arg(short, long, env = "WALKIE_CONFIG")]
    config: Option<PathBuf>,

    /// Sample rate in Hz (8000, 12000, 16000, 24000, 48000)
    #[arg(short = 'r', long)]
    sample_rate: Option<u32>,

    /// Channel count (1 or 2)
    #[arg(short = 'n', long)]
    channels: Option<u8>,

    /// Samples per channel in one frame
    #[arg(short = 'f', long)]
    frame_size: Option<usize>,

    /// Application profile (voice, audio, low-delay)
    #[arg(short, long)]
    application: Option<ApplicationProfile>,

    /// Target bitrate in bits per second
    #[arg(short, long)]
    bitrate: Option<u32>,

    /// Engine backend (opus, pcm)
    #[arg(long)]
    backend: Option<EngineBackend>,
}

impl CodecArgs {
    fn resolve(&self) -> Result<CodecConfig> {
        let mut config = match &self.config {
            Some(path) => CodecConfig::from_file(path)
                .with_context(|| format!("failed to load config {}", path.display()))?,
            None => CodecConfig::default(),
        };

        if let Some(hz) = self.sample_rate {
            config.sample_rate = SampleRate::from_hz(hz)?;
        }
        if let Some(channels) = self.channels {
            config.channels = channels;
        }
        if let Some(frame_size) = self.frame_size {
            config.frame_size = frame_size;
        }
        if let Some(application) = self.application {
            config.application = application;
        }
        if let Some(bitrate) = self.bitrate {
            config.bitrate = Some(bitrate);
        }
        if let Some(backend) = self.backend {
            config.backend = backend;
        }

        config.validate()?;
        Ok(config)
    }
}

/// Totals collected while processing a file
#[derive(Debug, Default)]
struct Stats {
    frames: u64,
    pcm_bytes: u64,
    packet_bytes: u64,
    largest_packet: usize,
    elapsed: Duration,
}

impl Stats {
    fn print(&self, config: &CodecConfig) {
        let audio_secs = self.frames as f64 * config.frame_duration_ms() / 1000.0;

        println!("Statistics:");
        println!("  Configuration: {}", config);
        println!("  Frames: {}", self.frames);
        println!("  Audio duration: {:.2} s", audio_secs);
        println!("  Processing time: {:.2?}", self.elapsed);
        println!("  PCM size: {} bytes", self.pcm_bytes);
        println!("  Packet size: {} bytes (framed)", self.packet_bytes);
        println!("  Largest packet: {} bytes", self.largest_packet);
        if self.packet_bytes > 0 {
            println!(
                "  Compression ratio: {:.2}:1",
                self.pcm_bytes as f64 / self.packet_bytes as f64
            );
        }
        if audio_secs > 0.0 {
            println!(
                "  Average bitrate: {:.1} kbit/s",
                self.packet_bytes as f64 * 8.0 / audio_secs / 1000.0
            );
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    match cli.command {
        Command::Encode {
            input,
            output,
            codec,
            stats,
        } => {
            let config = codec.resolve()?;
            let summary = encode_file(&input, &output, &config)?;
            info!(
                "Encoded {} frames from {} into {}",
                summary.frames,
                input.display(),
                output.display()
            );
            if stats {
                summary.print(&config);
            }
        }
        Command::Decode {
            input,
            output,
            codec,
            stats,
        } => {
            let config = codec.resolve()?;
            let summary = decode_file(&input, &output, &config)?;
            info!(
                "Decoded {} frames from {} into {}",
                summary.frames,
                input.display(),
                output.display()
            );
            if stats {
                summary.print(&config);
            }
        }
        Command::Roundtrip {
            input,
            output,
            codec,
        } => {
            let config = codec.resolve()?;
            let (summary, decoded) = roundtrip(&read_pcm(&input)?, &config)?;
            if let Some(output) = output {
                std::fs::write(&output, pcm_to_le_bytes(&decoded))
                    .with_context(|| format!("failed to write {}", output.display()))?;
            }
            summary.print(&config);
        }
    }

    Ok(())
}

fn read_pcm(path: &Path) -> Result<Vec<i16>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    if bytes.len() % 2 != 0 {
        warn!("Input size is not a multiple of 2 bytes, dropping the last byte");
    }
    let pcm = pcm_from_le_bytes(&bytes);
    if pcm.is_empty() {
        bail!("{} holds no PCM samples", path.display());
    }
    debug!("Read {} samples from {}", pcm.len(), path.display());
    Ok(pcm)
}

fn encode_file(input: &Path, output: &Path, config: &CodecConfig) -> Result<Stats> {
    let pcm = read_pcm(input)?;
    let file = File::create(output)
        .with_context(|| format!("failed to create {}", output.display()))?;

    let start = Instant::now();
    let mut writer = PacketWriter::new(BufWriter::new(file), config.clone())?;
    let mut stats = Stats {
        pcm_bytes: pcm.len() as u64 * 2,
        ..Stats::default()
    };
    for frame in split_frames(&pcm, config.samples_per_frame()) {
        let len = writer.write_frame(&frame)?;
        stats.largest_packet = stats.largest_packet.max(len);
    }
    stats.frames = writer.session().frames_processed();
    stats.packet_bytes = writer.bytes_written();
    writer.finish()?;
    stats.elapsed = start.elapsed();

    Ok(stats)
}

fn decode_file(input: &Path, output: &Path, config: &CodecConfig) -> Result<Stats> {
    let file = File::open(input).with_context(|| format!("failed to open {}", input.display()))?;
    let packet_bytes = file.metadata()?.len();

    let start = Instant::now();
    let mut reader = PacketReader::new(BufReader::new(file), config.clone())?;
    let mut decoded = Vec::new();
    while let Some(frame) = reader.next_frame()? {
        decoded.extend_from_slice(&frame);
    }
    let frames = reader.session().frames_processed();
    reader.into_inner();

    let bytes = pcm_to_le_bytes(&decoded);
    std::fs::write(output, &bytes)
        .with_context(|| format!("failed to write {}", output.display()))?;

    Ok(Stats {
        frames,
        pcm_bytes: bytes.len() as u64,
        packet_bytes,
        largest_packet: 0,
        elapsed: start.elapsed(),
    })
}

fn roundtrip(pcm: &[i16], config: &CodecConfig) -> Result<(Stats, Vec<i16>)> {
    let start = Instant::now();
    let mut writer = PacketWriter::new(Vec::new(), config.clone())?;
    let mut largest_packet = 0;
    for frame in split_frames(pcm, config.samples_per_frame()) {
        largest_packet = largest_packet.max(writer.write_frame(&frame)?);
    }
    let frames = writer.session().frames_processed();
    let packets = writer.finish()?;
    let packet_bytes = packets.len() as u64;

    let mut reader = PacketReader::new(Cursor::new(packets), config.clone())?;
    let mut decoded = Vec::with_capacity(pcm.len());
    while let Some(frame) = reader.next_frame()? {
        decoded.extend_from_slice(&frame);
    }
    if reader.session().frames_processed() != frames {
        bail!(
            "decoded {} frames but encoded {}",
            reader.session().frames_processed(),
            frames
        );
    }
    reader.into_inner();

    let stats = Stats {
        frames,
        pcm_bytes: pcm.len() as u64 * 2,
        packet_bytes,
        largest_packet,
        elapsed: start.elapsed(),
    };
    Ok((stats, decoded))
}
