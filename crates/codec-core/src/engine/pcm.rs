//! PCM stand-in engine
//!
//! Ships each frame as little-endian 16-bit samples with no compression. It
//! honours the same contract and result codes as libopus, so sessions, the
//! handle API and the packet stream can be exercised without a native codec.

use super::{codes, DecoderEngine, EncoderEngine};
use crate::error::{CodecError, Result};
use crate::types::{CodecConfig, MAX_PAYLOAD_BYTES};

/// Encoder half of the PCM engine
#[derive(Debug, Clone)]
pub struct PcmEncoder {
    channels: usize,
}

impl PcmEncoder {
    /// Create an encoder for the configured channel count
    pub fn new(config: &CodecConfig) -> Result<Self> {
        check_frame_fits(config)?;
        Ok(Self {
            channels: channel_count(config)?,
        })
    }
}

impl EncoderEngine for PcmEncoder {
    fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize> {
        if pcm.is_empty() || pcm.len() % self.channels != 0 {
            return Err(error(codes::BAD_ARG));
        }

        let needed = pcm.len() * 2;
        if needed > out.len() {
            return Err(error(codes::BUFFER_TOO_SMALL));
        }

        for (chunk, sample) in out.chunks_exact_mut(2).zip(pcm) {
            chunk.copy_from_slice(&sample.to_le_bytes());
        }
        Ok(needed)
    }

    fn name(&self) -> &'static str {
        "pcm"
    }
}

/// Decoder half of the PCM engine
#[derive(Debug, Clone)]
pub struct PcmDecoder {
    channels: usize,
}

impl PcmDecoder {
    /// Create a decoder for the configured channel count
    pub fn new(config: &CodecConfig) -> Result<Self> {
        check_frame_fits(config)?;
        Ok(Self {
            channels: channel_count(config)?,
        })
    }
}

impl DecoderEngine for PcmDecoder {
    fn decode(&mut self, packet: &[u8], out: &mut [i16], _fec: bool) -> Result<usize> {
        if packet.is_empty() || packet.len() % (2 * self.channels) != 0 {
            return Err(error(codes::INVALID_PACKET));
        }

        let samples = packet.len() / 2;
        if samples > out.len() {
            return Err(error(codes::BUFFER_TOO_SMALL));
        }

        for (slot, chunk) in out.iter_mut().zip(packet.chunks_exact(2)) {
            *slot = i16::from_le_bytes([chunk[0], chunk[1]]);
        }
        Ok(samples / self.channels)
    }

    fn name(&self) -> &'static str {
        "pcm"
    }
}

fn channel_count(config: &CodecConfig) -> Result<usize> {
    match config.channels {
        1 | 2 => Ok(config.channels as usize),
        channels => Err(CodecError::InvalidChannelCount {
            channels,
            supported: vec![1, 2],
        }),
    }
}

/// Uncompressed frames must fit one payload or no encode could ever succeed
fn check_frame_fits(config: &CodecConfig) -> Result<()> {
    let bytes = config.samples_per_frame() * 2;
    if bytes > MAX_PAYLOAD_BYTES {
        return Err(CodecError::invalid_config(format!(
            "pcm engine frame of {} bytes exceeds the {} byte payload limit ({})",
            bytes, MAX_PAYLOAD_BYTES, config
        )));
    }
    Ok(())
}

fn error(code: i32) -> CodecError {
    CodecError::engine(code, codes::describe(code))
}
