//! libopus engine backed by the `opus` crate

use ::opus::{Application, Bitrate, Channels, Decoder, Encoder};
use tracing::debug;

use super::{DecoderEngine, EncoderEngine};
use crate::error::{CodecError, Result};
use crate::types::{ApplicationProfile, CodecConfig};

/// libopus encoder sized for the configured channel count
pub struct OpusEncoderEngine {
    inner: Encoder,
}

impl OpusEncoderEngine {
    /// Create and initialize the encoder
    pub fn new(config: &CodecConfig) -> Result<Self> {
        let mut inner = Encoder::new(
            config.sample_rate.hz(),
            channels(config.channels)?,
            application(config.application),
        )
        .map_err(engine_error)?;

        if let Some(bitrate) = config.bitrate {
            // validate() bounds the bitrate well inside i32
            inner
                .set_bitrate(Bitrate::Bits(bitrate as i32))
                .map_err(engine_error)?;
        }

        debug!("libopus encoder created for {}", config);
        Ok(Self { inner })
    }
}

impl EncoderEngine for OpusEncoderEngine {
    fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize> {
        self.inner.encode(pcm, out).map_err(engine_error)
    }

    fn name(&self) -> &'static str {
        "opus"
    }
}

/// libopus decoder sized for the configured channel count
pub struct OpusDecoderEngine {
    inner: Decoder,
}

impl OpusDecoderEngine {
    /// Create and initialize the decoder
    pub fn new(config: &CodecConfig) -> Result<Self> {
        let inner = Decoder::new(config.sample_rate.hz(), channels(config.channels)?)
            .map_err(engine_error)?;

        debug!("libopus decoder created for {}", config);
        Ok(Self { inner })
    }
}

impl DecoderEngine for OpusDecoderEngine {
    fn decode(&mut self, packet: &[u8], out: &mut [i16], fec: bool) -> Result<usize> {
        self.inner.decode(packet, out, fec).map_err(engine_error)
    }

    fn name(&self) -> &'static str {
        "opus"
    }
}

fn channels(count: u8) -> Result<Channels> {
    match count {
        1 => Ok(Channels::Mono),
        2 => Ok(Channels::Stereo),
        channels => Err(CodecError::InvalidChannelCount {
            channels,
            supported: vec![1, 2],
        }),
    }
}

fn application(profile: ApplicationProfile) -> Application {
    match profile {
        ApplicationProfile::Voice => Application::Voip,
        ApplicationProfile::Audio => Application::Audio,
        ApplicationProfile::LowDelay => Application::LowDelay,
    }
}

fn engine_error(err: ::opus::Error) -> CodecError {
    CodecError::engine(err.code() as i32, err.to_string())
}
