use std::fmt;

use tracing::{debug, error, info, warn};

use super::report_init;
use crate::engine::{self, codes, DecoderEngine};
use crate::error::{CodecError, Result, SessionKind};
use crate::types::{CodecConfig, MAX_PAYLOAD_BYTES};

/// Converts compressed packets back into fixed-size PCM frames.
///
/// Forward error correction is never requested from the engine.
pub struct DecoderSession {
    config: CodecConfig,
    engine: Box<dyn DecoderEngine>,
    /// One interleaved frame of engine output
    scratch: Vec<i16>,
    frames: u64,
}

impl DecoderSession {
    /// Validate `config` and initialize an engine for its backend
    pub fn initialize(config: CodecConfig) -> Result<Self> {
        let outcome = config
            .validate()
            .and_then(|()| engine::create_decoder(&config))
            .map(|engine| Self::build(config.clone(), engine));
        report_init(SessionKind::Decoder, &config, outcome)
    }

    /// Initialize with a caller-supplied engine
    pub fn with_engine(config: CodecConfig, engine: Box<dyn DecoderEngine>) -> Result<Self> {
        let outcome = config
            .validate()
            .map(|()| Self::build(config.clone(), engine));
        report_init(SessionKind::Decoder, &config, outcome)
    }

    fn build(config: CodecConfig, engine: Box<dyn DecoderEngine>) -> Self {
        let scratch = vec![0i16; config.samples_per_frame()];
        Self {
            config,
            engine,
            scratch,
            frames: 0,
        }
    }

    /// Decode one packet into `out`, returning the samples per channel.
    ///
    /// `out` receives `returned * channels` interleaved samples. When they do
    /// not fit, `out` is left untouched and [`CodecError::BufferTooSmall`] is
    /// returned. For a rejected packet length, `expected` in
    /// [`CodecError::InvalidFrameLength`] is the bound that was violated.
    pub fn decode(&mut self, packet: &[u8], out: &mut [i16]) -> Result<usize> {
        debug!(
            "Opus decoding: FrameSize: {} - SamplingRate: {} - Channels: {} - input {} - output {}",
            self.config.frame_size,
            self.config.sample_rate.hz(),
            self.config.channels,
            packet.len(),
            out.len()
        );

        if packet.is_empty() {
            return Err(CodecError::InvalidFrameLength {
                expected: 1,
                actual: 0,
            });
        }
        if packet.len() > MAX_PAYLOAD_BYTES {
            return Err(CodecError::InvalidFrameLength {
                expected: MAX_PAYLOAD_BYTES,
                actual: packet.len(),
            });
        }

        let produced = match self.engine.decode(packet, &mut self.scratch, false) {
            Ok(produced) => produced,
            Err(err) => {
                error!("{} decoder failed: {}", self.engine.name(), err);
                return Err(err);
            }
        };
        debug!("Length of decoded data: {}", produced);

        let needed = produced * self.config.channels as usize;
        if needed > self.scratch.len() {
            error!(
                "{} decoder reported {} samples for a {} sample frame",
                self.engine.name(),
                needed,
                self.scratch.len()
            );
            return Err(CodecError::engine(
                codes::INTERNAL_ERROR,
                format!("engine reported {needed} samples past its output buffer"),
            ));
        }
        if needed > out.len() {
            warn!(
                "Output buffer of size {} too small for {} decoded samples",
                out.len(),
                needed
            );
            return Err(CodecError::BufferTooSmall {
                needed,
                actual: out.len(),
            });
        }

        out[..needed].copy_from_slice(&self.scratch[..needed]);
        self.frames += 1;
        Ok(produced)
    }

    /// Decode one packet into a freshly allocated frame
    pub fn decode_to_vec(&mut self, packet: &[u8]) -> Result<Vec<i16>> {
        let mut pcm = vec![0i16; self.config.samples_per_frame()];
        let produced = self.decode(packet, &mut pcm)?;
        pcm.truncate(produced * self.config.channels as usize);
        Ok(pcm)
    }

    /// Configuration the engine was initialized with
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Packets successfully decoded so far
    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Destroy the engine and end the session. Always reports success.
    pub fn release(self) -> bool {
        info!("Releasing decoder after {} frames", self.frames);
        true
    }
}

impl Drop for DecoderSession {
    fn drop(&mut self) {
        debug!("Destroying {} decoder engine", self.engine.name());
    }
}

impl fmt::Debug for DecoderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecoderSession")
            .field("config", &self.config)
            .field("engine", &self.engine.name())
            .field("frames", &self.frames)
            .finish()
    }
}
