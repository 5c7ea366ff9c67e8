use std::fmt;

use tracing::{debug, error, info, warn};

use super::report_init;
use crate::engine::{self, codes, EncoderEngine};
use crate::error::{CodecError, Result, SessionKind};
use crate::types::{CodecConfig, MAX_PAYLOAD_BYTES};

/// Converts fixed-size PCM frames into compressed packets.
///
/// # Example
/// ```
/// use walkie_codec_core::{CodecConfig, EncoderSession};
///
/// let config = CodecConfig::new(16000, 1, 320)?;
/// let mut encoder = EncoderSession::initialize(config)?;
///
/// let mut packet = [0u8; 4000];
/// let len = encoder.encode(&[0i16; 320], &mut packet)?;
/// assert!(len <= 4000);
///
/// assert!(encoder.release());
/// # Ok::<(), walkie_codec_core::CodecError>(())
/// ```
pub struct EncoderSession {
    config: CodecConfig,
    engine: Box<dyn EncoderEngine>,
    /// Engine output, bounded by the maximum payload size
    scratch: Vec<u8>,
    frames: u64,
}

impl EncoderSession {
    /// Validate `config` and initialize an engine for its backend
    pub fn initialize(config: CodecConfig) -> Result<Self> {
        let outcome = config
            .validate()
            .and_then(|()| engine::create_encoder(&config))
            .map(|engine| Self::build(config.clone(), engine));
        report_init(SessionKind::Encoder, &config, outcome)
    }

    /// Initialize with a caller-supplied engine
    pub fn with_engine(config: CodecConfig, engine: Box<dyn EncoderEngine>) -> Result<Self> {
        let outcome = config
            .validate()
            .map(|()| Self::build(config.clone(), engine));
        report_init(SessionKind::Encoder, &config, outcome)
    }

    fn build(config: CodecConfig, engine: Box<dyn EncoderEngine>) -> Self {
        Self {
            config,
            engine,
            scratch: vec![0u8; MAX_PAYLOAD_BYTES],
            frames: 0,
        }
    }

    /// Encode one frame into `out`, returning the packet length.
    ///
    /// `pcm` must hold exactly one interleaved frame. The packet is copied into
    /// `out` only when it fits; otherwise `out` is left untouched and
    /// [`CodecError::BufferTooSmall`] is returned.
    pub fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize> {
        debug!(
            "Opus encoding: FrameSize: {} - SamplingRate: {} - Channels: {} - input {} - output {}",
            self.config.frame_size,
            self.config.sample_rate.hz(),
            self.config.channels,
            pcm.len(),
            out.len()
        );

        let expected = self.config.samples_per_frame();
        if pcm.len() != expected {
            return Err(CodecError::InvalidFrameLength {
                expected,
                actual: pcm.len(),
            });
        }

        let produced = match self.engine.encode(pcm, &mut self.scratch) {
            Ok(produced) => produced,
            Err(err) => {
                error!("{} encoder failed: {}", self.engine.name(), err);
                return Err(err);
            }
        };
        debug!("Length of encoded data: {}", produced);

        if produced > self.scratch.len() {
            error!(
                "{} encoder reported {} bytes for a {} byte buffer",
                self.engine.name(),
                produced,
                self.scratch.len()
            );
            return Err(CodecError::engine(
                codes::INTERNAL_ERROR,
                format!("engine reported {produced} bytes past its output buffer"),
            ));
        }

        if produced > out.len() {
            warn!(
                "Output buffer of size {} too small for {} encoded bytes",
                out.len(),
                produced
            );
            return Err(CodecError::BufferTooSmall {
                needed: produced,
                actual: out.len(),
            });
        }

        out[..produced].copy_from_slice(&self.scratch[..produced]);
        self.frames += 1;
        Ok(produced)
    }

    /// Encode one frame into a freshly allocated packet
    pub fn encode_to_vec(&mut self, pcm: &[i16]) -> Result<Vec<u8>> {
        let mut packet = vec![0u8; MAX_PAYLOAD_BYTES];
        let len = self.encode(pcm, &mut packet)?;
        packet.truncate(len);
        Ok(packet)
    }

    /// Configuration the engine was initialized with
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Frames successfully encoded so far
    pub fn frames_processed(&self) -> u64 {
        self.frames
    }

    /// Destroy the engine and end the session. Always reports success.
    pub fn release(self) -> bool {
        info!("Releasing encoder after {} frames", self.frames);
        true
    }
}

impl Drop for EncoderSession {
    fn drop(&mut self) {
        debug!("Destroying {} encoder engine", self.engine.name());
    }
}

impl fmt::Debug for EncoderSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EncoderSession")
            .field("config", &self.config)
            .field("engine", &self.engine.name())
            .field("frames", &self.frames)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Engine that returns a fixed result
    struct ScriptedEngine {
        result: std::result::Result<usize, i32>,
    }

    impl EncoderEngine for ScriptedEngine {
        fn encode(&mut self, _pcm: &[i16], out: &mut [u8]) -> Result<usize> {
            assert_eq!(out.len(), MAX_PAYLOAD_BYTES);
            match self.result {
                Ok(len) => {
                    let n = len.min(out.len());
                    out[..n].fill(0xAB);
                    Ok(len)
                }
                Err(code) => Err(CodecError::engine(code, codes::describe(code))),
            }
        }

        fn name(&self) -> &'static str {
            "scripted"
        }
    }

    fn scripted(result: std::result::Result<usize, i32>) -> EncoderSession {
        EncoderSession::with_engine(CodecConfig::default(), Box::new(ScriptedEngine { result }))
            .unwrap()
    }

    #[test]
    fn test_copies_exactly_produced_bytes() {
        let mut session = scripted(Ok(10));
        let mut out = [0u8; 64];
        assert_eq!(session.encode(&[0i16; 320], &mut out).unwrap(), 10);
        assert!(out[..10].iter().all(|&b| b == 0xAB));
        assert!(out[10..].iter().all(|&b| b == 0));
        assert_eq!(session.frames_processed(), 1);
    }

    #[test]
    fn test_packet_larger_than_output_is_rejected() {
        let mut session = scripted(Ok(100));
        let mut out = [7u8; 99];
        let err = session.encode(&[0i16; 320], &mut out).unwrap_err();
        assert!(matches!(
            err,
            CodecError::BufferTooSmall {
                needed: 100,
                actual: 99
            }
        ));
        assert_eq!(err.status_code(), -1);
        assert!(out.iter().all(|&b| b == 7));
        assert_eq!(session.frames_processed(), 0);
    }

    #[test]
    fn test_engine_code_is_not_reinterpreted() {
        for code in [codes::BAD_ARG, codes::INTERNAL_ERROR, codes::ALLOC_FAIL, -99] {
            let mut session = scripted(Err(code));
            let mut out = [0u8; 4000];
            let err = session.encode(&[0i16; 320], &mut out).unwrap_err();
            assert_eq!(err.status_code(), code);
        }
    }

    #[test]
    fn test_frame_length_is_checked_before_engine() {
        let mut session = scripted(Err(codes::INTERNAL_ERROR));
        let mut out = [0u8; 4000];
        let err = session.encode(&[0i16; 160], &mut out).unwrap_err();
        assert!(matches!(
            err,
            CodecError::InvalidFrameLength {
                expected: 320,
                actual: 160
            }
        ));
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = CodecConfig {
            channels: 3,
            ..CodecConfig::default()
        };
        let result =
            EncoderSession::with_engine(config, Box::new(ScriptedEngine { result: Ok(1) }));
        assert!(matches!(
            result,
            Err(CodecError::InvalidChannelCount { channels: 3, .. })
        ));
    }

    #[test]
    fn test_engine_overrun_is_internal_error() {
        let mut session = scripted(Ok(MAX_PAYLOAD_BYTES + 1));
        let mut out = vec![3u8; 8000];
        let err = session.encode(&[0i16; 320], &mut out).unwrap_err();
        assert_eq!(err.status_code(), codes::INTERNAL_ERROR);
        assert!(out.iter().all(|&b| b == 3));
        assert_eq!(session.frames_processed(), 0);
    }

    #[test]
    fn test_release_reports_success() {
        let session = scripted(Ok(1));
        assert!(session.release());
    }
}
