//! Codec engine seam
//!
//! Sessions never talk to a codec library directly. They drive a boxed
//! [`EncoderEngine`] or [`DecoderEngine`] built by [`create_encoder`] and
//! [`create_decoder`] for the backend named in the configuration. Dropping the
//! box destroys the engine instance.

use crate::error::{CodecError, Result};
use crate::types::{CodecConfig, EngineBackend};

#[cfg(feature = "opus")]
pub mod libopus;

#[cfg(feature = "opus-sim")]
pub mod pcm;

/// Result codes shared by every engine, matching libopus.
pub mod codes {
    /// No error
    pub const OK: i32 = 0;
    /// One or more invalid/out of range arguments
    pub const BAD_ARG: i32 = -1;
    /// Not enough bytes allocated in the buffer
    pub const BUFFER_TOO_SMALL: i32 = -2;
    /// An internal error was detected
    pub const INTERNAL_ERROR: i32 = -3;
    /// The compressed data passed is corrupted
    pub const INVALID_PACKET: i32 = -4;
    /// Invalid/unsupported request number
    pub const UNIMPLEMENTED: i32 = -5;
    /// An encoder or decoder structure is invalid or already freed
    pub const INVALID_STATE: i32 = -6;
    /// Memory allocation has failed
    pub const ALLOC_FAIL: i32 = -7;

    /// Human readable text for a result code
    pub fn describe(code: i32) -> &'static str {
        match code {
            OK => "success",
            BAD_ARG => "invalid argument",
            BUFFER_TOO_SMALL => "buffer too small",
            INTERNAL_ERROR => "internal error",
            INVALID_PACKET => "corrupted stream",
            UNIMPLEMENTED => "request not implemented",
            INVALID_STATE => "invalid state",
            ALLOC_FAIL => "memory allocation failed",
            _ => "unknown error",
        }
    }
}

/// One encoder instance of the underlying codec
pub trait EncoderEngine: Send {
    /// Encode one interleaved PCM frame into `out`.
    ///
    /// The frame size is `pcm.len() / channels`. Returns the packet length;
    /// failures carry the engine's negative code in [`CodecError::Engine`].
    fn encode(&mut self, pcm: &[i16], out: &mut [u8]) -> Result<usize>;

    /// Backend name for diagnostics
    fn name(&self) -> &'static str;
}

/// One decoder instance of the underlying codec
pub trait DecoderEngine: Send {
    /// Decode one packet into `out`, which holds at most one frame.
    ///
    /// Returns the number of decoded samples per channel.
    fn decode(&mut self, packet: &[u8], out: &mut [i16], fec: bool) -> Result<usize>;

    /// Backend name for diagnostics
    fn name(&self) -> &'static str;
}

/// Create an encoder engine for the configured backend
pub fn create_encoder(config: &CodecConfig) -> Result<Box<dyn EncoderEngine>> {
    match config.backend {
        #[cfg(feature = "opus")]
        EngineBackend::Opus => Ok(Box::new(libopus::OpusEncoderEngine::new(config)?)),

        #[cfg(feature = "opus-sim")]
        EngineBackend::Pcm => Ok(Box::new(pcm::PcmEncoder::new(config)?)),

        backend => Err(disabled(backend)),
    }
}

/// Create a decoder engine for the configured backend
pub fn create_decoder(config: &CodecConfig) -> Result<Box<dyn DecoderEngine>> {
    match config.backend {
        #[cfg(feature = "opus")]
        EngineBackend::Opus => Ok(Box::new(libopus::OpusDecoderEngine::new(config)?)),

        #[cfg(feature = "opus-sim")]
        EngineBackend::Pcm => Ok(Box::new(pcm::PcmDecoder::new(config)?)),

        backend => Err(disabled(backend)),
    }
}

/// Backends compiled into this build
pub fn enabled_backends() -> Vec<EngineBackend> {
    [EngineBackend::Opus, EngineBackend::Pcm]
        .into_iter()
        .filter(|backend| backend.is_enabled())
        .collect()
}

fn disabled(backend: EngineBackend) -> CodecError {
    let feature = match backend {
        EngineBackend::Opus => "opus",
        EngineBackend::Pcm => "opus-sim",
    };
    CodecError::feature_not_enabled(feature)
}
