//! # Walkie Codec-Core: Frame-at-a-time Opus sessions
//!
//! This library wraps a real-time speech codec behind two small, symmetric
//! session types for push-to-talk voice:
//!
//! - [`EncoderSession`] turns one fixed-size block of 16-bit PCM into one
//!   variable-length compressed packet.
//! - [`DecoderSession`] turns one packet back into a block of PCM.
//!
//! Both are configured once with a [`CodecConfig`] (sample rate, channel count,
//! frame size, application profile) and keep that configuration until they are
//! released. Errors are returned as [`CodecError`]: a negative code from the
//! engine is kept verbatim, and an output buffer that cannot hold the result is
//! reported as [`CodecError::BufferTooSmall`] with nothing written.
//!
//! ## Usage
//!
//! ```rust
//! use walkie_codec_core::{CodecConfig, DecoderSession, EncoderSession};
//!
//! let config = CodecConfig::new(16000, 1, 320)?;
//! let mut encoder = EncoderSession::initialize(config.clone())?;
//! let mut decoder = DecoderSession::initialize(config)?;
//!
//! let mut packet = [0u8; 4000];
//! let len = encoder.encode(&[0i16; 320], &mut packet)?;
//!
//! let mut pcm = [0i16; 320];
//! let samples = decoder.decode(&packet[..len], &mut pcm)?;
//! assert_eq!(samples, 320);
//! # Ok::<(), walkie_codec_core::CodecError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `opus`: libopus engine through the `opus` crate (needs the native library)
//! - `opus-sim`: uncompressed PCM engine with the same contract (enabled by default)

#![deny(missing_docs)]
#![warn(clippy::all)]

pub mod bridge;
pub mod engine;
pub mod error;
pub mod session;
pub mod stream;
pub mod types;

// Re-export commonly used types
pub use bridge::{DecoderHandle, EncoderHandle, HandleState};
pub use engine::{DecoderEngine, EncoderEngine};
pub use error::{CodecError, ErrorCategory, Result, SessionKind};
pub use session::{DecoderSession, EncoderSession};
pub use stream::{PacketReader, PacketWriter};
pub use types::{ApplicationProfile, CodecConfig, EngineBackend, SampleRate, MAX_PAYLOAD_BYTES};

/// Version information for the codec library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the codec library
///
/// Installs a default `tracing` subscriber if the application has not set one
/// and logs the enabled engine backends. It's safe to call multiple times.
pub fn init() -> Result<()> {
    // Initialize logging if not already done
    let _ = tracing_subscriber::fmt::try_init();

    tracing::info!("Walkie codec-core v{} initialized", VERSION);
    tracing::info!("Engine backends: {:?}", engine::enabled_backends());

    Ok(())
}

/// Get library information
pub fn info() -> LibraryInfo {
    LibraryInfo {
        version: VERSION,
        backends: engine::enabled_backends(),
        default_backend: EngineBackend::default(),
        max_payload_bytes: MAX_PAYLOAD_BYTES,
    }
}

/// Library information structure
#[derive(Debug, Clone)]
pub struct LibraryInfo {
    /// Library version
    pub version: &'static str,
    /// Engine backends compiled into this build
    pub backends: Vec<EngineBackend>,
    /// Backend used when a configuration does not name one
    pub default_backend: EngineBackend,
    /// Upper bound on one compressed packet
    pub max_payload_bytes: usize,
}
