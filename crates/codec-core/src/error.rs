//! Error handling for the codec sessions
//!
//! Every failure a session can report is a [`CodecError`]. Engine failures keep
//! the negative code produced by the codec library, and an undersized output
//! buffer is reported separately so the caller can retry with a larger one.

#![allow(missing_docs)]

use std::fmt;
use thiserror::Error;

/// Result type alias for codec operations
pub type Result<T> = std::result::Result<T, CodecError>;

/// Legacy status code for an output buffer that cannot hold the result.
pub const STATUS_BUFFER_TOO_SMALL: i32 = -1;
/// Legacy status code for a transform or release on a handle with no live session.
pub const STATUS_NOT_INITIALIZED: i32 = -100;
/// Legacy status code for initializing a handle that already holds a live session.
pub const STATUS_ALREADY_INITIALIZED: i32 = -101;
/// Legacy status code for an input whose length does not match the configured frame.
pub const STATUS_INVALID_FRAME_LENGTH: i32 = -102;
/// Legacy status code for any configuration problem.
pub const STATUS_INVALID_CONFIG: i32 = -103;
/// Legacy status code for I/O failures.
pub const STATUS_IO: i32 = -104;

/// Which direction a session works in, used in lifecycle errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKind {
    Encoder,
    Decoder,
}

impl fmt::Display for SessionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Encoder => write!(f, "encoder"),
            Self::Decoder => write!(f, "decoder"),
        }
    }
}

/// Error type for session operations
#[derive(Error, Debug)]
pub enum CodecError {
    /// The codec engine reported a negative result code
    #[error("Engine error {code}: {message}")]
    Engine { code: i32, message: String },

    /// The engine produced more data than the caller's buffer can hold
    #[error("Buffer too small: need {needed}, got {actual}")]
    BufferTooSmall { needed: usize, actual: usize },

    /// Transform or release on a handle with no live session
    #[error("The {session} session is not initialized")]
    NotInitialized { session: SessionKind },

    /// Initialize on a handle that still holds a live session
    #[error("The {session} session is already initialized, release it first")]
    AlreadyInitialized { session: SessionKind },

    /// Input length does not match the configured frame
    #[error("Invalid frame length: expected {expected}, got {actual}")]
    InvalidFrameLength { expected: usize, actual: usize },

    /// Invalid codec configuration
    #[error("Invalid codec configuration: {details}")]
    InvalidConfig { details: String },

    /// Invalid sample rate
    #[error("Invalid sample rate: {rate}Hz (supported: {supported:?})")]
    InvalidSampleRate { rate: u32, supported: Vec<u32> },

    /// Invalid channel count
    #[error("Invalid channel count: {channels} (supported: {supported:?})")]
    InvalidChannelCount { channels: u8, supported: Vec<u8> },

    /// Invalid bitrate
    #[error("Invalid bitrate: {bitrate}bps (range: {min}-{max})")]
    InvalidBitrate { bitrate: u32, min: u32, max: u32 },

    /// Engine backend compiled out
    #[error("Feature not enabled: {feature} (enable with --features {feature})")]
    FeatureNotEnabled { feature: String },

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration: {reason}")]
    ConfigParse { reason: String },

    /// I/O operation failed
    #[error("I/O operation failed: {reason}")]
    Io { reason: String },
}

impl CodecError {
    /// Create a new engine error from a raw result code
    pub fn engine(code: i32, message: impl Into<String>) -> Self {
        Self::Engine {
            code,
            message: message.into(),
        }
    }

    /// Create a new invalid configuration error
    pub fn invalid_config(details: impl Into<String>) -> Self {
        Self::InvalidConfig {
            details: details.into(),
        }
    }

    /// Create a new feature not enabled error
    pub fn feature_not_enabled(feature: impl Into<String>) -> Self {
        Self::FeatureNotEnabled {
            feature: feature.into(),
        }
    }

    /// Map the error onto the integer status a handle caller sees.
    ///
    /// Engine codes pass through unchanged and an undersized buffer is `-1`.
    /// The remaining kinds use codes below `-100`, outside the engine's range.
    pub fn status_code(&self) -> i32 {
        match self {
            Self::Engine { code, .. } => *code,
            Self::BufferTooSmall { .. } => STATUS_BUFFER_TOO_SMALL,
            Self::NotInitialized { .. } => STATUS_NOT_INITIALIZED,
            Self::AlreadyInitialized { .. } => STATUS_ALREADY_INITIALIZED,
            Self::InvalidFrameLength { .. } => STATUS_INVALID_FRAME_LENGTH,
            Self::InvalidConfig { .. }
            | Self::InvalidSampleRate { .. }
            | Self::InvalidChannelCount { .. }
            | Self::InvalidBitrate { .. }
            | Self::FeatureNotEnabled { .. }
            | Self::ConfigParse { .. } => STATUS_INVALID_CONFIG,
            Self::Io { .. } => STATUS_IO,
        }
    }

    /// Check if the caller can retry the same session after this error
    pub fn is_recoverable(&self) -> bool {
        match self {
            // Retry with a larger buffer
            Self::BufferTooSmall { .. } => true,
            // A corrupt packet leaves the engine usable for the next one
            Self::Engine { code, .. } => *code == crate::engine::codes::INVALID_PACKET,

            Self::NotInitialized { .. }
            | Self::AlreadyInitialized { .. }
            | Self::InvalidFrameLength { .. }
            | Self::InvalidConfig { .. }
            | Self::InvalidSampleRate { .. }
            | Self::InvalidChannelCount { .. }
            | Self::InvalidBitrate { .. }
            | Self::FeatureNotEnabled { .. }
            | Self::ConfigParse { .. }
            | Self::Io { .. } => false,
        }
    }

    /// Get the error category
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidConfig { .. }
            | Self::InvalidSampleRate { .. }
            | Self::InvalidChannelCount { .. }
            | Self::InvalidBitrate { .. }
            | Self::FeatureNotEnabled { .. }
            | Self::ConfigParse { .. } => ErrorCategory::Configuration,

            Self::Engine { .. } => ErrorCategory::Engine,

            Self::BufferTooSmall { .. } | Self::InvalidFrameLength { .. } => ErrorCategory::Buffer,

            Self::NotInitialized { .. } | Self::AlreadyInitialized { .. } => {
                ErrorCategory::Lifecycle
            }

            Self::Io { .. } => ErrorCategory::Io,
        }
    }
}

/// Error category for grouping related errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Configuration and parameter errors
    Configuration,
    /// Failures reported by the codec engine
    Engine,
    /// Caller buffer size or frame length errors
    Buffer,
    /// Session state machine violations
    Lifecycle,
    /// I/O related errors
    Io,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Configuration => write!(f, "Configuration"),
            Self::Engine => write!(f, "Engine"),
            Self::Buffer => write!(f, "Buffer"),
            Self::Lifecycle => write!(f, "Lifecycle"),
            Self::Io => write!(f, "I/O"),
        }
    }
}

/// Convert from I/O errors
impl From<std::io::Error> for CodecError {
    fn from(error: std::io::Error) -> Self {
        Self::Io {
            reason: error.to_string(),
        }
    }
}

/// Convert from TOML parsing errors
impl From<toml::de::Error> for CodecError {
    fn from(error: toml::de::Error) -> Self {
        Self::ConfigParse {
            reason: error.to_string(),
        }
    }
}
