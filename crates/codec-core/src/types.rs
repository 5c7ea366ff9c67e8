//! Core configuration types for the codec sessions
//!
//! A [`CodecConfig`] is fixed for the lifetime of a session: the engine is
//! initialized with it and every transform call is driven by it.

use crate::error::{CodecError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Upper bound on the size of one compressed packet, in bytes.
pub const MAX_PAYLOAD_BYTES: usize = 4000;

/// Channel counts the engines can be sized for.
pub const SUPPORTED_CHANNELS: &[u8] = &[1, 2];

/// Frame durations accepted by the engine, in units of 2.5 ms.
const FRAME_DURATION_UNITS: &[usize] = &[1, 2, 4, 8, 16, 24];

/// Sample rate enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum SampleRate {
    /// 8 kHz (narrowband)
    Rate8000,
    /// 12 kHz (mediumband)
    Rate12000,
    /// 16 kHz (wideband)
    Rate16000,
    /// 24 kHz (super-wideband)
    Rate24000,
    /// 48 kHz (fullband)
    Rate48000,
}

impl SampleRate {
    /// All rates the engine accepts
    pub const ALL: [SampleRate; 5] = [
        Self::Rate8000,
        Self::Rate12000,
        Self::Rate16000,
        Self::Rate24000,
        Self::Rate48000,
    ];

    /// Get the sample rate value in Hz
    pub fn hz(self) -> u32 {
        match self {
            Self::Rate8000 => 8000,
            Self::Rate12000 => 12000,
            Self::Rate16000 => 16000,
            Self::Rate24000 => 24000,
            Self::Rate48000 => 48000,
        }
    }

    /// Create from Hz value
    pub fn from_hz(hz: u32) -> Result<Self> {
        match hz {
            8000 => Ok(Self::Rate8000),
            12000 => Ok(Self::Rate12000),
            16000 => Ok(Self::Rate16000),
            24000 => Ok(Self::Rate24000),
            48000 => Ok(Self::Rate48000),
            rate => Err(CodecError::InvalidSampleRate {
                rate,
                supported: Self::ALL.iter().map(|r| r.hz()).collect(),
            }),
        }
    }

    /// Samples per channel in one 2.5 ms slice
    fn samples_per_unit(self) -> usize {
        self.hz() as usize / 400
    }
}

impl TryFrom<u32> for SampleRate {
    type Error = CodecError;

    fn try_from(hz: u32) -> Result<Self> {
        Self::from_hz(hz)
    }
}

impl From<SampleRate> for u32 {
    fn from(rate: SampleRate) -> Self {
        rate.hz()
    }
}

impl fmt::Display for SampleRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}Hz", self.hz())
    }
}

/// Codec tuning mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ApplicationProfile {
    /// Speech intelligibility first
    #[default]
    Voice,
    /// Faithful reproduction of general audio
    Audio,
    /// Lowest algorithmic delay, speech modes disabled
    LowDelay,
}

impl ApplicationProfile {
    /// Short lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Self::Voice => "voice",
            Self::Audio => "audio",
            Self::LowDelay => "low-delay",
        }
    }
}

impl fmt::Display for ApplicationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for ApplicationProfile {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "voice" | "voip" => Ok(Self::Voice),
            "audio" => Ok(Self::Audio),
            "low-delay" | "lowdelay" | "low_delay" => Ok(Self::LowDelay),
            other => Err(CodecError::invalid_config(format!(
                "unknown application profile '{other}'"
            ))),
        }
    }
}

/// Engine implementation backing a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EngineBackend {
    /// libopus through the `opus` crate
    Opus,
    /// Uncompressed PCM stand-in with the same contract
    Pcm,
}

impl EngineBackend {
    /// Short lowercase name
    pub fn name(self) -> &'static str {
        match self {
            Self::Opus => "opus",
            Self::Pcm => "pcm",
        }
    }

    /// Whether this backend was compiled in
    pub fn is_enabled(self) -> bool {
        match self {
            Self::Opus => cfg!(feature = "opus"),
            Self::Pcm => cfg!(feature = "opus-sim"),
        }
    }
}

impl Default for EngineBackend {
    fn default() -> Self {
        if cfg!(feature = "opus") {
            Self::Opus
        } else {
            Self::Pcm
        }
    }
}

impl fmt::Display for EngineBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl std::str::FromStr for EngineBackend {
    type Err = CodecError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "opus" => Ok(Self::Opus),
            "pcm" | "sim" => Ok(Self::Pcm),
            other => Err(CodecError::invalid_config(format!(
                "unknown engine backend '{other}'"
            ))),
        }
    }
}

/// Session configuration
///
/// `frame_size` counts samples per channel, so an interleaved stereo frame
/// holds `frame_size * 2` values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Sample rate
    pub sample_rate: SampleRate,
    /// Number of channels
    pub channels: u8,
    /// Frame size in samples per channel
    pub frame_size: usize,
    /// Codec tuning mode
    pub application: ApplicationProfile,
    /// Target bitrate in bits per second, engine default when unset
    pub bitrate: Option<u32>,
    /// Engine implementation
    pub backend: EngineBackend,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::Rate16000,
            channels: 1,
            frame_size: 320,
            application: ApplicationProfile::Voice,
            bitrate: None,
            backend: EngineBackend::default(),
        }
    }
}

impl CodecConfig {
    /// Lowest bitrate the engine accepts
    pub const MIN_BITRATE: u32 = 500;
    /// Highest bitrate the engine accepts
    pub const MAX_BITRATE: u32 = 512_000;

    /// Create a configuration from the raw values a caller supplies
    pub fn new(sample_rate_hz: u32, channels: u8, frame_size: usize) -> Result<Self> {
        Ok(Self {
            sample_rate: SampleRate::from_hz(sample_rate_hz)?,
            channels,
            frame_size,
            ..Self::default()
        })
    }

    /// Set the application profile
    pub fn with_application(mut self, application: ApplicationProfile) -> Self {
        self.application = application;
        self
    }

    /// Set the target bitrate
    pub fn with_bitrate(mut self, bitrate: u32) -> Self {
        self.bitrate = Some(bitrate);
        self
    }

    /// Set the engine backend
    pub fn with_backend(mut self, backend: EngineBackend) -> Self {
        self.backend = backend;
        self
    }

    /// Parse a configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Interleaved sample count of one PCM frame
    pub fn samples_per_frame(&self) -> usize {
        self.frame_size * self.channels as usize
    }

    /// Duration of one frame in milliseconds
    pub fn frame_duration_ms(&self) -> f64 {
        (self.frame_size as f64 * 1000.0) / self.sample_rate.hz() as f64
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_CHANNELS.contains(&self.channels) {
            return Err(CodecError::InvalidChannelCount {
                channels: self.channels,
                supported: SUPPORTED_CHANNELS.to_vec(),
            });
        }

        let unit = self.sample_rate.samples_per_unit();
        let valid_frame = self.frame_size % unit == 0
            && FRAME_DURATION_UNITS.contains(&(self.frame_size / unit));
        if !valid_frame {
            let allowed: Vec<usize> = FRAME_DURATION_UNITS.iter().map(|u| u * unit).collect();
            return Err(CodecError::invalid_config(format!(
                "frame size {} is not valid at {} (allowed: {:?})",
                self.frame_size, self.sample_rate, allowed
            )));
        }

        if let Some(bitrate) = self.bitrate {
            if !(Self::MIN_BITRATE..=Self::MAX_BITRATE).contains(&bitrate) {
                return Err(CodecError::InvalidBitrate {
                    bitrate,
                    min: Self::MIN_BITRATE,
                    max: Self::MAX_BITRATE,
                });
            }
        }

        Ok(())
    }
}

impl fmt::Display for CodecConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}ch {} samples ({}, {})",
            self.sample_rate, self.channels, self.frame_size, self.application, self.backend
        )
    }
}
