//! Encoder and decoder sessions
//!
//! A session owns exactly one engine instance and the configuration it was
//! initialized with. It is created by `initialize`, drives the engine one frame
//! per call and destroys the engine on `release` or when dropped.

mod decoder;
mod encoder;

pub use decoder::DecoderSession;
pub use encoder::EncoderSession;

use tracing::{error, info};

use crate::engine::codes;
use crate::error::{Result, SessionKind};
use crate::types::CodecConfig;

/// Emit the diagnostic record for an init attempt and pass the outcome through.
fn report_init<T>(kind: SessionKind, config: &CodecConfig, outcome: Result<T>) -> Result<T> {
    match &outcome {
        Ok(_) => info!(
            error_code = codes::OK,
            "Initialized {} with ErrorCode: {} ({})",
            kind,
            codes::OK,
            config
        ),
        Err(err) => error!(
            error_code = err.status_code(),
            "Initialized {} with ErrorCode: {} ({})",
            kind,
            err.status_code(),
            err
        ),
    }
    outcome
}
