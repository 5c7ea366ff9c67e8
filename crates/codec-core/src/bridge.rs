//! Guarded handle API for managed-runtime callers
//!
//! A foreign caller sees the codec as `init` / transform / `release` calls that
//! return booleans and integer counts. [`EncoderHandle`] and [`DecoderHandle`]
//! offer that shape on top of the sessions, with each handle holding at most
//! one live session behind a mutex:
//!
//! ```text
//! Uninitialized --initialize--> Ready --release--> Released
//!                                 ^                    |
//!                                 +----initialize------+
//! ```
//!
//! Transform calls outside `Ready` fail with [`CodecError::NotInitialized`] and
//! initializing a `Ready` handle fails with [`CodecError::AlreadyInitialized`].

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::error::{CodecError, Result, SessionKind};
use crate::session::{DecoderSession, EncoderSession};
use crate::types::CodecConfig;

/// Lifecycle state of a handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleState {
    /// No session was ever initialized
    Uninitialized,
    /// A live session is available
    Ready,
    /// The last session was released
    Released,
}

enum Slot<S> {
    Uninitialized,
    Ready(S),
    Released,
}

/// Mutex-guarded single-session state machine shared by both handles
struct Guarded<S> {
    kind: SessionKind,
    slot: Mutex<Slot<S>>,
}

impl<S> Guarded<S> {
    fn new(kind: SessionKind) -> Self {
        Self {
            kind,
            slot: Mutex::new(Slot::Uninitialized),
        }
    }

    fn initialize(&self, create: impl FnOnce() -> Result<S>) -> Result<()> {
        let mut slot = self.slot.lock();
        if matches!(*slot, Slot::Ready(_)) {
            warn!("Refusing to re-initialize live {} session", self.kind);
            return Err(CodecError::AlreadyInitialized { session: self.kind });
        }
        // A failed init leaves the previous state in place
        *slot = Slot::Ready(create()?);
        Ok(())
    }

    fn with_session<T>(&self, op: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        match &mut *self.slot.lock() {
            Slot::Ready(session) => op(session),
            _ => Err(CodecError::NotInitialized { session: self.kind }),
        }
    }

    fn take(&self) -> Option<S> {
        let mut slot = self.slot.lock();
        match std::mem::replace(&mut *slot, Slot::Released) {
            Slot::Ready(session) => Some(session),
            Slot::Uninitialized => {
                *slot = Slot::Uninitialized;
                None
            }
            Slot::Released => None,
        }
    }

    fn state(&self) -> HandleState {
        match *self.slot.lock() {
            Slot::Uninitialized => HandleState::Uninitialized,
            Slot::Ready(_) => HandleState::Ready,
            Slot::Released => HandleState::Released,
        }
    }
}

fn to_status(result: Result<usize>) -> i32 {
    match result {
        Ok(count) => i32::try_from(count).unwrap_or(i32::MAX),
        Err(err) => err.status_code(),
    }
}

/// Encoder side of the handle API
pub struct EncoderHandle {
    inner: Guarded<EncoderSession>,
}

impl EncoderHandle {
    /// Create a handle with no live session
    pub fn new() -> Self {
        Self {
            inner: Guarded::new(SessionKind::Encoder),
        }
    }

    /// Initialize from raw caller values, reporting success as a flag.
    ///
    /// The failure reason, including any engine code, is only logged here.
    /// Use [`initialize_with`](Self::initialize_with) to receive it as a
    /// [`CodecError`] whose [`status_code`](CodecError::status_code) carries
    /// the engine code unchanged.
    pub fn initialize(&self, sample_rate_hz: u32, channels: u8, frame_size: usize) -> bool {
        CodecConfig::new(sample_rate_hz, channels, frame_size)
            .and_then(|config| self.initialize_with(config))
            .is_ok()
    }

    /// Initialize a session for `config`
    pub fn initialize_with(&self, config: CodecConfig) -> Result<()> {
        self.inner.initialize(|| EncoderSession::initialize(config))
    }

    /// Encode one frame, returning the byte count or a negative status code
    pub fn encode(&self, pcm: &[i16], out: &mut [u8]) -> i32 {
        to_status(self.try_encode(pcm, out))
    }

    /// Encode one frame with a typed error
    pub fn try_encode(&self, pcm: &[i16], out: &mut [u8]) -> Result<usize> {
        self.inner.with_session(|session| session.encode(pcm, out))
    }

    /// Release the live session, if any. Safe to call repeatedly.
    pub fn release(&self) -> bool {
        match self.inner.take() {
            Some(session) => session.release(),
            None => {
                debug!("Encoder release with no live session");
                true
            }
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> HandleState {
        self.inner.state()
    }

    /// Configuration of the live session
    pub fn config(&self) -> Option<CodecConfig> {
        self.inner
            .with_session(|session| Ok(session.config().clone()))
            .ok()
    }
}

impl Default for EncoderHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// Decoder side of the handle API
pub struct DecoderHandle {
    inner: Guarded<DecoderSession>,
}

impl DecoderHandle {
    /// Create a handle with no live session
    pub fn new() -> Self {
        Self {
            inner: Guarded::new(SessionKind::Decoder),
        }
    }

    /// Initialize from raw caller values, reporting success as a flag.
    ///
    /// The failure reason, including any engine code, is only logged here.
    /// Use [`initialize_with`](Self::initialize_with) to receive it as a
    /// [`CodecError`] whose [`status_code`](CodecError::status_code) carries
    /// the engine code unchanged.
    pub fn initialize(&self, sample_rate_hz: u32, channels: u8, frame_size: usize) -> bool {
        CodecConfig::new(sample_rate_hz, channels, frame_size)
            .and_then(|config| self.initialize_with(config))
            .is_ok()
    }

    /// Initialize a session for `config`
    pub fn initialize_with(&self, config: CodecConfig) -> Result<()> {
        self.inner.initialize(|| DecoderSession::initialize(config))
    }

    /// Decode one packet, returning the sample count or a negative status code
    pub fn decode(&self, packet: &[u8], out: &mut [i16]) -> i32 {
        to_status(self.try_decode(packet, out))
    }

    /// Decode one packet with a typed error
    pub fn try_decode(&self, packet: &[u8], out: &mut [i16]) -> Result<usize> {
        self.inner.with_session(|session| session.decode(packet, out))
    }

    /// Release the live session, if any. Safe to call repeatedly.
    pub fn release(&self) -> bool {
        match self.inner.take() {
            Some(session) => session.release(),
            None => {
                debug!("Decoder release with no live session");
                true
            }
        }
    }

    /// Current lifecycle state
    pub fn state(&self) -> HandleState {
        self.inner.state()
    }

    /// Configuration of the live session
    pub fn config(&self) -> Option<CodecConfig> {
        self.inner
            .with_session(|session| Ok(session.config().clone()))
            .ok()
    }
}

impl Default for DecoderHandle {
    fn default() -> Self {
        Self::new()
    }
}
