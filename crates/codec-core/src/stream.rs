//! Length-prefixed packet streams
//!
//! Packets have no self-delimiting framing, so each one is written as a 2-byte
//! big-endian length followed by the packet bytes. [`PacketWriter`] encodes PCM
//! frames onto any [`Write`]; [`PacketReader`] reads them back from any
//! [`Read`] and decodes them.

use std::io::{ErrorKind, Read, Write};

use bytes::{Buf, BufMut, BytesMut};
use tracing::debug;

use crate::error::{CodecError, Result};
use crate::session::{DecoderSession, EncoderSession};
use crate::types::{CodecConfig, MAX_PAYLOAD_BYTES};

const LENGTH_PREFIX: usize = 2;

/// Encodes PCM frames and writes them as framed packets
#[derive(Debug)]
pub struct PacketWriter<W: Write> {
    inner: W,
    session: EncoderSession,
    packet: Vec<u8>,
    framed: BytesMut,
    bytes_written: u64,
}

impl<W: Write> PacketWriter<W> {
    /// Initialize an encoder session for `config` writing to `inner`
    pub fn new(inner: W, config: CodecConfig) -> Result<Self> {
        Ok(Self::with_session(inner, EncoderSession::initialize(config)?))
    }

    /// Write packets produced by an existing session
    pub fn with_session(inner: W, session: EncoderSession) -> Self {
        Self {
            inner,
            session,
            packet: vec![0u8; MAX_PAYLOAD_BYTES],
            framed: BytesMut::with_capacity(LENGTH_PREFIX + MAX_PAYLOAD_BYTES),
            bytes_written: 0,
        }
    }

    /// Encode one frame and write it, returning the packet length
    pub fn write_frame(&mut self, pcm: &[i16]) -> Result<usize> {
        let len = self.session.encode(pcm, &mut self.packet)?;
        let prefix = u16::try_from(len).map_err(|_| CodecError::InvalidFrameLength {
            expected: MAX_PAYLOAD_BYTES,
            actual: len,
        })?;

        self.framed.clear();
        self.framed.put_u16(prefix);
        self.framed.put_slice(&self.packet[..len]);
        self.inner.write_all(&self.framed)?;

        self.bytes_written += self.framed.len() as u64;
        Ok(len)
    }

    /// Framed bytes written so far
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    /// The encoder session behind this writer
    pub fn session(&self) -> &EncoderSession {
        &self.session
    }

    /// Flush, release the session and hand back the writer
    pub fn finish(mut self) -> Result<W> {
        self.inner.flush()?;
        debug!(
            "Packet writer finished after {} frames, {} bytes",
            self.session.frames_processed(),
            self.bytes_written
        );
        self.session.release();
        Ok(self.inner)
    }
}

/// Reads framed packets and decodes them into PCM frames
#[derive(Debug)]
pub struct PacketReader<R: Read> {
    inner: R,
    session: DecoderSession,
    packet: Vec<u8>,
}

impl<R: Read> PacketReader<R> {
    /// Initialize a decoder session for `config` reading from `inner`
    pub fn new(inner: R, config: CodecConfig) -> Result<Self> {
        Ok(Self::with_session(inner, DecoderSession::initialize(config)?))
    }

    /// Read packets into an existing session
    pub fn with_session(inner: R, session: DecoderSession) -> Self {
        Self {
            inner,
            session,
            packet: vec![0u8; MAX_PAYLOAD_BYTES],
        }
    }

    /// Read and decode the next packet into `out`.
    ///
    /// Returns the samples per channel, or `None` once the stream ends cleanly
    /// on a packet boundary.
    pub fn read_frame(&mut self, out: &mut [i16]) -> Result<Option<usize>> {
        let mut header = [0u8; LENGTH_PREFIX];
        if !read_header(&mut self.inner, &mut header)? {
            return Ok(None);
        }

        let len = usize::from((&header[..]).get_u16());
        if len == 0 || len > MAX_PAYLOAD_BYTES {
            return Err(CodecError::InvalidFrameLength {
                expected: MAX_PAYLOAD_BYTES,
                actual: len,
            });
        }

        self.inner.read_exact(&mut self.packet[..len])?;
        self.session.decode(&self.packet[..len], out).map(Some)
    }

    /// Read and decode the next packet into a freshly allocated frame
    pub fn next_frame(&mut self) -> Result<Option<Vec<i16>>> {
        let channels = self.session.config().channels as usize;
        let mut pcm = vec![0i16; self.session.config().samples_per_frame()];
        Ok(self.read_frame(&mut pcm)?.map(|produced| {
            pcm.truncate(produced * channels);
            pcm
        }))
    }

    /// The decoder session behind this reader
    pub fn session(&self) -> &DecoderSession {
        &self.session
    }

    /// Release the session and hand back the reader
    pub fn into_inner(self) -> R {
        self.session.release();
        self.inner
    }
}

/// Fill `header`, returning `false` on a clean end of stream
fn read_header(reader: &mut impl Read, header: &mut [u8]) -> Result<bool> {
    let mut filled = 0;
    while filled < header.len() {
        match reader.read(&mut header[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => {
                return Err(CodecError::Io {
                    reason: "stream ended inside a packet header".to_string(),
                })
            }
            Ok(n) => filled += n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        }
    }
    Ok(true)
}

/// Interpret raw little-endian bytes as 16-bit samples, ignoring a trailing odd byte
pub fn pcm_from_le_bytes(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|chunk| i16::from_le_bytes([chunk[0], chunk[1]]))
        .collect()
}

/// Serialize 16-bit samples as raw little-endian bytes
pub fn pcm_to_le_bytes(samples: &[i16]) -> Vec<u8> {
    let mut bytes = BytesMut::with_capacity(samples.len() * 2);
    for &sample in samples {
        bytes.put_i16_le(sample);
    }
    bytes.to_vec()
}

/// Split interleaved samples into frames, zero-padding the last one
pub fn split_frames(
    samples: &[i16],
    samples_per_frame: usize,
) -> impl Iterator<Item = Vec<i16>> + '_ {
    samples.chunks(samples_per_frame.max(1)).map(move |chunk| {
        let mut frame = chunk.to_vec();
        frame.resize(samples_per_frame, 0);
        frame
    })
}
