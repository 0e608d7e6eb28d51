//! Length-prefixed frame codec for the TLS transport.
//!
//! Each frame consists of:
//!
//! ```text
//! +----------------------------+------------------+
//! | Length (2 bytes, BE)       | UTF-8 payload    |
//! +----------------------------+------------------+
//! ```
//!
//! This is the framing contract expected by compatible clients: a 16-bit
//! big-endian byte count followed by that many UTF-8 bytes. The length is
//! validated before allocation and the payload must be valid UTF-8; frames
//! that are not are rejected at the codec.

use bytes::{Buf, BufMut, BytesMut};
use thiserror::Error;
use tokio_util::codec::{Decoder, Encoder};

/// Length of the frame header (2 bytes for the u16 length prefix).
const HEADER_LEN: usize = 2;

/// Maximum payload size representable by the 16-bit length prefix.
pub const MAX_FRAME_SIZE: usize = u16::MAX as usize;

/// Errors produced by the frame codec.
#[derive(Debug, Error)]
pub enum FramingError {
    /// The payload does not fit the 16-bit length prefix.
    #[error("frame too large: {size} bytes exceeds maximum of {max} bytes")]
    FrameTooLarge {
        /// Attempted payload size.
        size: usize,
        /// Maximum representable size.
        max: usize,
    },

    /// The payload is not valid UTF-8.
    #[error("frame payload is not valid UTF-8")]
    InvalidUtf8,

    /// An I/O error surfaced through the framed stream.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Frame codec implementing the length-prefixed UTF-8 framing.
///
/// Used with [`tokio_util::codec::Framed`] to provide one-frame-in,
/// one-frame-out I/O over the TLS stream.
#[derive(Debug, Clone, Copy, Default)]
pub struct FrameCodec;

impl FrameCodec {
    /// Creates the codec.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Decoder for FrameCodec {
    type Item = String;
    type Error = FramingError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, FramingError> {
        if src.len() < HEADER_LEN {
            return Ok(None);
        }

        // Read the length prefix without consuming it; with a 16-bit prefix
        // the length can never exceed MAX_FRAME_SIZE.
        let length = u16::from_be_bytes([src[0], src[1]]) as usize;

        let total_len = HEADER_LEN + length;
        if src.len() < total_len {
            src.reserve(total_len - src.len());
            return Ok(None);
        }

        src.advance(HEADER_LEN);
        let payload = src.split_to(length);
        let text = std::str::from_utf8(&payload)
            .map_err(|_| FramingError::InvalidUtf8)?
            .to_owned();
        Ok(Some(text))
    }
}

impl Encoder<&str> for FrameCodec {
    type Error = FramingError;

    fn encode(&mut self, item: &str, dst: &mut BytesMut) -> Result<(), FramingError> {
        let payload = item.as_bytes();
        if payload.len() > MAX_FRAME_SIZE {
            return Err(FramingError::FrameTooLarge {
                size: payload.len(),
                max: MAX_FRAME_SIZE,
            });
        }
        dst.reserve(HEADER_LEN + payload.len());
        #[allow(clippy::cast_possible_truncation)] // validated above
        dst.put_u16(payload.len() as u16);
        dst.extend_from_slice(payload);
        Ok(())
    }
}

impl Encoder<String> for FrameCodec {
    type Error = FramingError;

    fn encode(&mut self, item: String, dst: &mut BytesMut) -> Result<(), FramingError> {
        self.encode(item.as_str(), dst)
    }
}
