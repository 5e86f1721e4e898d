//! Frame construction and decoding for the microcontroller link.
//!
//! Wire format:
//! ```text
//! cobs([selector:1][chain bytes:N]) 0x00
//! ```
//! The selector names the data line (output pin on the microcontroller) the
//! chain bytes are shifted out on.  The selector [`RESET_SELECTOR`] with no
//! chain bytes is the reset frame, sent once when a link is opened.
//!
//! There is no acknowledgement.  Because every state frame carries the full
//! chain state, a receiver that lost a frame converges at the next one, and a
//! receiver that saw garbage resynchronises at the next delimiter.

use tracing::trace;

use super::cobs::{self, ProtocolError};
use crate::domain::chain::BoardChain;

/// Terminates every frame.  Never appears inside a stuffed frame body.
pub const DELIMITER: u8 = 0x00;

/// Selector reserved for the reset frame.
///
/// Pin 0 is the UART receive line on the microcontroller, so it can never
/// be a data line.
pub const RESET_SELECTOR: u8 = 0x00;

/// Data line of the table's board chain.
pub const DEFAULT_DATA_LINE: u8 = 11;

/// Default receive buffer limit for [`FrameDecoder`].
const DEFAULT_MAX_FRAME: usize = 1024;

/// Builds a complete frame: stuffed `[selector] + payload`, then [`DELIMITER`].
pub fn encode_frame(selector: u8, payload: &[u8]) -> Vec<u8> {
    let mut raw = Vec::with_capacity(1 + payload.len());
    raw.push(selector);
    raw.extend_from_slice(payload);

    let mut frame = cobs::encode(&raw);
    frame.push(DELIMITER);
    frame
}

/// The reset frame: [`RESET_SELECTOR`] with an empty payload.
///
/// ```rust
/// use valve_core::protocol::reset_frame;
///
/// assert_eq!(reset_frame(), vec![0x01, 0x01, 0x00]);
/// ```
pub fn reset_frame() -> Vec<u8> {
    encode_frame(RESET_SELECTOR, &[])
}

/// The state frame carrying the whole chain on `data_line`.
pub fn state_frame(data_line: u8, chain: &BoardChain) -> Vec<u8> {
    encode_frame(data_line, &chain.to_bytes())
}

/// A frame recovered from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedFrame {
    pub selector: u8,
    pub payload: Vec<u8>,
}

impl DecodedFrame {
    /// Returns `true` for the reset frame.
    pub fn is_reset(&self) -> bool {
        self.selector == RESET_SELECTOR && self.payload.is_empty()
    }
}

/// Decodes the first frame in `bytes`.
///
/// Returns the frame and the number of bytes consumed, delimiter included.
///
/// # Errors
///
/// Returns [`ProtocolError::MissingDelimiter`] if `bytes` holds no complete
/// frame, or a stuffing / empty-frame error for a corrupt one.
pub fn decode_frame(bytes: &[u8]) -> Result<(DecodedFrame, usize), ProtocolError> {
    let end = bytes
        .iter()
        .position(|&b| b == DELIMITER)
        .ok_or(ProtocolError::MissingDelimiter)?;
    let frame = decode_body(&bytes[..end])?;
    Ok((frame, end + 1))
}

fn decode_body(body: &[u8]) -> Result<DecodedFrame, ProtocolError> {
    let raw = cobs::decode(body)?;
    let (&selector, payload) = raw.split_first().ok_or(ProtocolError::EmptyFrame)?;
    Ok(DecodedFrame {
        selector,
        payload: payload.to_vec(),
    })
}

/// Incremental receiver that splits a byte stream into frames.
///
/// Bytes are buffered until a delimiter arrives; the buffered body is then
/// decoded and the buffer reset.  A corrupt body yields an error for that
/// frame only, and decoding continues with the next byte, so the decoder
/// always resynchronises at the next delimiter.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: Vec<u8>,
    max_frame: usize,
    overflowed: bool,
}

impl FrameDecoder {
    /// Creates a decoder with a 1 KiB frame limit.
    pub fn new() -> Self {
        Self::with_max_frame(DEFAULT_MAX_FRAME)
    }

    /// Creates a decoder that drops frame bodies longer than `max_frame`.
    pub fn with_max_frame(max_frame: usize) -> Self {
        Self {
            buf: Vec::new(),
            max_frame,
            overflowed: false,
        }
    }

    /// Feeds one byte.  Returns a result whenever a delimiter closes a frame.
    ///
    /// Consecutive delimiters (empty bodies) are skipped silently.
    pub fn push(&mut self, byte: u8) -> Option<Result<DecodedFrame, ProtocolError>> {
        if byte != DELIMITER {
            if self.buf.len() < self.max_frame {
                self.buf.push(byte);
            } else {
                self.overflowed = true;
            }
            return None;
        }

        if std::mem::take(&mut self.overflowed) {
            self.buf.clear();
            trace!(limit = self.max_frame, "dropped oversized frame");
            return Some(Err(ProtocolError::Oversized {
                limit: self.max_frame,
            }));
        }
        if self.buf.is_empty() {
            return None;
        }

        let result = decode_body(&self.buf);
        self.buf.clear();
        Some(result)
    }

    /// Feeds a slice and collects every completed frame result.
    pub fn feed(&mut self, bytes: &[u8]) -> Vec<Result<DecodedFrame, ProtocolError>> {
        bytes.iter().filter_map(|&b| self.push(b)).collect()
    }

    /// Number of bytes buffered for the frame in progress.
    pub fn pending(&self) -> usize {
        self.buf.len()
    }
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}
