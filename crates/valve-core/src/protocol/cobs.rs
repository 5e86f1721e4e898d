//! Consistent Overhead Byte Stuffing (COBS).
//!
//! COBS removes every `0x00` from a payload so that `0x00` can be used as an
//! unambiguous frame delimiter.  The payload is split at each zero byte into
//! blocks; every block is prefixed by a code byte equal to its length plus
//! one, and the zero itself is implied by the next code byte.  Runs of 254
//! non-zero bytes are emitted as a full block with code `0xFF`, which implies
//! no zero.
//!
//! Overhead is at most one byte per 254 payload bytes, plus one.
//!
//! ```text
//! payload:  0B 00 00 0A
//! encoded:  02 0B 01 02 0A
//! ```

use thiserror::Error;

/// Largest number of data bytes one code block can carry.
const MAX_BLOCK: usize = 254;

/// Errors that can occur while decoding stuffed data or frames.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    /// A zero byte appeared inside the encoded region.
    #[error("zero byte inside encoded data at offset {offset}")]
    ZeroInEncoded { offset: usize },

    /// A code byte promised more data than was available.
    #[error("truncated block: need {needed} bytes, got {available}")]
    Truncated { needed: usize, available: usize },

    /// No delimiter terminates the frame.
    #[error("frame is not terminated by a delimiter")]
    MissingDelimiter,

    /// The frame decoded to zero bytes, so it carries no selector.
    #[error("frame carries no selector byte")]
    EmptyFrame,

    /// The receive buffer grew past its limit before a delimiter arrived.
    #[error("frame exceeds {limit} bytes without a delimiter")]
    Oversized { limit: usize },
}

/// Returns the worst-case encoded length for `len` payload bytes.
pub fn max_encoded_len(len: usize) -> usize {
    len + len / MAX_BLOCK + 1
}

/// Byte-stuffs `input`.  The result never contains `0x00` and does not
/// include the trailing delimiter.
///
/// # Examples
///
/// ```rust
/// use valve_core::protocol::cobs::{decode, encode};
///
/// let stuffed = encode(&[0x11, 0x00, 0x22]);
/// assert_eq!(stuffed, vec![0x02, 0x11, 0x02, 0x22]);
/// assert_eq!(decode(&stuffed).unwrap(), vec![0x11, 0x00, 0x22]);
/// ```
pub fn encode(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(max_encoded_len(input.len()));
    let mut block_start = 0;
    // Whether the last block boundary was a real zero (which still needs a
    // closing block) or a full 254-byte run (which does not).
    let mut ends_on_zero = true;

    for (idx, &byte) in input.iter().enumerate() {
        if byte == 0 {
            push_block(&mut out, &input[block_start..idx]);
            block_start = idx + 1;
            ends_on_zero = true;
        } else if idx + 1 - block_start == MAX_BLOCK {
            push_block(&mut out, &input[block_start..=idx]);
            block_start = idx + 1;
            ends_on_zero = false;
        }
    }

    if block_start != input.len() || ends_on_zero {
        push_block(&mut out, &input[block_start..]);
    }
    out
}

/// Reverses [`encode`].  `encoded` must not include the delimiter.
///
/// # Errors
///
/// Returns [`ProtocolError::ZeroInEncoded`] if `encoded` contains `0x00`, or
/// [`ProtocolError::Truncated`] if the last block is cut short.
pub fn decode(encoded: &[u8]) -> Result<Vec<u8>, ProtocolError> {
    let mut out = Vec::with_capacity(encoded.len());
    let mut idx = 0;

    while idx < encoded.len() {
        let code = encoded[idx] as usize;
        if code == 0 {
            return Err(ProtocolError::ZeroInEncoded { offset: idx });
        }
        idx += 1;

        let end = idx + code - 1;
        if end > encoded.len() {
            return Err(ProtocolError::Truncated {
                needed: end,
                available: encoded.len(),
            });
        }

        let block = &encoded[idx..end];
        if let Some(pos) = block.iter().position(|&b| b == 0) {
            return Err(ProtocolError::ZeroInEncoded { offset: idx + pos });
        }
        out.extend_from_slice(block);
        idx = end;

        if code <= MAX_BLOCK && idx < encoded.len() {
            out.push(0);
        }
    }
    Ok(out)
}

fn push_block(out: &mut Vec<u8>, block: &[u8]) {
    out.push(block.len() as u8 + 1);
    out.extend_from_slice(block);
}

#[cfg(test)]
mod tests {
    use super::*;
    use quickcheck::quickcheck;

    // Reference vectors for the standard COBS algorithm.

    #[test]
    fn test_encode_empty() {
        assert_eq!(encode(&[]), vec![0x01]);
    }

    #[test]
    fn test_encode_single_zero() {
        assert_eq!(encode(&[0x00]), vec![0x01, 0x01]);
    }

    #[test]
    fn test_encode_two_zeros() {
        assert_eq!(encode(&[0x00, 0x00]), vec![0x01, 0x01, 0x01]);
    }

    #[test]
    fn test_encode_mixed() {
        assert_eq!(
            encode(&[0x11, 0x22, 0x00, 0x33]),
            vec![0x03, 0x11, 0x22, 0x02, 0x33]
        );
    }

    #[test]
    fn test_encode_trailing_zero() {
        assert_eq!(
            encode(&[0x11, 0x00, 0x00, 0x00]),
            vec![0x02, 0x11, 0x01, 0x01, 0x01]
        );
    }

    #[test]
    fn test_encode_full_block_has_no_trailing_code() {
        // Arrange: 254 non-zero bytes fill exactly one block
        let input: Vec<u8> = (1..=254).map(|b| b as u8).collect();

        // Act
        let encoded = encode(&input);

        // Assert
        assert_eq!(encoded.len(), 255);
        assert_eq!(encoded[0], 0xFF);
        assert_eq!(&encoded[1..], &input[..]);
    }

    #[test]
    fn test_encode_255_non_zero_bytes_spills_into_second_block() {
        let input = vec![0x42; 255];
        let encoded = encode(&input);
        assert_eq!(encoded.len(), 257);
        assert_eq!(encoded[0], 0xFF);
        assert_eq!(encoded[255], 0x02);
        assert_eq!(encoded[256], 0x42);
    }

    #[test]
    fn test_full_block_followed_by_zero() {
        let mut input = vec![0x01; 254];
        input.push(0x00);
        let encoded = encode(&input);
        assert_eq!(encoded[0], 0xFF);
        assert_eq!(&encoded[255..], &[0x01, 0x01]);
        assert_eq!(decode(&encoded).expect("valid"), input);
    }

    #[test]
    fn test_decode_rejects_zero_code() {
        assert_eq!(
            decode(&[0x02, 0x11, 0x00]),
            Err(ProtocolError::ZeroInEncoded { offset: 2 })
        );
    }

    #[test]
    fn test_decode_rejects_zero_inside_block() {
        assert_eq!(
            decode(&[0x03, 0x00, 0x11]),
            Err(ProtocolError::ZeroInEncoded { offset: 1 })
        );
    }

    #[test]
    fn test_decode_rejects_truncated_block() {
        assert_eq!(
            decode(&[0x05, 0x11, 0x22]),
            Err(ProtocolError::Truncated { needed: 5, available: 3 })
        );
    }

    #[test]
    fn test_max_encoded_len_bounds_long_payloads() {
        let input = vec![0x7F; 1000];
        assert!(encode(&input).len() <= max_encoded_len(input.len()));
    }

    quickcheck! {
        fn prop_decode_inverts_encode(payload: Vec<u8>) -> bool {
            decode(&encode(&payload)) == Ok(payload)
        }

        fn prop_encoded_never_contains_delimiter(payload: Vec<u8>) -> bool {
            !encode(&payload).contains(&0x00)
        }

        fn prop_encoded_len_within_bound(payload: Vec<u8>) -> bool {
            encode(&payload).len() <= max_encoded_len(payload.len())
        }
    }
}
