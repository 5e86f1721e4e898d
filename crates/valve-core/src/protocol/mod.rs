//! Serial wire protocol: byte stuffing and frame construction.

pub mod cobs;
pub mod frame;

pub use cobs::ProtocolError;
pub use frame::{
    decode_frame, encode_frame, reset_frame, state_frame, DecodedFrame, FrameDecoder,
    DEFAULT_DATA_LINE, DELIMITER, RESET_SELECTOR,
};
