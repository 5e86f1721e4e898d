//! Errors raised by the addressing domain.

use thiserror::Error;

use super::coordinate::Coordinate;

/// The static layout description is malformed.
///
/// These are construction-time failures.  A layout is compiled into the
/// binary, so any of these aborts startup.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    /// A board mapping does not have exactly one entry per output pin.
    #[error("board mapping must have exactly 8 entries, found {found}")]
    WrongPinCount { found: usize },

    /// A mapping entry names a pin that the register does not have.
    #[error("pin {pin} is out of range (0-7)")]
    PinOutOfRange { pin: u8 },

    /// Two mapping entries drive the same output pin.
    #[error("pin {pin} is assigned more than once")]
    DuplicatePin { pin: u8 },

    /// Two mapping entries of one board name the same coordinate.
    #[error("coordinate {0} is mapped twice on the same board")]
    DuplicateCoordinate(Coordinate),

    /// Two boards in a chain claim the same coordinate.
    #[error("coordinate {coordinate} is claimed by boards {first} and {second}")]
    OverlappingBoards {
        coordinate: Coordinate,
        first: usize,
        second: usize,
    },

    /// A chain must contain at least one board.
    #[error("a board chain needs at least one board")]
    EmptyChain,

    /// The data line selector collides with the reserved reset selector.
    #[error("data line {0} is reserved for the reset frame")]
    ReservedDataLine(u8),
}

/// A runtime request referenced something outside the chain.
///
/// Recoverable: mutations applied before the failing one are kept.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// No board in the chain owns this coordinate.
    #[error("coordinate {0} is not mapped to any valve")]
    Unmapped(Coordinate),

    /// The chain has no board at this position.
    #[error("no board at chain index {index} (chain has {len} boards)")]
    NoSuchBoard { index: usize, len: usize },
}
