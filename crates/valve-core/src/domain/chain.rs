//! A daisy chain of shift register boards sharing one data line.
//!
//! # Shift order
//!
//! Bits are shifted into the first board of the chain and ripple towards the
//! last one.  After `N` bytes have been clocked in, the byte sent *first* has
//! travelled furthest and sits in the last board.  [`BoardChain::to_bytes`]
//! therefore emits the boards in reverse wiring order:
//!
//! ```text
//! wiring:  MCU -> b0 -> b1 -> ... -> b(N-1)
//! bytes:   [b(N-1), ..., b1, b0]
//! ```

use std::collections::HashMap;

use super::board::RegisterBoard;
use super::coordinate::Coordinate;
use super::error::{AddressError, LayoutError};
use super::layout::BoardSpec;

/// An ordered chain of boards plus the routing table built from them.
///
/// The routing table maps each owned coordinate to the index of its board in
/// `boards`.  It is built once; the chain is never restructured afterwards.
#[derive(Debug, Clone)]
pub struct BoardChain {
    boards: Vec<RegisterBoard>,
    routes: HashMap<Coordinate, usize>,
}

impl BoardChain {
    /// Builds a chain from boards listed in physical wiring order.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError::OverlappingBoards`] if any coordinate is claimed
    /// by more than one board, or [`LayoutError::EmptyChain`] for no boards.
    pub fn new(boards: Vec<RegisterBoard>) -> Result<Self, LayoutError> {
        if boards.is_empty() {
            return Err(LayoutError::EmptyChain);
        }

        let mut routes = HashMap::with_capacity(boards.len() * super::board::PINS_PER_BOARD);
        for (index, board) in boards.iter().enumerate() {
            for coordinate in board.coordinates() {
                if let Some(first) = routes.insert(coordinate, index) {
                    return Err(LayoutError::OverlappingBoards {
                        coordinate,
                        first,
                        second: index,
                    });
                }
            }
        }

        Ok(Self { boards, routes })
    }

    /// Builds every board in `specs` and chains them in the given order.
    ///
    /// # Errors
    ///
    /// Returns the first [`LayoutError`] from any board or from chaining.
    pub fn from_specs(specs: &[BoardSpec]) -> Result<Self, LayoutError> {
        let boards = specs
            .iter()
            .map(BoardSpec::build)
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(boards)
    }

    /// Sets one valve.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Unmapped`] if no board owns `coordinate`.
    pub fn set(&mut self, coordinate: Coordinate, value: bool) -> Result<(), AddressError> {
        let index = self.route(coordinate)?;
        self.boards[index].set(coordinate, value);
        Ok(())
    }

    /// Sets several valves in order.
    ///
    /// Not transactional: when an unmapped coordinate is reached, the
    /// coordinates before it stay applied and the rest are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Unmapped`] for the first unmapped coordinate.
    pub fn set_many<I>(&mut self, coordinates: I, value: bool) -> Result<(), AddressError>
    where
        I: IntoIterator<Item = Coordinate>,
    {
        for coordinate in coordinates {
            self.set(coordinate, value)?;
        }
        Ok(())
    }

    /// Returns the state of one valve.
    ///
    /// # Errors
    ///
    /// Returns [`AddressError::Unmapped`] if no board owns `coordinate`.
    pub fn get(&self, coordinate: Coordinate) -> Result<bool, AddressError> {
        let index = self.route(coordinate)?;
        Ok(self.boards[index].get(coordinate).unwrap_or(false))
    }

    /// Opens every valve.
    pub fn fill(&mut self) {
        self.boards.iter_mut().for_each(RegisterBoard::fill);
    }

    /// Closes every valve.
    pub fn clear(&mut self) {
        self.boards.iter_mut().for_each(RegisterBoard::clear);
    }

    /// Serializes all boards, one byte each, in reverse wiring order.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.boards.iter().rev().map(RegisterBoard::to_byte).collect()
    }

    /// Maps a byte string produced by [`to_bytes`](Self::to_bytes) back to the
    /// set of open coordinates, sorted.
    ///
    /// Returns `None` if `bytes` does not hold exactly one byte per board.
    pub fn decode_state(&self, bytes: &[u8]) -> Option<Vec<Coordinate>> {
        if bytes.len() != self.boards.len() {
            return None;
        }
        let mut open: Vec<Coordinate> = self
            .boards
            .iter()
            .rev()
            .zip(bytes)
            .flat_map(|(board, &byte)| board.decode_byte(byte))
            .collect();
        open.sort_unstable();
        Some(open)
    }

    /// Returns `true` when some board owns `coordinate`.
    pub fn contains(&self, coordinate: Coordinate) -> bool {
        self.routes.contains_key(&coordinate)
    }

    /// Returns the chain index of the board owning `coordinate`.
    pub fn board_index(&self, coordinate: Coordinate) -> Option<usize> {
        self.routes.get(&coordinate).copied()
    }

    /// Iterates every addressable coordinate, board by board in wiring order.
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.boards.iter().flat_map(RegisterBoard::coordinates)
    }

    /// Returns the board at `index` in wiring order.
    pub fn board(&self, index: usize) -> Result<&RegisterBoard, AddressError> {
        let len = self.boards.len();
        self.boards
            .get(index)
            .ok_or(AddressError::NoSuchBoard { index, len })
    }

    /// Mutable access to the board at `index` in wiring order.
    pub fn board_mut(&mut self, index: usize) -> Result<&mut RegisterBoard, AddressError> {
        let len = self.boards.len();
        self.boards
            .get_mut(index)
            .ok_or(AddressError::NoSuchBoard { index, len })
    }

    /// Iterates boards in wiring order.
    pub fn iter(&self) -> impl Iterator<Item = &RegisterBoard> {
        self.boards.iter()
    }

    /// Number of boards.
    pub fn len(&self) -> usize {
        self.boards.len()
    }

    /// Always `false` for a constructed chain.
    pub fn is_empty(&self) -> bool {
        self.boards.is_empty()
    }

    /// One [`RegisterBoard`] rendering per board, in wiring order.
    pub fn render(&self) -> String {
        self.boards
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn route(&self, coordinate: Coordinate) -> Result<usize, AddressError> {
        self.board_index(coordinate)
            .ok_or(AddressError::Unmapped(coordinate))
    }
}
