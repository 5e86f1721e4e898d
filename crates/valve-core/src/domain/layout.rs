//! Compiled-in layout of the physical valve table.
//!
//! The table is 14 cells wide and 12 cells tall, covered by 21 boards of
//! 2x4 cells each.  Boards are listed in the order they are wired on the data
//! line, starting at the microcontroller.  Wiring snakes up and down the
//! columns, so every other column of boards is mounted upside down and uses
//! the [`Mirror::Both`] transform.

use super::board::{Mirror, RegisterBoard};
use super::coordinate::Coordinate;
use super::error::LayoutError;

/// Width of the table in cells.
pub const TABLE_WIDTH: i32 = 14;

/// Height of the table in cells.
pub const TABLE_HEIGHT: i32 = 12;

/// Base mapping of an upright board: column 0 on pins 0-3, column 1 on pins
/// 4-7, top to bottom.
pub const STANDARD_MAPPING: [(Coordinate, u8); 8] = [
    (Coordinate::new(0, 0), 0),
    (Coordinate::new(0, 1), 1),
    (Coordinate::new(0, 2), 2),
    (Coordinate::new(0, 3), 3),
    (Coordinate::new(1, 0), 4),
    (Coordinate::new(1, 1), 5),
    (Coordinate::new(1, 2), 6),
    (Coordinate::new(1, 3), 7),
];

/// Static description of one board in a chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardSpec {
    /// Identifier shown in diagnostics.
    pub id: Option<u32>,
    /// Added to every coordinate of the (mirrored) mapping.
    pub offset: Coordinate,
    /// Base `(coordinate, pin)` mapping.
    pub mapping: &'static [(Coordinate, u8)],
    pub mirror: Mirror,
}

impl BoardSpec {
    /// An upright board using [`STANDARD_MAPPING`].
    pub const fn standard(id: u32, x: i32, y: i32) -> Self {
        Self {
            id: Some(id),
            offset: Coordinate::new(x, y),
            mapping: &STANDARD_MAPPING,
            mirror: Mirror::None,
        }
    }

    /// A board mounted upside down: [`STANDARD_MAPPING`] turned by half a turn.
    pub const fn flipped(id: u32, x: i32, y: i32) -> Self {
        Self {
            id: Some(id),
            offset: Coordinate::new(x, y),
            mapping: &STANDARD_MAPPING,
            mirror: Mirror::Both,
        }
    }

    /// Builds the described board with all outputs closed.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] if the mapping is malformed.
    pub fn build(&self) -> Result<RegisterBoard, LayoutError> {
        RegisterBoard::new(self.mapping, self.offset, self.mirror, self.id)
    }
}

/// The 21-board chain of the table, in wiring order.
pub const TABLE_LAYOUT: [BoardSpec; 21] = [
    BoardSpec::standard(0, 12, 8),
    BoardSpec::standard(1, 12, 4),
    BoardSpec::standard(2, 12, 0),
    BoardSpec::flipped(3, 10, 0),
    BoardSpec::flipped(4, 10, 4),
    BoardSpec::flipped(5, 10, 8),
    BoardSpec::standard(6, 8, 8),
    BoardSpec::standard(7, 8, 4),
    BoardSpec::standard(8, 8, 0),
    BoardSpec::flipped(9, 6, 0),
    BoardSpec::flipped(10, 6, 4),
    BoardSpec::flipped(11, 6, 8),
    BoardSpec::standard(12, 4, 8),
    BoardSpec::standard(13, 4, 4),
    BoardSpec::standard(14, 4, 0),
    BoardSpec::flipped(15, 2, 0),
    BoardSpec::flipped(16, 2, 4),
    BoardSpec::flipped(17, 2, 8),
    BoardSpec::standard(18, 0, 8),
    BoardSpec::standard(19, 0, 4),
    BoardSpec::standard(20, 0, 0),
];
