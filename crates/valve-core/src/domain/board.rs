//! A single 8-output shift register board.
//!
//! Each board drives eight valves.  The board is described by a mapping from
//! board cells to output pins, which is placed on the table by an optional
//! mirror transform followed by a translation offset.
//!
//! Pin labels as printed on the board, viewed with the barrel connector at
//! the bottom right:
//!
//! ```text
//! C4 - E (4) |---| C8 - A (0)
//! C3 - F (5) |   | C7 - B (1)
//! C2 - G (6) |   | C6 - C (2)
//! C1 - H (7) |---| C5 - D (3)
//! ```
//!
//! # Wire bit order
//!
//! [`RegisterBoard::to_byte`] packs pin 0 into the most significant bit and
//! pin 7 into the least significant bit.  The microcontroller shifts each
//! byte out MSB first, so this order is part of the wire contract.

use std::fmt;

use super::coordinate::Coordinate;
use super::error::LayoutError;

/// Number of outputs on one shift register.
pub const PINS_PER_BOARD: usize = 8;

/// Axis mirroring applied to a base mapping before the offset.
///
/// Boards mounted upside down relative to their neighbours reuse the standard
/// mapping with a mirror rather than a separate table.  The mirror is taken
/// within the bounding box of the base mapping, so a mirrored 2x4 mapping
/// still occupies the same 2x4 cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mirror {
    #[default]
    None,
    /// Flip left-right (x axis reversed).
    Horizontal,
    /// Flip top-bottom (y axis reversed).
    Vertical,
    /// Both flips, i.e. a half turn.
    Both,
}

impl Mirror {
    fn flips_x(self) -> bool {
        matches!(self, Mirror::Horizontal | Mirror::Both)
    }

    fn flips_y(self) -> bool {
        matches!(self, Mirror::Vertical | Mirror::Both)
    }
}

/// One physical shift register board and its current output state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegisterBoard {
    id: Option<u32>,
    /// `cells[pin]` is the coordinate driven by that pin.
    cells: [Coordinate; PINS_PER_BOARD],
    /// Output state, already in wire bit order (pin 0 = MSB).
    bits: u8,
}

impl RegisterBoard {
    /// Builds a board from a base `mapping` of `(coordinate, pin)` pairs.
    ///
    /// `mirror` is applied first, then `offset` is added to every coordinate.
    /// All outputs start closed.
    ///
    /// # Errors
    ///
    /// Returns [`LayoutError`] unless the mapping assigns exactly one distinct
    /// coordinate to each of the pins 0-7.
    pub fn new(
        mapping: &[(Coordinate, u8)],
        offset: Coordinate,
        mirror: Mirror,
        id: Option<u32>,
    ) -> Result<Self, LayoutError> {
        if mapping.len() != PINS_PER_BOARD {
            return Err(LayoutError::WrongPinCount {
                found: mapping.len(),
            });
        }

        let min_x = mapping.iter().map(|(c, _)| c.x).min().unwrap_or(0);
        let max_x = mapping.iter().map(|(c, _)| c.x).max().unwrap_or(0);
        let min_y = mapping.iter().map(|(c, _)| c.y).min().unwrap_or(0);
        let max_y = mapping.iter().map(|(c, _)| c.y).max().unwrap_or(0);

        let mut slots: [Option<Coordinate>; PINS_PER_BOARD] = [None; PINS_PER_BOARD];
        for &(base, pin) in mapping {
            let slot = slots
                .get_mut(pin as usize)
                .ok_or(LayoutError::PinOutOfRange { pin })?;
            if slot.is_some() {
                return Err(LayoutError::DuplicatePin { pin });
            }

            let mirrored = Coordinate::new(
                if mirror.flips_x() { min_x + max_x - base.x } else { base.x },
                if mirror.flips_y() { min_y + max_y - base.y } else { base.y },
            );
            *slot = Some(mirrored.translate(offset));
        }

        // Eight entries with eight distinct in-range pins fill every slot.
        let mut cells = [Coordinate::default(); PINS_PER_BOARD];
        for (pin, slot) in slots.into_iter().enumerate() {
            let coordinate = slot.ok_or(LayoutError::WrongPinCount {
                found: mapping.len(),
            })?;
            if cells[..pin].contains(&coordinate) {
                return Err(LayoutError::DuplicateCoordinate(coordinate));
            }
            cells[pin] = coordinate;
        }

        Ok(Self { id, cells, bits: 0 })
    }

    /// Board identifier used in diagnostics output.
    pub fn id(&self) -> Option<u32> {
        self.id
    }

    /// Sets the valve at `coordinate` open (`true`) or closed (`false`).
    ///
    /// Returns `false` without changing anything when this board does not own
    /// `coordinate`.  That is an expected outcome when probing boards, not an
    /// error.
    pub fn set(&mut self, coordinate: Coordinate, value: bool) -> bool {
        match self.pin_of(coordinate) {
            Some(pin) => {
                self.set_pin(pin, value);
                true
            }
            None => false,
        }
    }

    /// Returns the state of the valve at `coordinate`, or `None` if this board
    /// does not own it.
    pub fn get(&self, coordinate: Coordinate) -> Option<bool> {
        self.pin_of(coordinate).map(|pin| self.pin_state(pin))
    }

    /// Closes all eight valves.
    pub fn clear(&mut self) {
        self.bits = 0x00;
    }

    /// Opens all eight valves.
    pub fn fill(&mut self) {
        self.bits = 0xFF;
    }

    /// Packs the eight outputs into one byte in wire bit order.
    pub fn to_byte(&self) -> u8 {
        self.bits
    }

    /// Returns the output pin driving `coordinate`, if owned.
    pub fn pin_of(&self, coordinate: Coordinate) -> Option<u8> {
        self.cells
            .iter()
            .position(|&c| c == coordinate)
            .map(|pin| pin as u8)
    }

    /// Returns the coordinate driven by `pin`.
    pub fn coordinate_of(&self, pin: u8) -> Option<Coordinate> {
        self.cells.get(pin as usize).copied()
    }

    /// Returns `true` when this board owns `coordinate`.
    pub fn owns(&self, coordinate: Coordinate) -> bool {
        self.pin_of(coordinate).is_some()
    }

    /// Returns the state of one output pin.  Pins above 7 read as closed.
    pub fn pin_state(&self, pin: u8) -> bool {
        pin_mask(pin).is_some_and(|mask| self.bits & mask != 0)
    }

    /// Iterates the owned coordinates in pin order.
    pub fn coordinates(&self) -> impl Iterator<Item = Coordinate> + '_ {
        self.cells.iter().copied()
    }

    /// Iterates the coordinates whose bit is set in a byte produced by
    /// [`to_byte`](Self::to_byte) for this board.
    pub fn decode_byte(&self, byte: u8) -> impl Iterator<Item = Coordinate> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(move |(pin, _)| pin_mask(*pin as u8).is_some_and(|mask| byte & mask != 0))
            .map(|(_, &c)| c)
    }

    fn set_pin(&mut self, pin: u8, value: bool) {
        if let Some(mask) = pin_mask(pin) {
            if value {
                self.bits |= mask;
            } else {
                self.bits &= !mask;
            }
        }
    }
}

/// Bit of the wire byte that carries `pin`.
fn pin_mask(pin: u8) -> Option<u8> {
    (pin < PINS_PER_BOARD as u8).then(|| 0x80 >> pin)
}

/// Renders as `<id>-` followed by one character per pin: `1` open, `.` closed.
impl fmt::Display for RegisterBoard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(id) = self.id {
            write!(f, "{id}-")?;
        }
        for pin in 0..PINS_PER_BOARD as u8 {
            f.write_str(if self.pin_state(pin) { "1" } else { "." })?;
        }
        Ok(())
    }
}
