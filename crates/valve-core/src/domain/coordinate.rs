//! Logical board coordinates.

use std::fmt;
use std::ops::Add;

/// A cell on the game board in logical (x, y) grid space.
///
/// Coordinates are independent of the physical wiring: the same value is
/// used by the vision layer, the game engine, and the valve routing table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    /// Creates a coordinate.
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Returns a new coordinate shifted by `delta`.
    ///
    /// `delta` may be another [`Coordinate`], an `(x, y)` pair, or a scalar
    /// that is added to both axes.
    ///
    /// ```rust
    /// use valve_core::Coordinate;
    ///
    /// let c = Coordinate::new(1, 2);
    /// assert_eq!(c.translate(Coordinate::new(10, 20)), Coordinate::new(11, 22));
    /// assert_eq!(c.translate((3, 0)), Coordinate::new(4, 2));
    /// assert_eq!(c.translate(5), Coordinate::new(6, 7));
    /// ```
    pub fn translate<D>(self, delta: D) -> Self
    where
        Self: Add<D, Output = Self>,
    {
        self + delta
    }
}

impl Add for Coordinate {
    type Output = Coordinate;

    fn add(self, other: Coordinate) -> Coordinate {
        Coordinate::new(self.x + other.x, self.y + other.y)
    }
}

impl Add<(i32, i32)> for Coordinate {
    type Output = Coordinate;

    fn add(self, (dx, dy): (i32, i32)) -> Coordinate {
        Coordinate::new(self.x + dx, self.y + dy)
    }
}

impl Add<i32> for Coordinate {
    type Output = Coordinate;

    fn add(self, d: i32) -> Coordinate {
        Coordinate::new(self.x + d, self.y + d)
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Coordinate::new(x, y)
    }
}

impl PartialEq<(i32, i32)> for Coordinate {
    fn eq(&self, other: &(i32, i32)) -> bool {
        self.x == other.0 && self.y == other.1
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_translate_does_not_mutate_original() {
        // Arrange
        let original = Coordinate::new(2, 3);

        // Act
        let moved = original.translate((1, 1));

        // Assert
        assert_eq!(original, Coordinate::new(2, 3));
        assert_eq!(moved, Coordinate::new(3, 4));
    }

    #[test]
    fn test_translate_by_negative_scalar() {
        assert_eq!(Coordinate::new(4, 4).translate(-4), Coordinate::new(0, 0));
    }

    #[test]
    fn test_coordinate_equals_matching_pair() {
        assert_eq!(Coordinate::new(7, -1), (7, -1));
        assert_ne!(Coordinate::new(7, -1), (-1, 7));
    }

    #[test]
    fn test_coordinate_works_as_map_key() {
        // Arrange
        let mut map = HashMap::new();
        map.insert(Coordinate::new(1, 2), "a");

        // Act: a structurally equal value built another way must hit the same key
        let key: Coordinate = (1, 2).into();

        // Assert
        assert_eq!(map.get(&key), Some(&"a"));
    }

    #[test]
    fn test_display_format() {
        assert_eq!(Coordinate::new(12, -3).to_string(), "(12, -3)");
    }
}
