//! Board Geometry
//!
//! Cells, directions and the pure helpers used to place players and coins.
//! A cell is persisted as `"<x>,<y>"`, where `x` runs along the board width
//! and `y` along its height.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::rng::GameRng;

// =============================================================================
// CELL
// =============================================================================

/// A board cell.
///
/// Serializes as the same `"x,y"` string used in the store, so it can be a
/// map key in JSON.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[derive(Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Cell {
    /// Column, in `[0, width - 1]`.
    pub x: i32,
    /// Row, in `[0, height - 1]`.
    pub y: i32,
}

impl Cell {
    /// Create a cell from raw coordinates.
    #[inline]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Check if the cell lies on a `width` x `height` board.
    #[inline]
    pub fn is_on_board(self, width: i32, height: i32) -> bool {
        (0..width).contains(&self.x) && (0..height).contains(&self.y)
    }

    /// Move one step in `direction`, stopping at the board edge.
    pub fn step(self, direction: Direction, width: i32, height: i32) -> Self {
        let (dx, dy) = direction.delta();
        Self {
            x: clamp(self.x + dx, 0, width - 1),
            y: clamp(self.y + dy, 0, height - 1),
        }
    }

    /// Map a linear board index (row-major) back to a cell.
    #[inline]
    pub fn from_index(index: usize, width: i32) -> Self {
        let width = width.max(1) as usize;
        Self {
            x: (index % width) as i32,
            y: (index / width) as i32,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.x, self.y)
    }
}

/// Error parsing a persisted cell string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed cell {0:?}, expected \"x,y\"")]
pub struct CellParseError(pub String);

impl FromStr for Cell {
    type Err = CellParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CellParseError(s.to_string());
        let (x, y) = s.split_once(',').ok_or_else(malformed)?;
        let x = x.trim().parse().map_err(|_| malformed())?;
        let y = y.trim().parse().map_err(|_| malformed())?;
        Ok(Self { x, y })
    }
}

impl From<Cell> for String {
    fn from(cell: Cell) -> Self {
        cell.to_string()
    }
}

impl TryFrom<String> for Cell {
    type Error = CellParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

// =============================================================================
// DIRECTION
// =============================================================================

/// One of the four move directions a client may send.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// `"U"`
    Up,
    /// `"R"`
    Right,
    /// `"D"`
    Down,
    /// `"L"`
    Left,
}

impl Direction {
    /// All directions, in wire order.
    pub const ALL: [Direction; 4] = [Self::Up, Self::Right, Self::Down, Self::Left];

    /// Parse a wire direction. Anything other than `U`, `R`, `D`, `L` is `None`.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "U" => Some(Self::Up),
            "R" => Some(Self::Right),
            "D" => Some(Self::Down),
            "L" => Some(Self::Left),
            _ => None,
        }
    }

    /// Wire representation.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Up => "U",
            Self::Right => "R",
            Self::Down => "D",
            Self::Left => "L",
        }
    }

    /// `(dx, dy)` applied by one step.
    #[inline]
    pub fn delta(self) -> (i32, i32) {
        match self {
            Self::Up => (0, -1),
            Self::Right => (1, 0),
            Self::Down => (0, 1),
            Self::Left => (-1, 0),
        }
    }
}

// =============================================================================
// PURE HELPERS
// =============================================================================

/// Restrict `value` to `[lo, hi]`.
///
/// Total: if `lo > hi` the result is `lo`.
#[inline]
pub fn clamp(value: i32, lo: i32, hi: i32) -> i32 {
    if value < lo {
        lo
    } else if value > hi {
        hi.max(lo)
    } else {
        value
    }
}

/// Uniformly random cell on a `width` x `height` board.
pub fn random_point(rng: &mut GameRng, width: i32, height: i32) -> Cell {
    Cell {
        x: rng.next_int(width.max(1) as u32) as i32,
        y: rng.next_int(height.max(1) as u32) as i32,
    }
}

/// Uniformly random permutation of `0..n`.
pub fn permutation(rng: &mut GameRng, n: usize) -> Vec<usize> {
    let mut values: Vec<usize> = (0..n).collect();
    rng.shuffle(&mut values);
    values
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_clamp() {
        assert_eq!(clamp(-3, 0, 63), 0);
        assert_eq!(clamp(70, 0, 63), 63);
        assert_eq!(clamp(12, 0, 63), 12);
        assert_eq!(clamp(5, 4, 2), 4);
    }

    #[test]
    fn test_cell_round_trip_format() {
        let cell: Cell = "5,4".parse().unwrap();
        assert_eq!(cell, Cell::new(5, 4));
        assert_eq!(cell.to_string(), "5,4");
        assert!("5".parse::<Cell>().is_err());
        assert!("a,b".parse::<Cell>().is_err());
    }

    #[test]
    fn test_cell_json_as_map_key() {
        let mut coins = std::collections::BTreeMap::new();
        coins.insert(Cell::new(3, 7), 5u32);
        let json = serde_json::to_string(&coins).unwrap();
        assert_eq!(json, r#"{"3,7":5}"#);
    }

    #[test]
    fn test_direction_parse() {
        assert_eq!(Direction::parse("U"), Some(Direction::Up));
        assert_eq!(Direction::parse("L"), Some(Direction::Left));
        assert_eq!(Direction::parse("u"), None);
        assert_eq!(Direction::parse("X"), None);
        for dir in Direction::ALL {
            assert_eq!(Direction::parse(dir.as_str()), Some(dir));
        }
    }

    #[test]
    fn test_step_up_from_spawn() {
        let next = Cell::new(5, 5).step(Direction::Up, 64, 64);
        assert_eq!(next, Cell::new(5, 4));
    }

    #[test]
    fn test_step_stops_at_edge() {
        assert_eq!(Cell::new(0, 0).step(Direction::Left, 64, 64), Cell::new(0, 0));
        assert_eq!(Cell::new(0, 0).step(Direction::Up, 64, 64), Cell::new(0, 0));
        assert_eq!(Cell::new(63, 63).step(Direction::Right, 64, 64), Cell::new(63, 63));
        assert_eq!(Cell::new(63, 63).step(Direction::Down, 64, 64), Cell::new(63, 63));
    }

    #[test]
    fn test_from_index_covers_board() {
        assert_eq!(Cell::from_index(0, 64), Cell::new(0, 0));
        assert_eq!(Cell::from_index(65, 64), Cell::new(1, 1));
        assert_eq!(Cell::from_index(64 * 64 - 1, 64), Cell::new(63, 63));
    }

    #[test]
    fn test_permutation_is_complete() {
        let mut rng = GameRng::new(99);
        let mut perm = permutation(&mut rng, 4096);
        perm.sort_unstable();
        assert_eq!(perm, (0..4096).collect::<Vec<_>>());
    }

    proptest! {
        #[test]
        fn prop_random_point_in_bounds(seed in any::<u64>(), w in 1i32..200, h in 1i32..200) {
            let mut rng = GameRng::new(seed);
            for _ in 0..16 {
                let p = random_point(&mut rng, w, h);
                prop_assert!(p.is_on_board(w, h));
            }
        }

        #[test]
        fn prop_walk_stays_on_board(
            start_x in 0i32..64,
            start_y in 0i32..64,
            dirs in proptest::collection::vec(0usize..4, 0..300),
        ) {
            let mut cell = Cell::new(start_x, start_y);
            for d in dirs {
                cell = cell.step(Direction::ALL[d], 64, 64);
                prop_assert!(cell.is_on_board(64, 64));
            }
        }

        #[test]
        fn prop_permutation_has_no_duplicates(seed in any::<u64>(), n in 0usize..512) {
            let mut rng = GameRng::new(seed);
            let mut perm = permutation(&mut rng, n);
            perm.sort_unstable();
            perm.dedup();
            prop_assert_eq!(perm.len(), n);
        }
    }
}
