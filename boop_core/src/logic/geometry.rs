use serde::{Deserialize, Serialize};

pub const BOARD_SIZE: usize = 6;
pub const NUM_CELLS: usize = BOARD_SIZE * BOARD_SIZE;

/// The eight neighbour offsets, clockwise from north-west.
pub const DIRECTIONS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
    (1, 0),
    (1, -1),
    (0, -1),
];

/// One offset per line axis: east, south, south-east, south-west.
pub const LINE_DIRECTIONS: [(i8, i8); 4] = [(0, 1), (1, 0), (1, 1), (1, -1)];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Coord {
    pub row: u8,
    pub col: u8,
}

/// Positional band of a cell, from the middle of the board outwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ring {
    Center,
    Inner,
    Edge,
    Corner,
}

impl Coord {
    #[must_use]
    pub fn new(row: usize, col: usize) -> Option<Self> {
        if row < BOARD_SIZE && col < BOARD_SIZE {
            #[allow(clippy::cast_possible_truncation)]
            Some(Self {
                row: row as u8,
                col: col as u8,
            })
        } else {
            None
        }
    }

    #[must_use]
    pub fn from_signed(row: i32, col: i32) -> Option<Self> {
        let row = usize::try_from(row).ok()?;
        let col = usize::try_from(col).ok()?;
        Self::new(row, col)
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::new(index / BOARD_SIZE, index % BOARD_SIZE)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.row as usize * BOARD_SIZE + self.col as usize
    }

    /// Step `steps` times along `dir`; `None` once the walk leaves the board.
    #[must_use]
    pub fn offset(self, dir: (i8, i8), steps: i32) -> Option<Self> {
        Self::from_signed(
            i32::from(self.row) + i32::from(dir.0) * steps,
            i32::from(self.col) + i32::from(dir.1) * steps,
        )
    }

    /// All cells in row-major order.
    pub fn all() -> impl Iterator<Item = Self> {
        (0..NUM_CELLS).filter_map(Self::from_index)
    }

    #[must_use]
    pub fn ring(self) -> Ring {
        let last = (BOARD_SIZE - 1) as u8;
        let on_edge_row = self.row == 0 || self.row == last;
        let on_edge_col = self.col == 0 || self.col == last;
        if on_edge_row && on_edge_col {
            Ring::Corner
        } else if on_edge_row || on_edge_col {
            Ring::Edge
        } else if (2..=3).contains(&self.row) && (2..=3).contains(&self.col) {
            Ring::Center
        } else {
            Ring::Inner
        }
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({},{})", self.row, self.col)
    }
}

/// Validity check for raw caller input, which may be negative or too large.
#[must_use]
pub fn in_bounds(row: i32, col: i32) -> bool {
    Coord::from_signed(row, col).is_some()
}
