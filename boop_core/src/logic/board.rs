use crate::logic::geometry::{Coord, BOARD_SIZE, NUM_CELLS};
use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Orange,
    Gray,
}

impl Color {
    pub const ALL: [Self; 2] = [Self::Orange, Self::Gray];

    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Orange => Self::Gray,
            Self::Gray => Self::Orange,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Orange => 0,
            Self::Gray => 1,
        }
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Orange => f.write_str("orange"),
            Self::Gray => f.write_str("gray"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PieceKind {
    Kitten,
    Cat,
}

impl PieceKind {
    pub const ALL: [Self; 2] = [Self::Kitten, Self::Cat];

    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::Kitten => 0,
            Self::Cat => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub color: Color,
    pub kind: PieceKind,
}

impl Piece {
    #[must_use]
    pub const fn new(color: Color, kind: PieceKind) -> Self {
        Self { color, kind }
    }

    #[must_use]
    pub const fn kitten(color: Color) -> Self {
        Self::new(color, PieceKind::Kitten)
    }

    #[must_use]
    pub const fn cat(color: Color) -> Self {
        Self::new(color, PieceKind::Cat)
    }

    #[must_use]
    pub const fn is_cat(self) -> bool {
        matches!(self.kind, PieceKind::Cat)
    }

    const fn to_char(self) -> char {
        match (self.color, self.kind) {
            (Color::Orange, PieceKind::Cat) => 'O',
            (Color::Orange, PieceKind::Kitten) => 'o',
            (Color::Gray, PieceKind::Cat) => 'G',
            (Color::Gray, PieceKind::Kitten) => 'g',
        }
    }

    const fn from_char(ch: char) -> Option<Self> {
        match ch {
            'O' => Some(Self::cat(Color::Orange)),
            'o' => Some(Self::kitten(Color::Orange)),
            'G' => Some(Self::cat(Color::Gray)),
            'g' => Some(Self::kitten(Color::Gray)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotationError {
    #[error("expected 6 rows, found {0}")]
    RowCount(usize),
    #[error("row {row} describes {cells} cells")]
    RowLength { row: usize, cells: usize },
    #[error("unexpected character {ch:?} in row {row}")]
    BadChar { row: usize, ch: char },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Board {
    #[serde(with = "BigArray")]
    cells: [Option<Piece>; NUM_CELLS],
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            cells: [None; NUM_CELLS],
        }
    }

    #[must_use]
    pub fn get(&self, at: Coord) -> Option<Piece> {
        self.cells.get(at.index()).copied().flatten()
    }

    #[must_use]
    pub fn is_empty(&self, at: Coord) -> bool {
        self.get(at).is_none()
    }

    pub fn set(&mut self, at: Coord, piece: Option<Piece>) {
        if let Some(slot) = self.cells.get_mut(at.index()) {
            *slot = piece;
        }
    }

    pub fn place(&mut self, at: Coord, piece: Piece) {
        self.set(at, Some(piece));
    }

    /// Empties the cell and hands back whatever stood there.
    pub fn take(&mut self, at: Coord) -> Option<Piece> {
        self.cells.get_mut(at.index()).and_then(Option::take)
    }

    pub fn clear(&mut self) {
        self.cells = [None; NUM_CELLS];
    }

    /// Occupied cells in row-major order.
    pub fn pieces(&self) -> impl Iterator<Item = (Coord, Piece)> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter_map(|(i, p)| Some((Coord::from_index(i)?, (*p)?)))
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = Coord> + '_ {
        Coord::all().filter(|c| self.is_empty(*c))
    }

    #[must_use]
    pub fn count(&self, color: Color, kind: PieceKind) -> u8 {
        let n = self
            .cells
            .iter()
            .flatten()
            .filter(|p| p.color == color && p.kind == kind)
            .count();
        #[allow(clippy::cast_possible_truncation)]
        {
            n as u8
        }
    }

    #[must_use]
    pub fn count_color(&self, color: Color) -> u8 {
        self.count(color, PieceKind::Kitten) + self.count(color, PieceKind::Cat)
    }

    /// Row-by-row encoding: `O`/`o` orange cat/kitten, `G`/`g` gray cat/kitten,
    /// digits for runs of empty cells, `/` between rows.
    #[must_use]
    pub fn to_notation(&self) -> String {
        let mut out = String::with_capacity(NUM_CELLS + BOARD_SIZE);
        for row in 0..BOARD_SIZE {
            let mut empty_run = 0;
            for col in 0..BOARD_SIZE {
                match Coord::new(row, col).and_then(|c| self.get(c)) {
                    Some(piece) => {
                        if empty_run > 0 {
                            out.push_str(&empty_run.to_string());
                            empty_run = 0;
                        }
                        out.push(piece.to_char());
                    }
                    None => empty_run += 1,
                }
            }
            if empty_run > 0 {
                out.push_str(&empty_run.to_string());
            }
            if row + 1 < BOARD_SIZE {
                out.push('/');
            }
        }
        out
    }

    pub fn from_notation(notation: &str) -> Result<Self, NotationError> {
        let rows: Vec<&str> = notation.trim().split('/').collect();
        if rows.len() != BOARD_SIZE {
            return Err(NotationError::RowCount(rows.len()));
        }
        let mut board = Self::new();
        for (row, text) in rows.iter().enumerate() {
            let mut col = 0;
            for ch in text.chars() {
                if let Some(run) = ch.to_digit(10) {
                    col += run as usize;
                } else {
                    let piece = Piece::from_char(ch).ok_or(NotationError::BadChar { row, ch })?;
                    let at = Coord::new(row, col)
                        .ok_or(NotationError::RowLength { row, cells: col + 1 })?;
                    board.place(at, piece);
                    col += 1;
                }
            }
            if col != BOARD_SIZE {
                return Err(NotationError::RowLength { row, cells: col });
            }
        }
        Ok(board)
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "   ")?;
        for col in 0..BOARD_SIZE {
            write!(f, " {col}")?;
        }
        writeln!(f)?;
        for row in 0..BOARD_SIZE {
            write!(f, " {row} ")?;
            for col in 0..BOARD_SIZE {
                let ch = Coord::new(row, col)
                    .and_then(|c| self.get(c))
                    .map_or('.', Piece::to_char);
                write!(f, " {ch}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
