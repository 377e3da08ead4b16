use crate::logic::board::{Color, PieceKind};
use crate::logic::geometry::Coord;
use crate::logic::simulator::Position;
use serde::{Deserialize, Serialize};

pub mod bot;
pub mod config;
pub mod eval;
pub mod move_list;
pub mod search;
pub mod tiers;
pub mod tt;
pub mod zobrist;

#[cfg(test)]
mod bench_test;

/// A candidate placement. `graduation` picks among several graduation options
/// the placement would open; it is `None` for placements that open at most one.
#[derive(Debug, Clone, Copy, Eq, Serialize, Deserialize)]
pub struct Move {
    pub row: u8,
    pub col: u8,
    pub kind: PieceKind,
    pub graduation: Option<u8>,
    #[serde(default)]
    pub score: i32,
}

// Ordering scores ride along with the move; they never make two moves different.
impl PartialEq for Move {
    fn eq(&self, other: &Self) -> bool {
        self.row == other.row
            && self.col == other.col
            && self.kind == other.kind
            && self.graduation == other.graduation
    }
}

impl Move {
    #[must_use]
    pub const fn new(at: Coord, kind: PieceKind) -> Self {
        Self {
            row: at.row,
            col: at.col,
            kind,
            graduation: None,
            score: 0,
        }
    }

    #[must_use]
    pub const fn with_graduation(mut self, choice: u8) -> Self {
        self.graduation = Some(choice);
        self
    }

    #[must_use]
    pub fn at(&self) -> Option<Coord> {
        Coord::new(usize::from(self.row), usize::from(self.col))
    }

    /// Same cell and kind, whatever graduation choice either carries.
    #[must_use]
    pub fn same_placement(&self, other: &Self) -> bool {
        self.row == other.row && self.col == other.col && self.kind == other.kind
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let kind = match self.kind {
            PieceKind::Kitten => "kitten",
            PieceKind::Cat => "cat",
        };
        write!(f, "{kind}@({},{})", self.row, self.col)?;
        if let Some(choice) = self.graduation {
            write!(f, " graduating #{choice}")?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStats {
    pub depth: u8,
    pub nodes: u32,
    pub tt_hits: u32,
    pub cutoffs: u32,
    pub time_ms: u64,
    pub score: i32,
}

pub trait Evaluator {
    /// Static score of `position` from `perspective`'s point of view.
    fn evaluate(&self, position: &Position, perspective: Color) -> i32;
}

pub trait Searcher {
    /// Searches `position` to `depth` plies. A non-empty `root_moves`
    /// restricts the root to those moves.
    fn search(
        &mut self,
        position: &Position,
        depth: u8,
        root_moves: &[Move],
    ) -> Option<(Move, SearchStats)>;
}

/// Anything that can pick a move for the side to move.
pub trait Bot: std::fmt::Debug {
    fn select_move(&mut self, position: &Position) -> Option<Move>;
}
