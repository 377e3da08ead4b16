//! Side-effect-free what-if placements for look-ahead.
//!
//! Shares every rule with the authoritative engine through
//! [`play_placement`], but works on a detached [`Position`] value.

use crate::engine::zobrist::ZobristKeys;
use crate::engine::Move;
use crate::logic::board::{Board, Color, NotationError, PieceKind};
use crate::logic::geometry::Coord;
use crate::logic::player::{Pool, PIECES_PER_KIND};
use crate::logic::rules::{
    self, play_placement, BoopEffect, GraduationEffect, GraduationOption, GraduationStep,
    RuleError, WinReason,
};
use serde::{Deserialize, Serialize};

/// Everything the rules need to continue a game: board, both pools and the
/// side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub board: Board,
    pub pools: [Pool; 2],
    pub to_move: Color,
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl Position {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            board: Board::new(),
            pools: [Pool::new(), Pool::new()],
            to_move: Color::Orange,
        }
    }

    /// Pools are derived from the board: every cat on it counts as a retired
    /// kitten, the remaining kittens are in the pool and no cat is. Handy for
    /// fixtures.
    pub fn from_notation(notation: &str, to_move: Color) -> Result<Self, NotationError> {
        let board = Board::from_notation(notation)?;
        let pool_for = |color: Color| {
            let on_board = board.count(color, PieceKind::Kitten);
            let cats = board.count(color, PieceKind::Cat);
            Pool {
                kittens: PIECES_PER_KIND
                    .saturating_sub(on_board)
                    .saturating_sub(cats),
                cats: 0,
                retired: cats,
            }
        };
        Ok(Self {
            board,
            pools: [pool_for(Color::Orange), pool_for(Color::Gray)],
            to_move,
        })
    }

    #[must_use]
    pub fn pool(&self, color: Color) -> &Pool {
        rules::pool_of(&self.pools, color)
    }

    #[must_use]
    pub fn acting_pool(&self) -> &Pool {
        self.pool(self.to_move)
    }

    /// Board, side to move and the four pool counts as one string.
    #[must_use]
    pub fn canonical_key(&self) -> String {
        let side = match self.to_move {
            Color::Orange => 'o',
            Color::Gray => 'g',
        };
        let [orange, gray] = self.pools;
        format!(
            "{} {side} {}.{} {}.{}",
            self.board.to_notation(),
            orange.kittens,
            orange.cats,
            gray.kittens,
            gray.cats
        )
    }

    /// Hash over the same components as [`Position::canonical_key`].
    #[must_use]
    pub fn zobrist_key(&self) -> u64 {
        ZobristKeys::get().hash(self)
    }

    /// Placements available to the side to move, without graduation choices.
    /// Row-major, kitten before cat.
    pub fn placements(&self) -> impl Iterator<Item = Move> + '_ {
        let pool = *self.acting_pool();
        self.board.empty_cells().flat_map(move |at| {
            PieceKind::ALL
                .into_iter()
                .filter(move |&kind| pool.has(kind))
                .map(move |kind| Move::new(at, kind))
        })
    }

    /// Every fully resolved move with its outcome. Placements opening several
    /// graduation options appear once per option.
    #[must_use]
    pub fn successors(&self) -> Vec<(Move, SimOutcome)> {
        let mut out = Vec::new();
        for mv in self.placements() {
            let Ok(outcome) = simulate(self, mv) else {
                continue;
            };
            if outcome.pending_options.is_empty() {
                out.push((mv, outcome));
                continue;
            }
            for choice in 0..outcome.pending_options.len() {
                let Ok(choice) = u8::try_from(choice) else {
                    break;
                };
                let chosen = mv.with_graduation(choice);
                if let Ok(resolved) = simulate(self, chosen) {
                    out.push((chosen, resolved));
                }
            }
        }
        out
    }

    #[must_use]
    pub fn legal_moves(&self) -> Vec<Move> {
        self.successors().into_iter().map(|(mv, _)| mv).collect()
    }
}

/// Result of one simulated placement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimOutcome {
    /// Position after the move. Side to move passes unless the mover won or a
    /// graduation choice is still open.
    pub position: Position,
    pub boops: Vec<BoopEffect>,
    pub graduations: Vec<GraduationEffect>,
    pub cats_earned: u8,
    /// Non-empty when the move opened several options and carried no choice.
    pub pending_options: Vec<GraduationOption>,
    pub wins: bool,
    pub win_reason: Option<WinReason>,
    /// A line graduation happened or is waiting to be chosen. The forced
    /// single-kitten graduation does not count.
    pub creates_graduation: bool,
}

impl SimOutcome {
    /// Opponent pieces pushed off the board by this move.
    #[must_use]
    pub fn knocked_off(&self, mover: Color) -> usize {
        self.boops
            .iter()
            .filter(|b| b.to.is_none() && b.piece.color != mover)
            .count()
    }
}

/// Applies `mv` for the side to move of a copy of `position`.
pub fn simulate(position: &Position, mv: Move) -> Result<SimOutcome, RuleError> {
    let at: Coord = mv.at().ok_or(RuleError::InvalidPosition)?;
    let mover = position.to_move;
    let mut next = *position;

    let placement = play_placement(
        &mut next.board,
        &mut next.pools,
        mover,
        at,
        mv.kind,
        mv.graduation.map(usize::from),
    )?;

    let (graduations, pending_options, creates_graduation) = match placement.graduation {
        GraduationStep::None => (Vec::new(), Vec::new(), false),
        GraduationStep::Applied { effects, forced } => (effects, Vec::new(), !forced),
        GraduationStep::Pending(options) => (Vec::new(), options, true),
    };

    let win_reason = if pending_options.is_empty() {
        rules::win_reason(&next.board, mover)
    } else {
        None
    };
    if pending_options.is_empty() && win_reason.is_none() {
        next.to_move = mover.opposite();
    }

    Ok(SimOutcome {
        position: next,
        boops: placement.boops,
        cats_earned: rules::cats_earned(&graduations),
        graduations,
        pending_options,
        wins: win_reason.is_some(),
        win_reason,
        creates_graduation,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(row: usize, col: usize) -> Coord {
        Coord::new(row, col).unwrap()
    }

    #[test]
    fn test_simulate_leaves_input_untouched() {
        let position = Position::new();
        let before = position;
        let outcome = simulate(&position, Move::new(at(2, 2), PieceKind::Kitten)).unwrap();
        assert_eq!(position, before);
        assert_eq!(outcome.position.to_move, Color::Gray);
        assert_eq!(outcome.position.pool(Color::Orange).kittens, 7);
        assert!(!outcome.wins);
    }

    #[test]
    fn test_simulate_rejects_bad_moves() {
        let position = Position::from_notation("o5/6/6/6/6/6", Color::Gray).unwrap();
        let mut off = Move::new(at(0, 0), PieceKind::Kitten);
        off.row = 6;
        assert_eq!(simulate(&position, off), Err(RuleError::InvalidPosition));
        assert_eq!(
            simulate(&position, Move::new(at(0, 0), PieceKind::Kitten)),
            Err(RuleError::CellOccupied)
        );
        assert_eq!(
            simulate(&position, Move::new(at(1, 1), PieceKind::Cat)),
            Err(RuleError::NoPiecesAvailable)
        );
    }

    #[test]
    fn test_winning_move_keeps_side_to_move() {
        let mut position = Position::from_notation("6/6/OO4/6/6/6", Color::Orange).unwrap();
        position.pools[0] = Pool {
            kittens: 5,
            cats: 1,
            retired: 3,
        };
        let outcome = simulate(&position, Move::new(at(2, 4), PieceKind::Cat)).unwrap();
        assert!(!outcome.wins);
        assert_eq!(outcome.position.to_move, Color::Gray);

        // (2,1) cannot be pushed into (2,0), so the row completes.
        let outcome = simulate(&position, Move::new(at(2, 2), PieceKind::Cat)).unwrap();
        assert!(outcome.wins);
        assert_eq!(outcome.win_reason, Some(WinReason::ThreeCatsInRow));
        assert_eq!(outcome.position.to_move, Color::Orange);
        assert!(!outcome.creates_graduation);
    }

    #[test]
    fn test_pending_options_expand_into_successors() {
        let position = Position::from_notation("6/6/ooo3/6/6/6", Color::Orange).unwrap();
        let plain = Move::new(at(2, 3), PieceKind::Kitten);
        let outcome = simulate(&position, plain).unwrap();
        assert_eq!(outcome.pending_options.len(), 2);
        assert!(outcome.graduations.is_empty());
        assert!(outcome.creates_graduation);
        assert_eq!(outcome.position.to_move, Color::Orange);

        let successors = position.successors();
        let at_23: Vec<&Move> = successors
            .iter()
            .map(|(mv, _)| mv)
            .filter(|mv| mv.same_placement(&plain))
            .collect();
        assert_eq!(at_23.len(), 2);
        assert_eq!(at_23[0].graduation, Some(0));
        assert_eq!(at_23[1].graduation, Some(1));
        assert!(successors
            .iter()
            .all(|(_, outcome)| outcome.pending_options.is_empty()));
    }

    #[test]
    fn test_canonical_key_covers_pools_and_side() {
        let a = Position::new();
        let mut b = a;
        b.to_move = Color::Gray;
        let mut c = a;
        c.pools[1].kittens = 7;
        assert_ne!(a.canonical_key(), b.canonical_key());
        assert_ne!(a.canonical_key(), c.canonical_key());
        assert_eq!(a.canonical_key(), "6/6/6/6/6/6 o 8.0 8.0");
        assert_ne!(a.zobrist_key(), b.zobrist_key());
        assert_ne!(a.zobrist_key(), c.zobrist_key());
    }

    #[test]
    fn test_placements_respect_pool() {
        let position = Position::new();
        assert_eq!(position.placements().count(), 36);
        let mut with_cat = position;
        with_cat.pools[0].cats = 1;
        assert_eq!(with_cat.placements().count(), 72);
        let mut empty = position;
        empty.pools[0].kittens = 0;
        assert_eq!(empty.placements().count(), 0);
        assert!(empty.legal_moves().is_empty());
    }
}
