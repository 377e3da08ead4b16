use crate::engine::config::BotConfig;
use crate::engine::Evaluator;
use crate::logic::board::{Board, Color, PieceKind};
use crate::logic::geometry::{Coord, Ring, LINE_DIRECTIONS, NUM_CELLS};
use crate::logic::rules;
use crate::logic::simulator::Position;
use std::sync::Arc;

pub struct SimpleEvaluator {
    config: Arc<BotConfig>,
}

/// Every three-cell straight window on the board.
fn windows() -> impl Iterator<Item = [Coord; 3]> {
    Coord::all().flat_map(|start| {
        LINE_DIRECTIONS.into_iter().filter_map(move |dir| {
            Some([start, start.offset(dir, 1)?, start.offset(dir, 2)?])
        })
    })
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Formations {
    cat_pairs: i32,
    kitten_pairs: i32,
    two_way_threats: i32,
}

impl SimpleEvaluator {
    pub const fn new(config: Arc<BotConfig>) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn ring_weight(&self, ring: Ring) -> i32 {
        match ring {
            Ring::Center => self.config.weight_center,
            Ring::Inner => self.config.weight_inner,
            Ring::Edge => self.config.weight_edge,
            Ring::Corner => self.config.weight_corner,
        }
    }

    fn positional(&self, board: &Board, color: Color) -> i32 {
        board
            .pieces()
            .filter(|(_, p)| p.color == color)
            .map(|(at, p)| {
                let w = self.ring_weight(at.ring());
                if p.is_cat() {
                    w * self.config.cat_multiplier
                } else {
                    w
                }
            })
            .sum()
    }

    /// Open pairs: two own pieces and one empty cell in a window. A pair of
    /// cats threatens a win, any other pair threatens a graduation.
    ///
    /// A piece sitting in pairs with two different completion cells is a
    /// two-way threat; those are capped at two per color.
    fn formations(board: &Board, color: Color) -> Formations {
        let mut out = Formations::default();
        let mut completions: [Option<Coord>; NUM_CELLS] = [None; NUM_CELLS];
        let mut forked = [false; NUM_CELLS];

        for window in windows() {
            let mut owned = Vec::with_capacity(2);
            let mut empty = None;
            let mut blocked = false;
            for cell in window {
                match board.get(cell) {
                    Some(p) if p.color == color => owned.push((cell, p.kind)),
                    Some(_) => blocked = true,
                    None => empty = Some(cell),
                }
            }
            let (false, Some(completion), 2) = (blocked, empty, owned.len()) else {
                continue;
            };
            if owned.iter().all(|(_, kind)| *kind == PieceKind::Cat) {
                out.cat_pairs += 1;
            } else {
                out.kitten_pairs += 1;
            }
            for (cell, _) in owned {
                let idx = cell.index();
                match completions.get(idx).copied().flatten() {
                    None => {
                        if let Some(slot) = completions.get_mut(idx) {
                            *slot = Some(completion);
                        }
                    }
                    Some(seen) if seen != completion => {
                        if let Some(flag) = forked.get_mut(idx) {
                            *flag = true;
                        }
                    }
                    Some(_) => {}
                }
            }
        }

        let forks = forked.iter().filter(|&&f| f).count();
        out.two_way_threats = i32::try_from(forks.min(2)).unwrap_or(2);
        out
    }

    fn cat_supply(&self, position: &Position, color: Color) -> i32 {
        let owned = position.pool(color).total_cats();
        (1..=owned).map(|n| self.config.cat_value(n)).sum()
    }

    fn side_score(&self, position: &Position, color: Color) -> i32 {
        let f = Self::formations(&position.board, color);
        self.positional(&position.board, color)
            + f.cat_pairs * self.config.cat_pair
            + f.kitten_pairs * self.config.kitten_pair
            + f.two_way_threats * self.config.two_way_threat
            + self.cat_supply(position, color)
    }
}

impl Evaluator for SimpleEvaluator {
    fn evaluate(&self, position: &Position, perspective: Color) -> i32 {
        let opponent = perspective.opposite();
        if rules::win_reason(&position.board, perspective).is_some() {
            return self.config.win_score;
        }
        if rules::win_reason(&position.board, opponent).is_some() {
            return -self.config.win_score;
        }
        self.side_score(position, perspective) - self.side_score(position, opponent)
    }
}
