//! Priority tiers the bot walks before falling back to plain search.
//!
//! Each tier is a predicate over candidate moves plus a tie-break. The first
//! tier with at least one qualifying move decides.

use crate::engine::config::{BotConfig, TieBreak};
use crate::engine::move_list::{Candidate, MoveList};
use crate::logic::geometry::Coord;
use crate::logic::simulator::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Win,
    BlockWin,
    Graduate,
    BlockGraduate,
    General,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierStep {
    pub tier: Tier,
    pub tie_break: TieBreak,
}

/// Enabled tiers in priority order. `General` is always last and searched.
#[must_use]
pub fn cascade(config: &BotConfig) -> Vec<TierStep> {
    let steps = [
        (config.tier_win, Tier::Win, config.tie_break_win),
        (config.tier_block_win, Tier::BlockWin, config.tie_break_block_win),
        (config.tier_graduate, Tier::Graduate, config.tie_break_graduate),
        (
            config.tier_block_graduate,
            Tier::BlockGraduate,
            config.tie_break_block_graduate,
        ),
        (true, Tier::General, TieBreak::Search),
    ];
    steps
        .into_iter()
        .filter(|(enabled, _, _)| *enabled)
        .map(|(_, tier, tie_break)| TierStep { tier, tie_break })
        .collect()
}

/// Cells where the opponent, were it their turn, would win or graduate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Threats {
    pub win_cells: Vec<Coord>,
    pub graduation_cells: Vec<Coord>,
}

impl Threats {
    #[must_use]
    pub fn of_opponent(position: &Position) -> Self {
        let mut theirs = *position;
        theirs.to_move = position.to_move.opposite();

        let mut threats = Self::default();
        for (mv, outcome) in theirs.successors() {
            let Some(at) = mv.at() else {
                continue;
            };
            if outcome.wins && !threats.win_cells.contains(&at) {
                threats.win_cells.push(at);
            }
            if outcome.creates_graduation && !threats.graduation_cells.contains(&at) {
                threats.graduation_cells.push(at);
            }
        }
        threats
    }
}

/// Qualifying candidates of `tier`. Threats are only computed when a blocking
/// tier needs them.
pub fn qualifying(
    tier: Tier,
    position: &Position,
    moves: &MoveList,
    threats: &mut Option<Threats>,
) -> Vec<Candidate> {
    let lands_on = |c: &Candidate, cells: &[Coord]| c.mv.at().is_some_and(|at| cells.contains(&at));
    match tier {
        Tier::Win => moves.iter().filter(|c| c.wins).copied().collect(),
        Tier::Graduate => moves.iter().filter(|c| c.creates_graduation).copied().collect(),
        Tier::BlockWin => {
            let t = threats.get_or_insert_with(|| Threats::of_opponent(position));
            moves
                .iter()
                .filter(|c| lands_on(c, &t.win_cells))
                .copied()
                .collect()
        }
        Tier::BlockGraduate => {
            let t = threats.get_or_insert_with(|| Threats::of_opponent(position));
            moves
                .iter()
                .filter(|c| lands_on(c, &t.graduation_cells))
                .copied()
                .collect()
        }
        Tier::General => moves.iter().copied().collect(),
    }
}
