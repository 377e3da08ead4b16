//! Runs bots against each other on the simulator and reports the results.
//!
//! Games never touch [`GameState`](crate::logic::game::GameState); both sides
//! play straight through [`simulate`], so a match is as fast as the bots are.
use crate::engine::bot::BoopBot;
use crate::engine::config::BotConfig;
use crate::engine::search::AlphaBetaEngine;
use crate::engine::{Bot, Move};
use crate::logic::board::Color;
use crate::logic::rules::WinReason;
use crate::logic::simulator::{simulate, Position};
use log::{debug, info, warn};
use rayon::iter::{IntoParallelIterator, ParallelIterator};
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug, Formatter};
use std::ops::{Add, AddAssign};
use std::sync::Mutex;

/// Per-game seeds derive from this when a config carries no seed of its own.
const DEFAULT_SEED: u64 = 0x5eed_0f_b00b;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wdl {
    pub win: u32,
    pub draw: u32,
    pub loss: u32,
}

impl Wdl {
    #[must_use]
    pub const fn total(&self) -> u32 {
        self.win + self.draw + self.loss
    }

    /// Points with a draw worth half a win.
    #[must_use]
    pub fn points(&self) -> f32 {
        #[allow(clippy::cast_precision_loss)]
        let points = self.win as f32 + self.draw as f32 / 2.0;
        points
    }

    #[must_use]
    pub const fn flip(self) -> Self {
        Self {
            win: self.loss,
            draw: self.draw,
            loss: self.win,
        }
    }
}

impl Add for Wdl {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            win: self.win + rhs.win,
            draw: self.draw + rhs.draw,
            loss: self.loss + rhs.loss,
        }
    }
}

impl AddAssign for Wdl {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl std::iter::Sum for Wdl {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

// Keeps a clean sweep finite, about 1200 Elo.
const ELO_SCORE_EPSILON: f32 = 1e-3;

/// Elo difference implied by a score, draws counting half.
#[must_use]
pub fn elo_from_wdl(wdl: Wdl) -> f32 {
    let total = wdl.total();
    if total == 0 {
        return 0.0;
    }
    #[allow(clippy::cast_precision_loss)]
    let score = (wdl.points() / total as f32).clamp(ELO_SCORE_EPSILON, 1.0 - ELO_SCORE_EPSILON);
    let elo = -400.0 * (1.0 / score - 1.0).log10();
    // Turn -0.0 into 0.0
    elo + 0.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOutcome {
    Won { winner: Color, reason: WinReason },
    /// Ply limit reached or the side to move had nothing to place.
    Draw,
    /// A bot returned a move the rules reject; the other side is credited.
    Forfeit { loser: Color },
}

impl GameOutcome {
    #[must_use]
    pub fn wdl_for(&self, color: Color) -> Wdl {
        let won = |c: Color| {
            if c == color {
                Wdl {
                    win: 1,
                    ..Wdl::default()
                }
            } else {
                Wdl {
                    loss: 1,
                    ..Wdl::default()
                }
            }
        };
        match *self {
            Self::Won { winner, .. } => won(winner),
            Self::Forfeit { loser } => won(loser.opposite()),
            Self::Draw => Wdl {
                draw: 1,
                ..Wdl::default()
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Replay {
    pub start: Position,
    /// Color the first bot played in this game.
    pub player_a: Color,
    pub moves: Vec<Move>,
    pub outcome: GameOutcome,

    // milliseconds
    pub total_time_a: f64,
    pub total_time_b: f64,
    pub move_count_a: u32,
    pub move_count_b: u32,

    pub debug_a: String,
    pub debug_b: String,
}

impl Replay {
    #[must_use]
    pub fn wdl_a(&self) -> Wdl {
        self.outcome.wdl_for(self.player_a)
    }
}

/// Summary of a head-to-head match, from the first bot's point of view.
pub struct MatchResult {
    pub game_count: u32,
    pub replays: Vec<Replay>,

    pub average_game_length: f32,
    pub wdl_a: Wdl,

    // time per move in milliseconds
    pub time_a: f64,
    pub time_b: f64,

    pub debug_a: String,
    pub debug_b: String,
}

impl MatchResult {
    #[must_use]
    pub fn elo_a(&self) -> f32 {
        elo_from_wdl(self.wdl_a)
    }
}

impl Debug for MatchResult {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(f, "MatchResult {{")?;
        writeln!(
            f,
            "  {} games, average length {:.1}",
            self.game_count, self.average_game_length
        )?;
        writeln!(
            f,
            "  a: {} wins, {} draws, {} losses",
            self.wdl_a.win, self.wdl_a.draw, self.wdl_a.loss
        )?;
        writeln!(f, "  a elo: {:.1}", self.elo_a())?;
        writeln!(f, "  time_a: {:.3}ms, time_b: {:.3}ms", self.time_a, self.time_b)?;
        writeln!(f, "  a: {}", self.debug_a)?;
        writeln!(f, "  b: {}", self.debug_b)?;
        writeln!(f, "}}")?;
        Ok(())
    }
}

/// Plays `games` games between two tiered bots built from the configs. Sides
/// alternate, Orange first for `config_a` in even games. Each game reseeds
/// both bots so a match with seeded configs replays exactly.
#[must_use]
pub fn run_match(
    config_a: &BotConfig,
    config_b: &BotConfig,
    games: u32,
    max_plies: u32,
    parallel: bool,
) -> MatchResult {
    run(
        |game_i| BoopBot::new(seeded(config_a, game_i, 0)),
        |game_i| BoopBot::new(seeded(config_b, game_i, 1)),
        games,
        max_plies,
        parallel,
    )
}

fn seeded(config: &BotConfig, game_i: u32, side: u64) -> BotConfig {
    let base = config.seed.unwrap_or(DEFAULT_SEED);
    BotConfig {
        seed: Some(
            base.wrapping_add(u64::from(game_i))
                .wrapping_mul(0x9e37_79b9_7f4a_7c15)
                ^ side,
        ),
        ..config.clone()
    }
}

/// Runs any two bots against each other. The factories get the game index.
pub fn run<A: Bot, B: Bot>(
    bot_a: impl Fn(u32) -> A + Sync,
    bot_b: impl Fn(u32) -> B + Sync,
    games: u32,
    max_plies: u32,
    parallel: bool,
) -> MatchResult {
    // Builds both once up front so a bad config shows before any thread starts.
    let debug_a = format!("{:?}", bot_a(0));
    let debug_b = format!("{:?}", bot_b(0));

    let partial = Mutex::new(Wdl::default());
    let play = |game_i: u32| {
        let flip = game_i % 2 == 1;
        let replay = play_single_game(flip, &mut bot_a(game_i), &mut bot_b(game_i), max_plies);
        if let Ok(mut wdl) = partial.lock() {
            *wdl += replay.wdl_a();
            debug!(
                "game {game_i}: {:?} after {} plies, running {}/{}/{}",
                replay.outcome,
                replay.moves.len(),
                wdl.win,
                wdl.draw,
                wdl.loss
            );
        }
        replay
    };

    let replays: Vec<Replay> = if parallel {
        (0..games).into_par_iter().panic_fuse().map(play).collect()
    } else {
        (0..games).map(play).collect()
    };

    let total_time_a: f64 = replays.iter().map(|r| r.total_time_a).sum();
    let total_time_b: f64 = replays.iter().map(|r| r.total_time_b).sum();
    let move_count_a: u32 = replays.iter().map(|r| r.move_count_a).sum();
    let move_count_b: u32 = replays.iter().map(|r| r.move_count_b).sum();
    let total_plies: usize = replays.iter().map(|r| r.moves.len()).sum();

    #[allow(clippy::cast_precision_loss)]
    let average_game_length = if games == 0 {
        0.0
    } else {
        total_plies as f32 / games as f32
    };
    let per_move = |total: f64, count: u32| {
        if count == 0 {
            0.0
        } else {
            total / f64::from(count)
        }
    };

    let result = MatchResult {
        game_count: games,
        average_game_length,
        wdl_a: replays.iter().map(Replay::wdl_a).sum(),
        time_a: per_move(total_time_a, move_count_a),
        time_b: per_move(total_time_b, move_count_b),
        debug_a,
        debug_b,
        replays,
    };
    info!(
        "match over: {}/{}/{} for {}",
        result.wdl_a.win, result.wdl_a.draw, result.wdl_a.loss, result.debug_a
    );
    result
}

/// One game from the opening. With `flip` the second bot plays Orange.
pub fn play_single_game(
    flip: bool,
    bot_a: &mut impl Bot,
    bot_b: &mut impl Bot,
    max_plies: u32,
) -> Replay {
    let start = Position::new();
    let player_a = if flip { Color::Gray } else { Color::Orange };

    let mut position = start;
    let mut total_time_a = 0.0;
    let mut total_time_b = 0.0;
    let mut move_count_a: u32 = 0;
    let mut move_count_b: u32 = 0;
    let mut moves = vec![];

    let outcome = loop {
        if moves.len() >= max_plies as usize {
            break GameOutcome::Draw;
        }
        let mover = position.to_move;
        let start_time = AlphaBetaEngine::now();
        let mv = if mover == player_a {
            let mv = bot_a.select_move(&position);
            total_time_a += AlphaBetaEngine::now() - start_time;
            move_count_a += 1;
            mv
        } else {
            let mv = bot_b.select_move(&position);
            total_time_b += AlphaBetaEngine::now() - start_time;
            move_count_b += 1;
            mv
        };

        let Some(mv) = mv else {
            break GameOutcome::Draw;
        };
        let result = match simulate(&position, mv) {
            Ok(result) if result.pending_options.is_empty() => result,
            other => {
                warn!("{mover} played {mv} which the rules reject: {other:?}");
                break GameOutcome::Forfeit { loser: mover };
            }
        };
        moves.push(mv);
        if let Some(reason) = result.win_reason {
            break GameOutcome::Won {
                winner: mover,
                reason,
            };
        }
        position = result.position;
    };

    Replay {
        start,
        player_a,
        moves,
        outcome,
        total_time_a,
        total_time_b,
        move_count_a,
        move_count_b,
        debug_a: format!("{bot_a:?}"),
        debug_b: format!("{bot_b:?}"),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standing {
    pub name: String,
    pub wdl: Wdl,
    pub points: f32,
    pub elo: f32,
}

/// Every entry plays every other entry `games_per_pair` times. Standings come
/// back best first.
#[must_use]
pub fn round_robin(
    entries: &[(String, BotConfig)],
    games_per_pair: u32,
    max_plies: u32,
    parallel: bool,
) -> Vec<Standing> {
    let mut totals = vec![Wdl::default(); entries.len()];
    for (i, (name_a, config_a)) in entries.iter().enumerate() {
        for (j, (name_b, config_b)) in entries.iter().enumerate().skip(i + 1) {
            let result = run_match(config_a, config_b, games_per_pair, max_plies, parallel);
            info!(
                "{name_a} vs {name_b}: {}/{}/{}",
                result.wdl_a.win, result.wdl_a.draw, result.wdl_a.loss
            );
            if let Some(total) = totals.get_mut(i) {
                *total += result.wdl_a;
            }
            if let Some(total) = totals.get_mut(j) {
                *total += result.wdl_a.flip();
            }
        }
    }

    let mut standings: Vec<Standing> = entries
        .iter()
        .zip(totals)
        .map(|((name, _), wdl)| Standing {
            name: name.clone(),
            points: wdl.points(),
            elo: elo_from_wdl(wdl),
            wdl,
        })
        .collect();
    standings.sort_by(|a, b| b.points.total_cmp(&a.points));
    standings
}
