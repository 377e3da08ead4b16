use crate::engine::config::{BotConfig, Difficulty, TieBreak};
use crate::engine::move_list::{Candidate, MoveList};
use crate::engine::search::AlphaBetaEngine;
use crate::engine::tiers::{self, TierStep};
use crate::engine::{Bot, Evaluator, Move, SearchStats, Searcher};
use crate::logic::game::{GamePhase, GameSnapshot};
use crate::logic::rules;
use crate::logic::simulator::Position;
use log::trace;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::fmt;
use std::sync::Arc;

/// The tiered bot: walks the cascade, then searches.
///
/// Owns its search tables. Separate bots share nothing and may run on
/// separate threads.
pub struct BoopBot {
    config: Arc<BotConfig>,
    engine: AlphaBetaEngine,
    rng: StdRng,
}

// Tie-breaks and root shuffling draw from separate streams of the same seed.
const TIE_BREAK_STREAM: u64 = 0x7e1e_b8ea_c0ff_ee00;

fn tie_break_rng(config: &BotConfig) -> StdRng {
    config.seed.map_or_else(StdRng::from_entropy, |seed| {
        StdRng::seed_from_u64(seed ^ TIE_BREAK_STREAM)
    })
}

impl BoopBot {
    pub fn new(config: BotConfig) -> Self {
        let rng = tie_break_rng(&config);
        let config = Arc::new(config);
        Self {
            engine: AlphaBetaEngine::new(config.clone()),
            config,
            rng,
        }
    }

    pub fn from_difficulty(difficulty: Difficulty) -> Self {
        Self::new(difficulty.config())
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    /// Swaps the config in place. Search tables survive unless the table size
    /// changes; a new seed restarts the tie-break stream.
    pub fn update_config(&mut self, config: BotConfig) {
        if config.seed != self.config.seed {
            self.rng = tie_break_rng(&config);
        }
        let config = Arc::new(config);
        self.engine.update_config(config.clone());
        self.config = config;
    }

    /// Drops every cached search result, e.g. between games.
    pub fn reset(&mut self) {
        self.engine.clear();
    }

    /// Best move for the side to move in `snapshot`, or `None` when the game
    /// is not waiting on a placement or no placement is legal.
    pub fn find_best_move(&mut self, snapshot: &GameSnapshot) -> Option<Move> {
        self.find_best_move_with_stats(snapshot).map(|(mv, _)| mv)
    }

    pub fn find_best_move_with_stats(
        &mut self,
        snapshot: &GameSnapshot,
    ) -> Option<(Move, SearchStats)> {
        if snapshot.phase != GamePhase::Playing {
            return None;
        }
        self.decide(&snapshot.position())
    }

    /// Index of the pending graduation option that leaves the chooser best
    /// placed. Ties go to the lower index.
    pub fn choose_graduation(&self, snapshot: &GameSnapshot) -> Option<usize> {
        let pending = snapshot.pending_graduation.as_ref()?;
        let position = snapshot.position();
        let mut best: Option<(usize, i32)> = None;
        for (i, option) in pending.options.iter().enumerate() {
            let mut next = position;
            rules::apply_graduation(&mut next.board, &mut next.pools, &option.cells);
            let score = self.engine.evaluator().evaluate(&next, pending.color);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }
        best.map(|(i, _)| i)
    }

    /// Runs the tier cascade on `position` for its side to move.
    pub fn decide(&mut self, position: &Position) -> Option<(Move, SearchStats)> {
        self.engine.new_decision();
        let moves = MoveList::generate(position);
        if moves.is_empty() {
            return None;
        }

        let mut threats = None;
        for step in tiers::cascade(&self.config) {
            let qualifying = tiers::qualifying(step.tier, position, &moves, &mut threats);
            if qualifying.is_empty() {
                continue;
            }
            trace!(
                "{:?}: {} qualifying, tie-break {:?}",
                step.tier,
                qualifying.len(),
                step.tie_break
            );
            if let Some(found) = self.break_tie(step, position, &qualifying) {
                return Some(found);
            }
        }
        None
    }

    fn break_tie(
        &mut self,
        step: TierStep,
        position: &Position,
        qualifying: &[Candidate],
    ) -> Option<(Move, SearchStats)> {
        if let [only] = qualifying {
            return Some((only.mv, self.one_ply_stats(position, only)));
        }
        match step.tie_break {
            TieBreak::Random => qualifying
                .choose(&mut self.rng)
                .map(|c| (c.mv, self.one_ply_stats(position, c))),
            TieBreak::Search => {
                let root: Vec<Move> = qualifying.iter().map(|c| c.mv).collect();
                self.engine.search(position, self.config.depth, &root)
            }
            TieBreak::Score => {
                let mut shuffled = qualifying.to_vec();
                shuffled.shuffle(&mut self.rng);
                let mut best: Option<(Move, SearchStats)> = None;
                for c in &shuffled {
                    let stats = self.one_ply_stats(position, c);
                    if best.map_or(true, |(_, s)| stats.score > s.score) {
                        best = Some((c.mv, stats));
                    }
                }
                best
            }
        }
    }

    fn one_ply_stats(&self, position: &Position, candidate: &Candidate) -> SearchStats {
        let score = if candidate.wins {
            self.config.win_score
        } else {
            self.engine
                .evaluator()
                .evaluate(&candidate.next, position.to_move)
        };
        SearchStats {
            depth: 1,
            nodes: 1,
            score,
            ..SearchStats::default()
        }
    }
}

impl fmt::Debug for BoopBot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoopBot")
            .field("depth", &self.config.depth)
            .field("seed", &self.config.seed)
            .finish_non_exhaustive()
    }
}

impl Bot for BoopBot {
    fn select_move(&mut self, position: &Position) -> Option<Move> {
        self.decide(position).map(|(mv, _)| mv)
    }
}

/// Plays a uniformly random legal move. Baseline for tournaments.
pub struct RandomBot<R: Rng> {
    rng: R,
}

impl<R: Rng> RandomBot<R> {
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> fmt::Debug for RandomBot<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RandomBot")
    }
}

impl<R: Rng> Bot for RandomBot<R> {
    fn select_move(&mut self, position: &Position) -> Option<Move> {
        position.legal_moves().choose(&mut self.rng).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::board::{Board, Color, PieceKind};
    use crate::logic::game::GameState;
    use crate::logic::geometry::Coord;
    use crate::logic::player::Pool;
    use crate::logic::simulator::simulate;

    fn seeded(depth: u8) -> BoopBot {
        BoopBot::new(BotConfig {
            depth,
            seed: Some(11),
            ..BotConfig::default()
        })
    }

    fn cat_threat(to_move: Color) -> Position {
        let mut position = Position::from_notation("6/6/GG4/6/6/6", to_move).unwrap();
        position.pools[1] = Pool {
            kittens: 5,
            cats: 1,
            retired: 3,
        };
        position
    }

    #[test]
    fn test_takes_the_win() {
        let position = cat_threat(Color::Gray);
        let (mv, stats) = seeded(1).decide(&position).unwrap();
        assert!(simulate(&position, mv).unwrap().wins);
        assert_eq!(stats.score, BotConfig::default().win_score);
    }

    #[test]
    fn test_blocks_the_win_cell() {
        let position = cat_threat(Color::Orange);
        let mv = seeded(2).select_move(&position).unwrap();
        assert_eq!(mv.at(), Coord::new(2, 2));
    }

    #[test]
    fn test_score_tie_break_stays_in_tier() {
        let mut bot = BoopBot::new(BotConfig {
            depth: 1,
            tie_break_graduate: TieBreak::Score,
            seed: Some(3),
            ..BotConfig::default()
        });
        // (2,0) and (2,3) both complete a kitten line.
        let position = Position::from_notation("6/6/1oo3/6/6/6", Color::Orange).unwrap();
        let (mv, stats) = bot.decide(&position).unwrap();
        assert!(simulate(&position, mv).unwrap().creates_graduation);
        assert_eq!(stats.depth, 1);
    }

    #[test]
    fn test_same_seed_same_move() {
        let position = Position::from_notation("6/1o4/2g3/6/6/6", Color::Orange).unwrap();
        let a = seeded(2).select_move(&position);
        let b = seeded(2).select_move(&position);
        assert_eq!(a, b);
    }

    #[test]
    fn test_no_move_without_pieces() {
        let mut position = Position::new();
        position.pools[0] = Pool {
            kittens: 0,
            cats: 0,
            retired: 0,
        };
        assert!(seeded(1).decide(&position).is_none());
    }

    #[test]
    fn test_snapshot_outside_play_yields_nothing() {
        let game = GameState::new();
        assert!(seeded(1).find_best_move(&game.snapshot()).is_none());
    }

    #[test]
    fn test_choose_graduation_prefers_central_leftover() {
        let mut game = GameState::new();
        game.add_player("a", "Ada").unwrap();
        game.add_player("b", "Bo").unwrap();
        game.board = Board::from_notation("6/6/ooo3/6/6/g5").unwrap();
        game.players[0].as_mut().unwrap().pool.kittens = 5;
        game.players[1].as_mut().unwrap().pool.kittens = 7;
        game.place_piece("a", 2, 3, PieceKind::Kitten).unwrap();

        let snapshot = game.snapshot();
        let bot = seeded(1);
        // Option 0 leaves the kitten on (2,3), option 1 leaves it on the edge.
        assert_eq!(bot.choose_graduation(&snapshot), Some(0));
        assert!(seeded(1).find_best_move(&snapshot).is_none());
    }

    #[test]
    fn test_update_config_matches_a_fresh_bot() {
        let position = Position::from_notation("6/1o4/2g3/6/6/6", Color::Orange).unwrap();
        let mut bot = seeded(1);
        assert!(bot.select_move(&position).is_some());
        let deeper = BotConfig {
            depth: 2,
            seed: Some(12),
            ..BotConfig::default()
        };
        bot.update_config(deeper.clone());
        assert_eq!(bot.config(), &deeper);
        assert_eq!(bot.engine.config(), &deeper);

        let (_, stats) = bot.decide(&position).unwrap();
        let (_, fresh) = BoopBot::new(deeper).decide(&position).unwrap();
        assert_eq!(stats.depth, fresh.depth);
    }

    #[test]
    fn test_random_bot_plays_legal_moves() {
        let mut bot = RandomBot::new(StdRng::seed_from_u64(5));
        let position = Position::new();
        let mv = bot.select_move(&position).unwrap();
        assert!(simulate(&position, mv).is_ok());
        assert_eq!(format!("{bot:?}"), "RandomBot");
    }
}
