use crate::engine::config::BotConfig;
use crate::engine::eval::SimpleEvaluator;
use crate::engine::move_list::MoveList;
use crate::engine::tt::{TTFlag, TranspositionTable};
use crate::engine::{Evaluator, Move, SearchStats, Searcher};
use crate::logic::board::PieceKind;
use crate::logic::geometry::{Ring, NUM_CELLS};
use crate::logic::simulator::Position;
use log::debug;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;

const MAX_PLY: usize = 64;
const INF: i32 = i32::MAX / 2;

pub struct AlphaBetaEngine {
    config: Arc<BotConfig>,
    evaluator: SimpleEvaluator,
    tt: TranspositionTable,
    killer_moves: [[Option<Move>; 2]; MAX_PLY],
    history_table: [[i32; 2]; NUM_CELLS],
    rng: StdRng,
    nodes_searched: u32,
    tt_hits: u32,
    cutoffs: u32,
}

fn rng_for(config: &BotConfig) -> StdRng {
    config
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64)
}

const fn tt_megabytes(config: &BotConfig) -> usize {
    if config.use_tt {
        config.tt_size_mb
    } else {
        0
    }
}

impl AlphaBetaEngine {
    pub fn new(config: Arc<BotConfig>) -> Self {
        Self {
            evaluator: SimpleEvaluator::new(config.clone()),
            tt: TranspositionTable::new(tt_megabytes(&config)),
            killer_moves: [[None; 2]; MAX_PLY],
            history_table: [[0; 2]; NUM_CELLS],
            rng: rng_for(&config),
            config,
            nodes_searched: 0,
            tt_hits: 0,
            cutoffs: 0,
        }
    }

    pub fn update_config(&mut self, config: Arc<BotConfig>) {
        if tt_megabytes(&config) != tt_megabytes(&self.config) {
            self.tt = TranspositionTable::new(tt_megabytes(&config));
        }
        if config.seed != self.config.seed {
            self.rng = rng_for(&config);
        }
        self.evaluator = SimpleEvaluator::new(config.clone());
        self.config = config;
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub const fn evaluator(&self) -> &SimpleEvaluator {
        &self.evaluator
    }

    /// Called once per move decision: old history fades, killers go.
    pub fn new_decision(&mut self) {
        for row in &mut self.history_table {
            for val in row.iter_mut() {
                *val /= 2;
            }
        }
        self.killer_moves = [[None; 2]; MAX_PLY];
    }

    /// Forgets everything learned, e.g. between games.
    pub fn clear(&mut self) {
        self.tt.clear();
        self.history_table = [[0; 2]; NUM_CELLS];
        self.killer_moves = [[None; 2]; MAX_PLY];
    }

    /// Milliseconds from an arbitrary origin, on native and in the browser.
    pub(crate) fn now() -> f64 {
        #[cfg(target_arch = "wasm32")]
        {
            use wasm_bindgen::JsCast;
            if let Some(window) = web_sys::window() {
                return window.performance().map(|p| p.now()).unwrap_or(0.0);
            }
            let global = js_sys::global();
            if let Ok(worker) = global.dyn_into::<web_sys::WorkerGlobalScope>() {
                return worker.performance().map(|p| p.now()).unwrap_or(0.0);
            }
            0.0
        }
        #[cfg(not(target_arch = "wasm32"))]
        {
            use std::time::{SystemTime, UNIX_EPOCH};
            let since_the_epoch = SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or_default();
            #[allow(clippy::cast_precision_loss)]
            let time_ms = (since_the_epoch.as_secs() as f64).mul_add(
                1000.0,
                f64::from(since_the_epoch.subsec_nanos()) / 1_000_000.0,
            );
            time_ms
        }
    }

    fn win_in(&self, ply: u8) -> i32 {
        self.config.win_score - i32::from(ply)
    }

    /// Scores within `MAX_PLY` of the sentinel encode a forced win or loss.
    #[must_use]
    pub fn is_win_score(&self, score: i32) -> bool {
        #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
        let threshold = self.config.win_score - MAX_PLY as i32;
        score.abs() >= threshold
    }

    // Win scores are stored relative to the node, not the root.
    fn score_to_tt(&self, score: i32, ply: u8) -> i32 {
        if !self.is_win_score(score) {
            score
        } else if score > 0 {
            score + i32::from(ply)
        } else {
            score - i32::from(ply)
        }
    }

    fn score_from_tt(&self, score: i32, ply: u8) -> i32 {
        if !self.is_win_score(score) {
            score
        } else if score > 0 {
            score - i32::from(ply)
        } else {
            score + i32::from(ply)
        }
    }

    fn history_score(&self, mv: Move) -> i32 {
        mv.at()
            .and_then(|at| self.history_table.get(at.index()))
            .and_then(|row| row.get(mv.kind.index()))
            .copied()
            .unwrap_or(0)
    }

    fn credit_history(&mut self, mv: Move, depth: u8) {
        if !self.config.use_history {
            return;
        }
        let Some(cell) = mv.at().map(|at| at.index()) else {
            return;
        };
        if let Some(slot) = self
            .history_table
            .get_mut(cell)
            .and_then(|row| row.get_mut(mv.kind.index()))
        {
            *slot = slot.saturating_add(i32::from(depth) * i32::from(depth));
        }
    }

    fn store_killer(&mut self, depth: u8, mv: Move) {
        if !self.config.use_killers {
            return;
        }
        // Shift: 0 -> 1, new -> 0
        if let Some(killers) = self.killer_moves.get_mut(usize::from(depth)) {
            if killers[0] != Some(mv) {
                killers[1] = killers[0];
                killers[0] = Some(mv);
            }
        }
    }

    fn is_killer(&self, depth: u8, mv: Move) -> bool {
        self.config.use_killers
            && self
                .killer_moves
                .get(usize::from(depth))
                .is_some_and(|k| k.contains(&Some(mv)))
    }

    fn positional_order(&self, mv: Move) -> i32 {
        let ring = mv.at().map_or(Ring::Corner, |at| at.ring());
        let base = match ring {
            Ring::Center => self.config.order_center,
            Ring::Inner => self.config.order_inner,
            Ring::Edge => self.config.order_edge,
            Ring::Corner => self.config.order_corner,
        };
        if mv.kind == PieceKind::Cat {
            base + self.config.order_cat_bonus
        } else {
            base
        }
    }

    /// winning > graduation > killer > history > position and knock-offs.
    fn order_moves(&self, moves: &mut MoveList, hash_move: Option<Move>, depth: u8) {
        for candidate in moves.iter_mut() {
            let mv = candidate.mv;
            candidate.mv.score = if hash_move == Some(mv) {
                self.config.score_hash_move
            } else if candidate.wins {
                self.config.score_win
            } else if candidate.creates_graduation {
                self.config.score_graduation
            } else if self.is_killer(depth, mv) {
                self.config.score_killer_move
            } else {
                let history = if self.config.use_history {
                    self.history_score(mv).min(self.config.score_history_max)
                } else {
                    0
                };
                history
                    + self.positional_order(mv)
                    + i32::from(candidate.knocked_off) * self.config.order_knock_off
            };
        }
        moves.sort_by_score();
    }

    fn negamax(
        &mut self,
        position: &Position,
        depth: u8,
        ply: u8,
        mut alpha: i32,
        mut beta: i32,
    ) -> i32 {
        self.nodes_searched += 1;

        if depth == 0 || usize::from(ply) >= MAX_PLY - 1 {
            return self.evaluator.evaluate(position, position.to_move);
        }

        let alpha_orig = alpha;
        let key = position.zobrist_key();
        let mut hash_move = None;

        if self.config.use_tt {
            if let Some(entry) = self.tt.probe(key) {
                hash_move = entry.best_move;
                if entry.depth >= depth {
                    self.tt_hits += 1;
                    let score = self.score_from_tt(entry.score, ply);
                    match entry.flag {
                        TTFlag::Exact => return score,
                        TTFlag::LowerBound => alpha = alpha.max(score),
                        TTFlag::UpperBound => beta = beta.min(score),
                    }
                    if alpha >= beta {
                        return score;
                    }
                }
            }
        }

        let mut moves = MoveList::generate(position);
        if moves.is_empty() {
            // Nothing to place: treated as a draw.
            return 0;
        }
        self.order_moves(&mut moves, hash_move, depth);

        let mut best_score = -INF;
        let mut best_move = None;

        for (i, candidate) in moves.into_iter().enumerate() {
            let score = if candidate.wins {
                self.win_in(ply + 1)
            } else if i == 0 {
                -self.negamax(&candidate.next, depth - 1, ply + 1, -beta, -alpha)
            } else {
                // Null window first; re-search only if it might raise alpha.
                let probe = -self.negamax(&candidate.next, depth - 1, ply + 1, -alpha - 1, -alpha);
                if probe > alpha && probe < beta {
                    -self.negamax(&candidate.next, depth - 1, ply + 1, -beta, -alpha)
                } else {
                    probe
                }
            };

            if score > best_score {
                best_score = score;
                best_move = Some(candidate.mv);
            }
            if score > alpha {
                alpha = score;
            }
            if alpha >= beta {
                self.cutoffs += 1;
                if !candidate.wins {
                    self.store_killer(depth, candidate.mv);
                    self.credit_history(candidate.mv, depth);
                }
                break;
            }
            if candidate.wins {
                break;
            }
        }

        if self.config.use_tt {
            let flag = if best_score <= alpha_orig {
                TTFlag::UpperBound
            } else if best_score >= beta {
                TTFlag::LowerBound
            } else {
                TTFlag::Exact
            };
            let stored = self.score_to_tt(best_score, ply);
            self.tt.store(key, best_move, stored, depth, flag);
        }

        best_score
    }

    fn search_root(
        &mut self,
        root: &mut MoveList,
        depth: u8,
        previous_best: Option<Move>,
    ) -> Option<(Move, i32)> {
        self.order_moves(root, previous_best, depth);

        let mut alpha = -INF;
        let beta = INF;
        let mut best: Option<(Move, i32)> = None;

        for (i, candidate) in root.iter().enumerate() {
            let score = if candidate.wins {
                self.win_in(1)
            } else if i == 0 {
                -self.negamax(&candidate.next, depth - 1, 1, -beta, -alpha)
            } else {
                let probe = -self.negamax(&candidate.next, depth - 1, 1, -alpha - 1, -alpha);
                if probe > alpha {
                    -self.negamax(&candidate.next, depth - 1, 1, -beta, -alpha)
                } else {
                    probe
                }
            };

            if best.map_or(true, |(_, s)| score > s) {
                best = Some((candidate.mv, score));
            }
            alpha = alpha.max(score);
            if candidate.wins {
                break;
            }
        }
        best
    }
}

impl Searcher for AlphaBetaEngine {
    fn search(
        &mut self,
        position: &Position,
        depth: u8,
        root_moves: &[Move],
    ) -> Option<(Move, SearchStats)> {
        self.nodes_searched = 0;
        self.tt_hits = 0;
        self.cutoffs = 0;
        let start_time = Self::now();

        let mut root = MoveList::generate(position);
        if !root_moves.is_empty() {
            root.retain(|c| root_moves.contains(&c.mv));
        }
        if root.is_empty() {
            return None;
        }
        // Equal ordering scores keep this order, so ties fall randomly.
        root.shuffle(&mut self.rng);

        #[allow(clippy::cast_possible_truncation)]
        let max_depth = depth.clamp(1, (MAX_PLY - 1) as u8);
        let first_depth = if self.config.use_iterative_deepening {
            1
        } else {
            max_depth
        };

        let mut best: Option<(Move, i32)> = None;
        let mut final_depth = 0;
        for d in first_depth..=max_depth {
            let previous = best.map(|(mv, _)| mv);
            let Some(result) = self.search_root(&mut root, d, previous) else {
                break;
            };
            best = Some(result);
            final_depth = d;
            debug!(
                "depth {d}: {} score {} nodes {} tt hits {} cutoffs {}",
                result.0, result.1, self.nodes_searched, self.tt_hits, self.cutoffs
            );
            if self.is_win_score(result.1) {
                break;
            }
        }

        let elapsed = Self::now() - start_time;
        best.map(|(mv, score)| {
            (
                mv,
                SearchStats {
                    depth: final_depth,
                    nodes: self.nodes_searched,
                    tt_hits: self.tt_hits,
                    cutoffs: self.cutoffs,
                    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                    time_ms: elapsed.max(0.0) as u64,
                    score,
                },
            )
        })
    }
}
