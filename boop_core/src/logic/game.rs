use crate::engine::Move;
use crate::logic::board::{Board, Color, PieceKind};
use crate::logic::geometry::Coord;
use crate::logic::player::{PlayerState, PlayerView, Pool, PIECES_PER_KIND};
use crate::logic::rules::{
    apply_graduation, cats_earned, play_placement, target_cell, win_reason, BoopEffect,
    GraduationEffect, GraduationOption, GraduationStep, RuleError, WinReason,
};
use crate::logic::simulator::Position;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    Waiting,
    Playing,
    SelectingGraduation,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingGraduation {
    pub color: Color,
    pub options: Vec<GraduationOption>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LastMove {
    pub color: Color,
    pub at: Coord,
    pub kind: PieceKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionRecord {
    Placement {
        color: Color,
        at: Coord,
        kind: PieceKind,
        boops: Vec<BoopEffect>,
        graduated: Vec<GraduationEffect>,
        forced: bool,
    },
    GraduationChoice {
        color: Color,
        option: GraduationOption,
        graduated: Vec<GraduationEffect>,
    },
}

/// What a successful `place_piece` did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveOutcome {
    pub boops: Vec<BoopEffect>,
    pub graduated: Vec<GraduationEffect>,
    pub cats_earned: u8,
    pub forced_graduation: bool,
    pub winner: Option<Color>,
    pub win_reason: Option<WinReason>,
    /// Non-empty when the game now waits on `select_graduation`.
    pub pending_options: Vec<GraduationOption>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraduationOutcome {
    pub graduated: Vec<GraduationEffect>,
    pub cats_earned: u8,
    pub winner: Option<Color>,
    pub win_reason: Option<WinReason>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinInfo {
    pub color: Color,
    pub token: Uuid,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvariantViolation {
    #[error("{color}: {in_pool} kittens in pool + {on_board} on board + {retired} retired != 8")]
    KittenCount {
        color: Color,
        in_pool: u8,
        on_board: u8,
        retired: u8,
    },
    #[error("{color}: {in_pool} cats in pool + {on_board} on board != {retired} retired kittens")]
    CatCount {
        color: Color,
        in_pool: u8,
        on_board: u8,
        retired: u8,
    },
}

/// Deep copy of everything a caller may render or hand to a bot. Identities
/// and reconnection tokens stay behind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub board: Board,
    pub players: [Option<PlayerView>; 2],
    pub current_turn: Color,
    pub phase: GamePhase,
    pub winner: Option<Color>,
    pub win_reason: Option<WinReason>,
    pub last_move: Option<LastMove>,
    pub last_boops: Vec<BoopEffect>,
    pub last_graduation: Vec<GraduationEffect>,
    pub pending_graduation: Option<PendingGraduation>,
}

impl GameSnapshot {
    #[must_use]
    pub fn pool(&self, color: Color) -> Pool {
        match color {
            Color::Orange => &self.players[0],
            Color::Gray => &self.players[1],
        }
        .as_ref()
        .map_or_else(Pool::new, PlayerView::pool)
    }

    #[must_use]
    pub fn position(&self) -> Position {
        Position {
            board: self.board,
            pools: [self.pool(Color::Orange), self.pool(Color::Gray)],
            to_move: self.current_turn,
        }
    }
}

/// The authoritative state of one game.
///
/// Not synchronised: callers serialise operations per instance. Every
/// operation validates before it mutates, so an `Err` leaves the state as it
/// was.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub board: Board,
    pub players: [Option<PlayerState>; 2],
    pub current_turn: Color,
    pub phase: GamePhase,
    pub winner: Option<Color>,
    pub win_reason: Option<WinReason>,
    pub last_move: Option<LastMove>,
    pub last_boops: Vec<BoopEffect>,
    pub last_graduation: Vec<GraduationEffect>,
    pub pending_graduation: Option<PendingGraduation>,
    pub history: Vec<ActionRecord>,
}

impl Default for GameState {
    fn default() -> Self {
        Self::new()
    }
}

impl GameState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            board: Board::new(),
            players: [None, None],
            current_turn: Color::Orange,
            phase: GamePhase::Waiting,
            winner: None,
            win_reason: None,
            last_move: None,
            last_boops: Vec::new(),
            last_graduation: Vec::new(),
            pending_graduation: None,
            history: Vec::new(),
        }
    }

    #[must_use]
    pub fn player(&self, color: Color) -> Option<&PlayerState> {
        match color {
            Color::Orange => self.players[0].as_ref(),
            Color::Gray => self.players[1].as_ref(),
        }
    }

    fn player_mut(&mut self, color: Color) -> Option<&mut PlayerState> {
        match color {
            Color::Orange => self.players[0].as_mut(),
            Color::Gray => self.players[1].as_mut(),
        }
    }

    fn seat_mut(&mut self, color: Color) -> &mut Option<PlayerState> {
        match color {
            Color::Orange => &mut self.players[0],
            Color::Gray => &mut self.players[1],
        }
    }

    /// Color seated under `identity`.
    #[must_use]
    pub fn color_of(&self, identity: &str) -> Option<Color> {
        Color::ALL
            .into_iter()
            .find(|&c| self.player(c).is_some_and(|p| p.identity == identity))
    }

    #[must_use]
    pub fn pools(&self) -> [Pool; 2] {
        Color::ALL.map(|c| self.player(c).map_or_else(Pool::new, |p| p.pool))
    }

    fn store_pools(&mut self, pools: [Pool; 2]) {
        for (color, pool) in Color::ALL.into_iter().zip(pools) {
            if let Some(player) = self.player_mut(color) {
                player.pool = pool;
            }
        }
    }

    fn both_connected(&self) -> bool {
        Color::ALL
            .into_iter()
            .all(|c| self.player(c).is_some_and(|p| p.connected))
    }

    fn start_if_ready(&mut self) {
        if self.phase == GamePhase::Waiting && self.both_connected() {
            self.phase = GamePhase::Playing;
            info!("Both players connected, game starts with {}", self.current_turn);
        }
    }

    // --- Membership ---

    /// Seats `identity` in the first free color, Orange first.
    pub fn add_player(&mut self, identity: &str, name: &str) -> Result<JoinInfo, RuleError> {
        if self.color_of(identity).is_some() {
            return Err(RuleError::AlreadyJoined);
        }
        let color = Color::ALL
            .into_iter()
            .find(|&c| self.player(c).is_none())
            .ok_or(RuleError::GameFull)?;

        let player = PlayerState::new(color, identity.to_string(), name.to_string());
        let token = player.token;
        *self.seat_mut(color) = Some(player);
        info!("Player {name} joined as {color}");

        self.start_if_ready();
        Ok(JoinInfo { color, token })
    }

    /// Marks the seat disconnected. Repeating it is harmless; the phase never
    /// changes.
    pub fn disconnect_player(&mut self, identity: &str) -> Result<Color, RuleError> {
        let color = self.color_of(identity).ok_or(RuleError::PlayerNotFound)?;
        if let Some(player) = self.player_mut(color) {
            if player.connected {
                player.connected = false;
                info!("Player {} ({color}) disconnected", player.name);
            }
        }
        Ok(color)
    }

    /// Re-associates the seat holding `token` with a new connection.
    pub fn rejoin_player(&mut self, token: Uuid, new_identity: &str) -> Result<Color, RuleError> {
        let color = Color::ALL
            .into_iter()
            .find(|&c| self.player(c).is_some_and(|p| p.token == token))
            .ok_or(RuleError::InvalidToken)?;
        if self.color_of(new_identity).is_some_and(|c| c != color) {
            return Err(RuleError::AlreadyJoined);
        }
        if let Some(player) = self.player_mut(color) {
            player.identity = new_identity.to_string();
            player.connected = true;
            info!("Player {} ({color}) rejoined", player.name);
        }
        self.start_if_ready();
        Ok(color)
    }

    /// Frees the seat. Leaving a game in progress hands the win to the
    /// opponent.
    pub fn remove_player(&mut self, identity: &str) -> Result<Color, RuleError> {
        let color = self.color_of(identity).ok_or(RuleError::PlayerNotFound)?;
        *self.seat_mut(color) = None;
        info!("Player {identity} left {color} seat");

        if matches!(
            self.phase,
            GamePhase::Playing | GamePhase::SelectingGraduation
        ) {
            let winner = color.opposite();
            self.pending_graduation = None;
            self.finish(winner, WinReason::OpponentLeft);
        }
        Ok(color)
    }

    // --- Game actions ---

    pub fn place_piece(
        &mut self,
        identity: &str,
        row: i32,
        col: i32,
        kind: PieceKind,
    ) -> Result<MoveOutcome, RuleError> {
        let result = self.try_place_piece(identity, row, col, kind);
        if let Err(e) = &result {
            warn!("Rejected placement by {identity} at ({row},{col}): {}", e.code());
        }
        result
    }

    fn try_place_piece(
        &mut self,
        identity: &str,
        row: i32,
        col: i32,
        kind: PieceKind,
    ) -> Result<MoveOutcome, RuleError> {
        let color = self.color_of(identity).ok_or(RuleError::PlayerNotFound)?;
        if self.phase != GamePhase::Playing {
            return Err(RuleError::GameNotPlaying);
        }
        if color != self.current_turn {
            return Err(RuleError::NotYourTurn);
        }
        let at = target_cell(row, col)?;

        let mut board = self.board;
        let mut pools = self.pools();
        let placement = play_placement(&mut board, &mut pools, color, at, kind, None)?;

        self.board = board;
        self.store_pools(pools);
        self.last_move = Some(LastMove { color, at, kind });
        self.last_boops.clone_from(&placement.boops);
        self.last_graduation = placement.graduation.effects().to_vec();

        let forced = matches!(placement.graduation, GraduationStep::Applied { forced: true, .. });
        let cats = placement.graduation.cats_earned();
        debug!(
            "{color} {kind:?} at {at}: {} boops, {} graduated, {cats} cats earned",
            placement.boops.len(),
            self.last_graduation.len()
        );
        self.history.push(ActionRecord::Placement {
            color,
            at,
            kind,
            boops: placement.boops.clone(),
            graduated: self.last_graduation.clone(),
            forced,
        });

        let mut outcome = MoveOutcome {
            boops: placement.boops,
            graduated: self.last_graduation.clone(),
            cats_earned: cats,
            forced_graduation: forced,
            winner: None,
            win_reason: None,
            pending_options: Vec::new(),
        };

        if let GraduationStep::Pending(options) = placement.graduation {
            info!("{color} must choose among {} graduation options", options.len());
            self.phase = GamePhase::SelectingGraduation;
            self.pending_graduation = Some(PendingGraduation {
                color,
                options: options.clone(),
            });
            outcome.pending_options = options;
        } else {
            self.conclude_turn(color);
            outcome.winner = self.winner;
            outcome.win_reason = self.win_reason;
        }

        self.debug_check_conservation();
        Ok(outcome)
    }

    pub fn select_graduation(
        &mut self,
        identity: &str,
        option_index: usize,
    ) -> Result<GraduationOutcome, RuleError> {
        let result = self.try_select_graduation(identity, option_index);
        if let Err(e) = &result {
            warn!("Rejected graduation choice {option_index} by {identity}: {}", e.code());
        }
        result
    }

    fn try_select_graduation(
        &mut self,
        identity: &str,
        option_index: usize,
    ) -> Result<GraduationOutcome, RuleError> {
        let color = self.color_of(identity).ok_or(RuleError::PlayerNotFound)?;
        if self.phase != GamePhase::SelectingGraduation {
            return Err(RuleError::NotSelectingGraduation);
        }
        let pending = self
            .pending_graduation
            .as_ref()
            .ok_or(RuleError::NotSelectingGraduation)?;
        if pending.color != color {
            return Err(RuleError::NotYourGraduation);
        }
        let option = *pending
            .options
            .get(option_index)
            .ok_or(RuleError::InvalidOption)?;

        let mut pools = self.pools();
        let graduated = apply_graduation(&mut self.board, &mut pools, &option.cells);
        self.store_pools(pools);
        self.pending_graduation = None;
        self.phase = GamePhase::Playing;
        self.last_graduation.clone_from(&graduated);
        self.history.push(ActionRecord::GraduationChoice {
            color,
            option,
            graduated: graduated.clone(),
        });
        debug!("{color} graduated option {option_index}");

        self.conclude_turn(color);
        self.debug_check_conservation();
        Ok(GraduationOutcome {
            cats_earned: cats_earned(&graduated),
            graduated,
            winner: self.winner,
            win_reason: self.win_reason,
        })
    }

    /// Win check for the color that just acted, then the turn passes.
    fn conclude_turn(&mut self, color: Color) {
        if let Some(reason) = win_reason(&self.board, color) {
            self.finish(color, reason);
        } else {
            self.current_turn = color.opposite();
        }
    }

    fn finish(&mut self, winner: Color, reason: WinReason) {
        self.phase = GamePhase::Finished;
        self.winner = Some(winner);
        self.win_reason = Some(reason);
        info!("{winner} wins ({reason:?})");
    }

    /// Clears the board and pools for a fresh game between the same seats.
    pub fn restart(&mut self) {
        self.board.clear();
        for color in Color::ALL {
            if let Some(player) = self.player_mut(color) {
                player.pool = Pool::new();
                player.rematch_ready = false;
            }
        }
        self.current_turn = Color::Orange;
        self.winner = None;
        self.win_reason = None;
        self.last_move = None;
        self.last_boops.clear();
        self.last_graduation.clear();
        self.pending_graduation = None;
        self.history.clear();
        self.phase = GamePhase::Waiting;
        self.start_if_ready();
        info!("Game restarted");
    }

    /// Flags `identity` as ready for a rematch; the game restarts once both
    /// seats agree. Returns whether it restarted.
    pub fn request_rematch(&mut self, identity: &str) -> Result<bool, RuleError> {
        let color = self.color_of(identity).ok_or(RuleError::PlayerNotFound)?;
        if self.phase != GamePhase::Finished {
            return Ok(false);
        }
        if let Some(player) = self.player_mut(color) {
            player.rematch_ready = true;
        }
        let all_ready = Color::ALL
            .into_iter()
            .all(|c| self.player(c).is_some_and(|p| p.rematch_ready));
        if all_ready {
            self.restart();
        }
        Ok(all_ready)
    }

    // --- Views ---

    #[must_use]
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board,
            players: Color::ALL.map(|c| self.player(c).map(PlayerState::view)),
            current_turn: self.current_turn,
            phase: self.phase,
            winner: self.winner,
            win_reason: self.win_reason,
            last_move: self.last_move,
            last_boops: self.last_boops.clone(),
            last_graduation: self.last_graduation.clone(),
            pending_graduation: self.pending_graduation.clone(),
        }
    }

    #[must_use]
    pub fn position(&self) -> Position {
        Position {
            board: self.board,
            pools: self.pools(),
            to_move: self.current_turn,
        }
    }

    /// Moves `color` could make from the current board, with graduation
    /// choices expanded.
    #[must_use]
    pub fn legal_moves(&self, color: Color) -> Vec<Move> {
        let mut position = self.position();
        position.to_move = color;
        position.legal_moves()
    }

    /// Piece accounting for every seated color.
    pub fn check_conservation(&self) -> Result<(), InvariantViolation> {
        for color in Color::ALL {
            let Some(player) = self.player(color) else {
                continue;
            };
            let pool = player.pool;
            let kittens_on_board = self.board.count(color, PieceKind::Kitten);
            let cats_on_board = self.board.count(color, PieceKind::Cat);
            let kittens =
                u16::from(pool.kittens) + u16::from(kittens_on_board) + u16::from(pool.retired);
            if kittens != u16::from(PIECES_PER_KIND) {
                return Err(InvariantViolation::KittenCount {
                    color,
                    in_pool: pool.kittens,
                    on_board: kittens_on_board,
                    retired: pool.retired,
                });
            }
            if u16::from(pool.cats) + u16::from(cats_on_board) != u16::from(pool.retired) {
                return Err(InvariantViolation::CatCount {
                    color,
                    in_pool: pool.cats,
                    on_board: cats_on_board,
                    retired: pool.retired,
                });
            }
        }
        Ok(())
    }

    fn debug_check_conservation(&self) {
        if cfg!(debug_assertions) {
            if let Err(e) = self.check_conservation() {
                error!("Piece conservation broken: {e}");
            }
        }
    }
}
