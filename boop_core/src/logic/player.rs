use crate::logic::board::{Color, PieceKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const PIECES_PER_KIND: u8 = 8;

/// Off-board supply of one color.
///
/// `retired` counts kittens permanently converted into cats. Every cat a color
/// owns was minted by such a conversion, so `retired` is also the number of
/// cats the color owns across pool and board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pool {
    pub kittens: u8,
    pub cats: u8,
    pub retired: u8,
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}

impl Pool {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            kittens: PIECES_PER_KIND,
            cats: 0,
            retired: 0,
        }
    }

    #[must_use]
    pub const fn available(&self, kind: PieceKind) -> u8 {
        match kind {
            PieceKind::Kitten => self.kittens,
            PieceKind::Cat => self.cats,
        }
    }

    #[must_use]
    pub const fn has(&self, kind: PieceKind) -> bool {
        self.available(kind) > 0
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.kittens == 0 && self.cats == 0
    }

    /// Removes one piece of `kind` for placement. Returns false if none is left.
    pub fn take(&mut self, kind: PieceKind) -> bool {
        let slot = match kind {
            PieceKind::Kitten => &mut self.kittens,
            PieceKind::Cat => &mut self.cats,
        };
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }

    /// A piece coming back from the board, booped off or graduated as a cat.
    pub fn give_back(&mut self, kind: PieceKind) {
        match kind {
            PieceKind::Kitten => self.kittens += 1,
            PieceKind::Cat => self.cats += 1,
        }
    }

    /// A kitten left the board through graduation and comes back as a cat.
    pub fn graduate_kitten(&mut self) {
        self.retired += 1;
        self.cats += 1;
    }

    #[must_use]
    pub const fn total_cats(&self) -> u8 {
        self.retired
    }
}

/// One occupied seat of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerState {
    pub color: Color,
    pub pool: Pool,
    pub identity: String,
    pub name: String,
    pub connected: bool,
    pub token: Uuid,
    /// Asked for a rematch after the game finished.
    pub rematch_ready: bool,
}

impl PlayerState {
    #[must_use]
    pub fn new(color: Color, identity: String, name: String) -> Self {
        Self {
            color,
            pool: Pool::new(),
            identity,
            name,
            connected: true,
            token: Uuid::new_v4(),
            rematch_ready: false,
        }
    }

    #[must_use]
    pub fn view(&self) -> PlayerView {
        PlayerView {
            color: self.color,
            name: self.name.clone(),
            connected: self.connected,
            kittens_in_pool: self.pool.kittens,
            cats_in_pool: self.pool.cats,
            kittens_retired: self.pool.retired,
        }
    }
}

/// What a snapshot exposes about a seat: no identity, no token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub color: Color,
    pub name: String,
    pub connected: bool,
    pub kittens_in_pool: u8,
    pub cats_in_pool: u8,
    pub kittens_retired: u8,
}

impl PlayerView {
    #[must_use]
    pub const fn pool(&self) -> Pool {
        Pool {
            kittens: self.kittens_in_pool,
            cats: self.cats_in_pool,
            retired: self.kittens_retired,
        }
    }
}
