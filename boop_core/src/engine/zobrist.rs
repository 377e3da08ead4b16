use crate::logic::board::{Color, PieceKind};
use crate::logic::geometry::NUM_CELLS;
use crate::logic::player::PIECES_PER_KIND;
use crate::logic::simulator::Position;
use std::sync::OnceLock;

// 2 colors * 2 kinds * 36 cells
const PIECE_VARIANTS: usize = 4;
const TABLE_SIZE: usize = PIECE_VARIANTS * NUM_CELLS;
// Pool counts range over 0..=8.
const POOL_STATES: usize = PIECES_PER_KIND as usize + 1;
const POOL_TABLE_SIZE: usize = PIECE_VARIANTS * POOL_STATES;

pub struct ZobristKeys {
    pub piece_keys: [u64; TABLE_SIZE],
    pub pool_keys: [u64; POOL_TABLE_SIZE],
    pub side_key: u64,
}

// Deterministic keys without pulling an RNG into hashing.
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    const fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    fn next(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.state = x;
        x
    }
}

const fn variant(color: Color, kind: PieceKind) -> usize {
    color.index() * 2 + kind.index()
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = XorShift64::new(0x0b00_b00b_5eed_cafe);
        let mut piece_keys = [0; TABLE_SIZE];
        for key in &mut piece_keys {
            *key = rng.next();
        }
        let mut pool_keys = [0; POOL_TABLE_SIZE];
        for key in &mut pool_keys {
            *key = rng.next();
        }
        let side_key = rng.next();

        Self {
            piece_keys,
            pool_keys,
            side_key,
        }
    }

    pub fn get() -> &'static Self {
        static INSTANCE: OnceLock<ZobristKeys> = OnceLock::new();
        INSTANCE.get_or_init(Self::new)
    }

    #[must_use]
    pub fn piece_key(&self, color: Color, kind: PieceKind, cell: usize) -> u64 {
        self.piece_keys
            .get(variant(color, kind) * NUM_CELLS + cell)
            .copied()
            .unwrap_or(0)
    }

    #[must_use]
    pub fn pool_key(&self, color: Color, kind: PieceKind, count: u8) -> u64 {
        let count = usize::from(count).min(POOL_STATES - 1);
        self.pool_keys
            .get(variant(color, kind) * POOL_STATES + count)
            .copied()
            .unwrap_or(0)
    }

    /// Cells, side to move and the four pool counts.
    #[must_use]
    pub fn hash(&self, position: &Position) -> u64 {
        let mut h = 0;
        for (at, piece) in position.board.pieces() {
            h ^= self.piece_key(piece.color, piece.kind, at.index());
        }
        for color in Color::ALL {
            let pool = position.pool(color);
            for kind in PieceKind::ALL {
                h ^= self.pool_key(color, kind, pool.available(kind));
            }
        }
        if position.to_move == Color::Gray {
            h ^= self.side_key;
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_distinct() {
        let keys = ZobristKeys::get();
        let mut all: Vec<u64> = keys.piece_keys.to_vec();
        all.extend_from_slice(&keys.pool_keys);
        all.push(keys.side_key);
        let n = all.len();
        all.sort_unstable();
        all.dedup();
        assert_eq!(all.len(), n);
    }

    #[test]
    fn test_hash_tracks_position_components() {
        let a = Position::from_notation("6/6/2o3/6/6/6", Color::Gray).unwrap();
        let b = Position::from_notation("6/6/3o2/6/6/6", Color::Gray).unwrap();
        assert_ne!(a.zobrist_key(), b.zobrist_key());
        assert_eq!(a.zobrist_key(), a.zobrist_key());
        let mut c = a;
        c.pools[0].cats = 1;
        assert_ne!(a.zobrist_key(), c.zobrist_key());
    }
}
