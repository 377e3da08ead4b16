use crate::engine::Move;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TTFlag {
    Exact,
    LowerBound, // fail-high
    UpperBound, // fail-low
}

#[derive(Clone, Copy, Debug)]
pub struct TTEntry {
    pub key: u64,
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: u8,
    pub flag: TTFlag,
}

impl Default for TTEntry {
    fn default() -> Self {
        Self {
            key: 0,
            best_move: None,
            score: 0,
            depth: 0,
            flag: TTFlag::Exact,
        }
    }
}

/// Slot 0 keeps the deepest result seen for its index, slot 1 the most recent.
#[derive(Clone, Copy, Debug, Default)]
struct Bucket {
    deep: TTEntry,
    recent: TTEntry,
}

pub struct TranspositionTable {
    buckets: Vec<Bucket>,
    mask: usize,
}

impl TranspositionTable {
    pub fn new(size_mb: usize) -> Self {
        let bucket_size = std::mem::size_of::<Bucket>();
        let num_buckets = (size_mb * 1024 * 1024) / bucket_size;

        // Largest power of two that fits.
        let mut size = 1;
        while size <= num_buckets {
            size *= 2;
        }
        size /= 2;

        if size < 1024 {
            size = 1024;
        }

        Self {
            buckets: vec![Bucket::default(); size],
            mask: size - 1,
        }
    }

    #[allow(clippy::cast_possible_truncation)]
    const fn index(&self, key: u64) -> usize {
        (key as usize) & self.mask
    }

    pub fn probe(&self, key: u64) -> Option<TTEntry> {
        let bucket = self.buckets.get(self.index(key))?;
        [bucket.deep, bucket.recent]
            .into_iter()
            .find(|e| e.key == key && e.depth > 0)
    }

    /// Depth-0 results are not kept; an empty slot has depth 0 and never matches.
    pub fn store(
        &mut self,
        key: u64,
        best_move: Option<Move>,
        score: i32,
        depth: u8,
        flag: TTFlag,
    ) {
        if depth == 0 {
            return;
        }
        let idx = self.index(key);
        let Some(bucket) = self.buckets.get_mut(idx) else {
            return;
        };
        let entry = TTEntry {
            key,
            best_move,
            score,
            depth,
            flag,
        };
        if bucket.deep.key == key || entry.depth >= bucket.deep.depth {
            bucket.deep = entry;
        } else {
            bucket.recent = entry;
        }
    }

    pub fn clear(&mut self) {
        for bucket in &mut self.buckets {
            *bucket = Bucket::default();
        }
    }
}
