use crate::engine::Move;
use crate::logic::board::Color;
use crate::logic::simulator::{Position, SimOutcome};
use rand::seq::SliceRandom;
use rand::Rng;

/// A legal move together with what it leads to.
#[derive(Debug, Clone, Copy)]
pub struct Candidate {
    pub mv: Move,
    pub next: Position,
    pub wins: bool,
    pub creates_graduation: bool,
    pub knocked_off: u8,
}

impl Candidate {
    #[must_use]
    pub fn new(mv: Move, mover: Color, outcome: &SimOutcome) -> Self {
        Self {
            mv,
            next: outcome.position,
            wins: outcome.wins,
            creates_graduation: outcome.creates_graduation,
            knocked_off: u8::try_from(outcome.knocked_off(mover)).unwrap_or(u8::MAX),
        }
    }
}

// A placement count of 72 plus graduation choices rarely goes past 96.
const INITIAL_CAPACITY: usize = 96;

#[derive(Debug, Clone, Default)]
pub struct MoveList {
    candidates: Vec<Candidate>,
}

impl MoveList {
    pub fn new() -> Self {
        Self {
            candidates: Vec::with_capacity(INITIAL_CAPACITY),
        }
    }

    /// All fully resolved moves for the side to move of `position`.
    pub fn generate(position: &Position) -> Self {
        let mover = position.to_move;
        let mut list = Self::new();
        for (mv, outcome) in position.successors() {
            list.push(Candidate::new(mv, mover, &outcome));
        }
        list
    }

    pub fn push(&mut self, candidate: Candidate) {
        self.candidates.push(candidate);
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Candidate> {
        self.candidates.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Candidate> {
        self.candidates.iter_mut()
    }

    pub fn retain<F>(&mut self, f: F)
    where
        F: FnMut(&Candidate) -> bool,
    {
        self.candidates.retain(f);
    }

    /// Highest ordering score first; equal scores keep their relative order.
    pub fn sort_by_score(&mut self) {
        self.candidates.sort_by(|a, b| b.mv.score.cmp(&a.mv.score));
    }

    pub fn shuffle<R: Rng>(&mut self, rng: &mut R) {
        self.candidates.shuffle(rng);
    }
}

impl<'a> IntoIterator for &'a MoveList {
    type Item = &'a Candidate;
    type IntoIter = std::slice::Iter<'a, Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl IntoIterator for MoveList {
    type Item = Candidate;
    type IntoIter = std::vec::IntoIter<Candidate>;

    fn into_iter(self) -> Self::IntoIter {
        self.candidates.into_iter()
    }
}
