use std::collections::VecDeque;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use crate::shape::PieceKind;

/// Upcoming pieces visible to the player.
pub const PREVIEW_DEPTH: usize = 5;
/// The queue holds the piece about to spawn plus the preview.
const QUEUE_LEN: usize = PREVIEW_DEPTH + 1;
/// Front-to-back rotations tried when a fresh bag would open with the
/// piece that was just dequeued.
const ANTI_REPEAT_ATTEMPTS: usize = 10;

/// 7-bag piece source with a fixed-depth lookahead.
#[derive(Clone, Debug)]
pub struct Sequencer {
    queue: VecDeque<PieceKind>,
    bag: VecDeque<PieceKind>,
    last: Option<PieceKind>,
    rng: StdRng,
}

impl Sequencer {
    pub fn new(rng: StdRng) -> Self {
        let mut seq = Self {
            queue: VecDeque::with_capacity(QUEUE_LEN),
            bag: VecDeque::with_capacity(7),
            last: None,
            rng,
        };
        while seq.queue.len() < QUEUE_LEN {
            let kind = seq.draw();
            seq.queue.push_back(kind);
        }
        seq
    }

    pub fn seeded(seed: u64) -> Self {
        Self::new(StdRng::seed_from_u64(seed))
    }

    /// Consumes the front of the queue and tops the queue back up.
    pub fn next(&mut self) -> PieceKind {
        let front = match self.queue.pop_front() {
            Some(kind) => kind,
            None => self.draw(),
        };
        self.last = Some(front);
        let refill = self.draw();
        self.queue.push_back(refill);
        front
    }

    /// Starts a new bag epoch once the current one is spent. A fresh bag
    /// that opens with `last` is rotated front-to-back a bounded number of
    /// times; this avoids most immediate repeats but guarantees none.
    pub fn refill_if_empty(&mut self, last: Option<PieceKind>) {
        if self.bag.is_empty() {
            let fresh = self.fresh_bag(last);
            self.bag.extend(fresh);
        }
    }

    /// Pieces after the one that will spawn next.
    pub fn preview(&self) -> Vec<PieceKind> {
        self.queue.iter().skip(1).take(PREVIEW_DEPTH).copied().collect()
    }

    /// The piece the next call to [`Sequencer::next`] will return.
    pub fn peek(&self) -> Option<PieceKind> {
        self.queue.front().copied()
    }

    pub fn last(&self) -> Option<PieceKind> {
        self.last
    }

    /// Kinds left in the current bag epoch, in draw order.
    pub fn bag(&self) -> Vec<PieceKind> {
        self.bag.iter().copied().collect()
    }

    fn fresh_bag(&mut self, last: Option<PieceKind>) -> [PieceKind; 7] {
        let mut fresh = PieceKind::all();
        fresh.shuffle(&mut self.rng);
        if let Some(last) = last {
            let mut attempts = 0;
            while fresh[0] == last && attempts < ANTI_REPEAT_ATTEMPTS {
                fresh.rotate_left(1);
                attempts += 1;
            }
        }
        fresh
    }

    fn draw(&mut self) -> PieceKind {
        if let Some(kind) = self.bag.pop_front() {
            return kind;
        }
        let [first, rest @ ..] = self.fresh_bag(self.last);
        self.bag.extend(rest);
        first
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn queue_holds_preview_depth_plus_current() {
        let seq = Sequencer::seeded(1);
        assert_eq!(seq.preview().len(), PREVIEW_DEPTH);
        assert!(seq.peek().is_some());
    }

    #[test]
    fn next_returns_previous_front() {
        let mut seq = Sequencer::seeded(7);
        for _ in 0..30 {
            let front = seq.peek();
            let expected_preview = seq.preview();
            let got = seq.next();
            assert_eq!(Some(got), front);
            assert_eq!(seq.last(), Some(got));
            // Preview shifts left by one.
            assert_eq!(seq.peek(), expected_preview.first().copied());
            assert_eq!(seq.preview().len(), PREVIEW_DEPTH);
        }
    }

    #[test]
    fn first_seven_pieces_are_one_bag() {
        let mut seq = Sequencer::seeded(99);
        let kinds: HashSet<_> = (0..7).map(|_| seq.next()).collect();
        assert_eq!(kinds.len(), 7);
    }

    #[test]
    fn same_seed_same_sequence() {
        let mut a = Sequencer::seeded(42);
        let mut b = Sequencer::seeded(42);
        for _ in 0..50 {
            assert_eq!(a.next(), b.next());
        }
    }

    #[test]
    fn refill_is_noop_while_bag_has_pieces() {
        let mut seq = Sequencer::seeded(3);
        let before = seq.bag();
        assert!(!before.is_empty());
        seq.refill_if_empty(Some(PieceKind::I));
        assert_eq!(seq.bag(), before);
    }

    #[test]
    fn refill_avoids_opening_with_last() {
        for seed in 0..200 {
            let mut seq = Sequencer::seeded(seed);
            seq.bag.clear();
            seq.refill_if_empty(Some(PieceKind::T));
            assert_eq!(seq.bag().len(), 7);
            // Every bag holds each kind once, so one rotation always suffices.
            assert_ne!(seq.bag()[0], PieceKind::T);
        }
    }

    #[test]
    fn spent_bag_refills_with_every_kind() {
        let mut seq = Sequencer::seeded(5);
        seq.bag.clear();
        let first = seq.draw();
        let mut kinds: HashSet<_> = seq.bag().into_iter().collect();
        kinds.insert(first);
        assert_eq!(seq.bag().len(), 6);
        assert_eq!(kinds.len(), 7);
    }
}
