//! Bounded per-target round history
//!
//! A fixed arena of `capacity` slots plus a write cursor. Slots are only
//! empty until the buffer has wrapped once; after that every push overwrites
//! the oldest round in place, so memory stays bounded.

use crate::Round;

#[derive(Debug, Clone)]
pub struct History {
    slots: Box<[Option<Round>]>,

    /// Next slot to write
    cursor: usize,

    /// Number of occupied slots
    len: usize,
}

impl History {
    /// Creates an empty history. A capacity of zero is treated as one.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            cursor: 0,
            len: 0,
        }
    }

    /// Stores a round, returning the one it displaced once the buffer is full
    pub fn push(&mut self, round: Round) -> Option<Round> {
        let evicted = self.slots[self.cursor].replace(round);
        self.cursor = (self.cursor + 1) % self.slots.len();
        if evicted.is_none() {
            self.len += 1;
        }
        evicted
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Rounds from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &Round> {
        let (newer, older) = self.slots.split_at(self.cursor);
        older.iter().chain(newer.iter()).flatten()
    }

    pub fn latest(&self) -> Option<&Round> {
        let index = (self.cursor + self.slots.len() - 1) % self.slots.len();
        self.slots[index].as_ref()
    }
}
