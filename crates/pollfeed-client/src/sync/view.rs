//! Bounded local view of the log.
//!
//! The merge is a pure function of the view and an incoming batch. It is
//! idempotent and order-insensitive per message: entries are deduplicated by
//! id, kept sorted by id, and the cursor only moves forward.

use pollfeed_core::Message;
use std::collections::{HashSet, VecDeque};

/// What a single merge changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeOutcome {
    /// Newly inserted messages still present after eviction, ascending by id.
    pub added: Vec<Message>,
    /// Incoming messages skipped because their id was already observed.
    pub duplicates: usize,
    /// Ids evicted from the front to respect capacity.
    pub evicted: Vec<u64>,
}

impl MergeOutcome {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.evicted.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LocalView {
    entries: VecDeque<Message>,
    observed: HashSet<u64>,
    cursor: u64,
    capacity: usize,
}

impl LocalView {
    /// Create an empty view holding at most `capacity` messages (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity.min(4096)),
            observed: HashSet::new(),
            cursor: 0,
            capacity,
        }
    }

    /// Merge a batch into the view.
    pub fn merge<I>(&mut self, batch: I) -> MergeOutcome
    where
        I: IntoIterator<Item = Message>,
    {
        let mut outcome = MergeOutcome::default();

        for msg in batch {
            if !self.observed.insert(msg.id) {
                outcome.duplicates += 1;
                continue;
            }
            self.cursor = self.cursor.max(msg.id);
            outcome.added.push(msg.clone());
            self.insert_sorted(msg);
        }

        outcome.evicted = self.evict_overflow();
        if !outcome.evicted.is_empty() {
            outcome.added.retain(|m| self.observed.contains(&m.id));
        }
        outcome.added.sort_by_key(|m| m.id);
        outcome
    }

    /// Discard all state (view, membership set, cursor) and merge `batch`.
    pub fn replace<I>(&mut self, batch: I) -> MergeOutcome
    where
        I: IntoIterator<Item = Message>,
    {
        self.clear();
        self.merge(batch)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.observed.clear();
        self.cursor = 0;
    }

    fn insert_sorted(&mut self, msg: Message) {
        match self.entries.back() {
            Some(last) if last.id > msg.id => {
                let pos = self.entries.partition_point(|m| m.id < msg.id);
                self.entries.insert(pos, msg);
            }
            _ => self.entries.push_back(msg),
        }
    }

    fn evict_overflow(&mut self) -> Vec<u64> {
        let mut evicted = Vec::new();
        while self.entries.len() > self.capacity {
            if let Some(old) = self.entries.pop_front() {
                self.observed.remove(&old.id);
                evicted.push(old.id);
            }
        }
        evicted
    }

    /// Highest id ever merged since the last clear. Never decreases otherwise.
    pub fn cursor(&self) -> u64 {
        self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, id: u64) -> bool {
        self.observed.contains(&id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.entries.iter()
    }

    pub fn ids(&self) -> Vec<u64> {
        self.entries.iter().map(|m| m.id).collect()
    }
}
