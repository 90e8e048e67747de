use std::collections::VecDeque;

use crate::swap::undo::UndoHistoryEntry;

/// Most swaps the caller can undo.
pub const MAX_UNDO_HISTORY: usize = 10;

/// Bounded stack of completed swaps, newest last.
///
/// Pushing past capacity evicts the oldest entry.
#[derive(Clone, Debug)]
pub struct UndoHistory {
    entries: VecDeque<UndoHistoryEntry>,
    capacity: usize,
}

impl Default for UndoHistory {
    fn default() -> Self {
        Self::with_capacity(MAX_UNDO_HISTORY)
    }
}

impl UndoHistory {
    /// History holding at most `capacity` entries (at least one).
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Record a swap, evicting the oldest entry when full.
    pub fn push(&mut self, entry: UndoHistoryEntry) {
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        tracing::debug!(len = self.entries.len(), "undo history updated");
    }

    /// Newest entry.
    pub fn latest(&self) -> Option<&UndoHistoryEntry> {
        self.entries.back()
    }

    /// Remove and return the newest entry.
    pub fn pop(&mut self) -> Option<UndoHistoryEntry> {
        self.entries.pop_back()
    }

    /// Forget every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` when there is nothing to undo.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries oldest first.
    pub fn iter(&self) -> impl Iterator<Item = &UndoHistoryEntry> {
        self.entries.iter()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/swap/history.rs"]
mod tests;
