//! Selection history for going back to previously selected items
//!
//! Entries are kept most-recent-first. Pushing an id that is already in the
//! history moves it to the front instead of adding a second copy.

use crate::model::ItemId;

/// Default number of entries kept
pub const DEFAULT_MAX_HISTORY: usize = 50;

/// Bounded, deduplicated, most-recent-first list of item ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionHistory {
    /// Entries, most recent first
    entries: Vec<ItemId>,

    /// Maximum number of entries to keep
    max_entries: usize,
}

impl SelectionHistory {
    /// Create a new history with the default max entries (50)
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_HISTORY)
    }

    /// Create a new history with specified max entries
    pub fn with_capacity(max_entries: usize) -> Self {
        Self {
            entries: Vec::new(),
            max_entries,
        }
    }

    /// Record an id as the most recent entry
    pub fn push(&mut self, id: ItemId) {
        self.entries.retain(|&e| e != id);
        self.entries.insert(0, id);
        self.entries.truncate(self.max_entries);
    }

    /// Entry at `index` (0 is the most recent)
    pub fn get(&self, index: usize) -> Option<ItemId> {
        self.entries.get(index).copied()
    }

    pub fn most_recent(&self) -> Option<ItemId> {
        self.get(0)
    }

    /// All entries, most recent first
    pub fn entries(&self) -> &[ItemId] {
        &self.entries
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Change the cap, dropping the oldest entries if needed
    pub fn set_max_entries(&mut self, max_entries: usize) {
        self.max_entries = max_entries;
        self.entries.truncate(max_entries);
    }

    /// Clear all history
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Get the number of entries in history
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if history is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SelectionHistory {
    fn default() -> Self {
        Self::new()
    }
}
