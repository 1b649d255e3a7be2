//! Bounded, newest-first clip history
//!
//! Each room carries one of these. The cap keeps per-room memory bounded
//! regardless of traffic; duplicate suppression only compares against the
//! current head entry, not the whole log. Every committed mutation bumps a
//! revision counter so fanout consumers can discard stale snapshots.

use serde::{Deserialize, Serialize};

/// Maximum number of entries a room's history retains
pub const HISTORY_LIMIT: usize = 50;

/// Point-in-time copy of a room's history, tagged with the commit revision
/// it was taken at
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub revision: u64,
    /// Entries newest first
    pub entries: Vec<String>,
}

/// Ordered clip history, newest first, length capped at [`HISTORY_LIMIT`]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HistoryLog {
    entries: Vec<String>,
    revision: u64,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepends `text` unless it equals the current head entry.
    ///
    /// Returns `false` when the append was suppressed as a duplicate of the
    /// head; suppressed appends do not advance the revision. Once the log
    /// exceeds [`HISTORY_LIMIT`], the oldest entries are evicted.
    pub fn push(&mut self, text: String) -> bool {
        if self.entries.first().is_some_and(|head| *head == text) {
            return false;
        }
        self.entries.insert(0, text);
        self.entries.truncate(HISTORY_LIMIT);
        self.revision += 1;
        true
    }

    /// Empties the log; counts as a committed mutation
    pub fn clear(&mut self) {
        self.entries.clear();
        self.revision += 1;
    }

    /// Copies the entries (newest first) together with the current revision
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            revision: self.revision,
            entries: self.entries.clone(),
        }
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
