//! Bounded playback history.
//!
//! The log keeps identities only and is independent of the store. Resolving
//! it against a store is best effort: identities whose record is gone are
//! skipped.

use crate::store::{Store, TierNumber};
use serde::Serialize;
use std::collections::VecDeque;

/// Default number of entries kept.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

/// FIFO log of recently presented identities, oldest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryLog {
    entries: VecDeque<String>,
    capacity: usize,
}

impl Default for HistoryLog {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

/// A history entry resolved against the store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HistoryEntry {
    pub identity: String,
    pub tier: TierNumber,
    pub title: String,
    pub played: bool,
    pub play_count: u32,
}

impl HistoryLog {
    /// An empty log. A zero capacity is raised to 1.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Rebuild a log from stored identities, keeping only the newest
    /// `capacity` of them.
    #[must_use]
    pub fn from_entries<I>(entries: I, capacity: usize) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut log = Self::with_capacity(capacity);
        entries.into_iter().for_each(|identity| log.append(identity));
        log
    }

    /// Parse the on-disk form: one identity per line, blank lines ignored.
    #[must_use]
    pub fn parse(text: &str, capacity: usize) -> Self {
        Self::from_entries(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string),
            capacity,
        )
    }

    /// Render the on-disk form.
    #[must_use]
    pub fn render(&self) -> String {
        self.entries.iter().map(String::as_str).collect::<Vec<_>>().join("\n")
    }

    /// Add `identity` at the end, evicting the oldest entries over capacity.
    pub fn append(&mut self, identity: impl Into<String>) {
        self.entries.push_back(identity.into());
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Look every identity up in `store`, oldest first.
    #[must_use]
    pub fn resolve(&self, store: &Store) -> Vec<HistoryEntry> {
        self.entries
            .iter()
            .filter_map(|identity| {
                let resolved = store.find(identity);
                if resolved.is_none() {
                    log::debug!("History entry {identity} has no record, skipping");
                }
                resolved
            })
            .map(|(tier, record)| HistoryEntry {
                identity: record.identity.clone(),
                tier,
                title: record.title.clone(),
                played: record.played,
                play_count: record.play_count,
            })
            .collect()
    }
}
