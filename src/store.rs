//! # Record Store
//!
//! In-memory form of the tiered record collection. The store owns structure
//! and invariants only; selection, completion and demotion rules live in
//! their own modules and operate on a `Store` value.
//!
//! ## Snapshot Shape
//!
//! On disk the store is a JSON object keyed by tier number, each tier an
//! array of records:
//!
//! ```json
//! {
//!   "0": [],
//!   "1": [{ "title": "arpeggio_a", "played": false, "play_count": 0, "record_hash": "9f1c…" }],
//!   "2": []
//! }
//! ```
//!
//! Tier keys are parsed into integers on load. Tier `0` is reserved for
//! ingested-but-not-graduated records and never takes part in selection or
//! demotion.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// Tier number. Lower numbers are the better-known material.
pub type TierNumber = u32;

/// The reserved, non-practicable tier.
pub const RESERVED_TIER: TierNumber = 0;

/// Whether `tier` may be selected from and demoted within.
#[must_use]
pub const fn is_practicable(tier: TierNumber) -> bool {
    tier != RESERVED_TIER
}

/// One practicable item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Display name, unique across the store
    pub title: String,
    /// Presented since the tier's last reset
    #[serde(default)]
    pub played: bool,
    /// Completed presentations since the record last changed tier
    #[serde(default)]
    pub play_count: u32,
    /// Immutable identity, stored under its historical key
    #[serde(rename = "record_hash")]
    pub identity: String,
}

impl Record {
    /// A fresh, never-played record.
    #[must_use]
    pub fn new(title: impl Into<String>, identity: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            played: false,
            play_count: 0,
            identity: identity.into(),
        }
    }
}

/// Per-tier numbers shown by `status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TierSummary {
    pub tier: TierNumber,
    pub count: usize,
    pub unplayed: usize,
}

/// The full tiered collection.
///
/// Tiers iterate in ascending number and records keep insertion order, so a
/// seeded RNG gives reproducible picks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Store {
    tiers: BTreeMap<TierNumber, Vec<Record>>,
}

impl Store {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from raw tiers, rejecting any invariant violation.
    pub fn from_tiers(tiers: BTreeMap<TierNumber, Vec<Record>>) -> Result<Self> {
        let store = Self { tiers };
        store.validate()?;
        Ok(store)
    }

    /// Check that identities and titles are unique across all tiers.
    ///
    /// # Errors
    ///
    /// `InconsistentStore` naming the first duplicate and the tier it was
    /// found in.
    pub fn validate(&self) -> Result<()> {
        let mut identities = HashSet::new();
        let mut titles = HashSet::new();

        for (tier, record) in self.records() {
            if !identities.insert(record.identity.as_str()) {
                return Err(EngineError::InconsistentStore(format!(
                    "duplicate identity {} in tier {tier}",
                    record.identity
                )));
            }
            if !titles.insert(record.title.as_str()) {
                return Err(EngineError::InconsistentStore(format!(
                    "duplicate title '{}' in tier {tier}",
                    record.title
                )));
            }
        }
        Ok(())
    }

    /// Tier numbers present in the store, ascending. Includes the reserved tier.
    pub fn tier_numbers(&self) -> impl Iterator<Item = TierNumber> + '_ {
        self.tiers.keys().copied()
    }

    /// All tiers with their records, ascending.
    pub fn tiers(&self) -> impl Iterator<Item = (TierNumber, &[Record])> {
        self.tiers.iter().map(|(tier, records)| (*tier, records.as_slice()))
    }

    /// Every record with the tier holding it.
    pub fn records(&self) -> impl Iterator<Item = (TierNumber, &Record)> {
        self.tiers
            .iter()
            .flat_map(|(tier, records)| records.iter().map(move |record| (*tier, record)))
    }

    #[must_use]
    pub fn tier(&self, tier: TierNumber) -> Option<&[Record]> {
        self.tiers.get(&tier).map(Vec::as_slice)
    }

    pub(crate) fn tier_mut(&mut self, tier: TierNumber) -> Option<&mut Vec<Record>> {
        self.tiers.get_mut(&tier)
    }

    /// Get a tier's records, creating the tier when it does not exist yet.
    pub(crate) fn ensure_tier(&mut self, tier: TierNumber) -> &mut Vec<Record> {
        self.tiers.entry(tier).or_default()
    }

    /// Create an empty tier if it is missing.
    pub fn add_tier(&mut self, tier: TierNumber) {
        self.ensure_tier(tier);
    }

    /// Insert a record into `tier`, keeping identity and title unique.
    ///
    /// # Errors
    ///
    /// `InconsistentStore` when the identity already exists,
    /// `DuplicateTitle` when the title does.
    pub fn insert(&mut self, tier: TierNumber, record: Record) -> Result<()> {
        if let Some((existing, _)) = self.find(&record.identity) {
            return Err(EngineError::InconsistentStore(format!(
                "identity {} already present in tier {existing}",
                record.identity
            )));
        }
        if self.contains_title(&record.title) {
            return Err(EngineError::DuplicateTitle(record.title));
        }
        self.ensure_tier(tier).push(record);
        Ok(())
    }

    /// Find a record and its tier by identity.
    #[must_use]
    pub fn find(&self, identity: &str) -> Option<(TierNumber, &Record)> {
        self.records().find(|(_, record)| record.identity == identity)
    }

    pub(crate) fn find_mut(&mut self, identity: &str) -> Option<(TierNumber, &mut Record)> {
        self.tiers.iter_mut().find_map(|(tier, records)| {
            records
                .iter_mut()
                .find(|record| record.identity == identity)
                .map(|record| (*tier, record))
        })
    }

    /// Remove a record from whichever tier holds it.
    pub(crate) fn take(&mut self, identity: &str) -> Option<(TierNumber, Record)> {
        self.tiers.iter_mut().find_map(|(tier, records)| {
            records
                .iter()
                .position(|record| record.identity == identity)
                .map(|index| (*tier, records.remove(index)))
        })
    }

    #[must_use]
    pub fn contains_title(&self, title: &str) -> bool {
        self.records().any(|(_, record)| record.title == title)
    }

    /// Highest tier number present, `0` for an empty store.
    #[must_use]
    pub fn last_tier(&self) -> TierNumber {
        self.tiers.keys().next_back().copied().unwrap_or(RESERVED_TIER)
    }

    /// Item count per practicable tier. Empty tiers are kept with count 0.
    #[must_use]
    pub fn practicable_counts(&self) -> BTreeMap<TierNumber, usize> {
        self.tiers
            .iter()
            .filter(|(tier, _)| is_practicable(**tier))
            .map(|(tier, records)| (*tier, records.len()))
            .collect()
    }

    #[must_use]
    pub fn tier_summary(&self) -> Vec<TierSummary> {
        self.tiers
            .iter()
            .map(|(tier, records)| TierSummary {
                tier: *tier,
                count: records.len(),
                unplayed: records.iter().filter(|record| !record.played).count(),
            })
            .collect()
    }

    /// Total number of records, reserved tier included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tiers.values().map(Vec::len).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
