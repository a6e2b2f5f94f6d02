//! # Engine Operations
//!
//! The request/response surface the front end calls. Every operation takes
//! the caller's store by reference and hands back an updated copy, so a
//! failed operation leaves the caller's snapshot exactly as it was.
//!
//! ## Request Cycle
//!
//! ```text
//! pick_next ──► (caller plays the item) ──► report_completion ──► run_demotion
//!                                                     └──────────► append_history
//! ```
//!
//! Completion has to be recorded before the demotion pass so the pass sees
//! the incremented `play_count`.
//!
//! No operation locks anything. Callers that can overlap (several processes
//! on one snapshot) serialize at their boundary; see [`crate::lock`].

use crate::demotion::{self, Demotion};
use crate::error::{EngineError, Result};
use crate::history::{HistoryEntry, HistoryLog, DEFAULT_HISTORY_CAPACITY};
use crate::identity::IdentitySequence;
use crate::picker;
use crate::selector;
use crate::store::{is_practicable, Record, Store, TierNumber};
use crate::weighting::{self, WeightingStrategy};
use log::{debug, info, warn};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Tunables threaded through every selection call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Which weighting function turns tier counts into probabilities
    pub weighting: WeightingStrategy,
    /// How strongly higher tiers are favoured
    pub exp_base: f64,
    /// Maximum history length
    pub history_capacity: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weighting: WeightingStrategy::Linear,
            exp_base: 1.0,
            history_capacity: DEFAULT_HISTORY_CAPACITY,
        }
    }
}

impl EngineConfig {
    /// # Errors
    ///
    /// `InvalidConfig` for a bad `exp_base` or a zero history capacity.
    pub fn validate(&self) -> Result<()> {
        self.weighting.weighting(self.exp_base)?;
        if self.history_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "history_capacity must be positive".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of [`pick_next`]
#[derive(Debug, Clone, PartialEq)]
pub struct Pick {
    pub tier: TierNumber,
    pub identity: String,
    pub record: Record,
    /// The chosen tier's played flags were cleared; `store` must be flushed
    pub reset: bool,
    /// Store after the pick
    pub store: Store,
}

/// Result of [`register`]
#[derive(Debug, Clone, PartialEq)]
pub struct Registration {
    pub record: Record,
    pub tier: TierNumber,
    /// Counter value to persist
    pub counter: IdentitySequence,
    pub store: Store,
}

/// Selection probabilities for the current store under `config`.
///
/// # Errors
///
/// `InvalidConfig` or `EmptyStore`.
pub fn tier_probabilities(store: &Store, config: &EngineConfig) -> Result<BTreeMap<TierNumber, f64>> {
    weighting::calculate(&store.practicable_counts(), config.weighting, config.exp_base)
}

/// Decide which record to present next.
///
/// # Errors
///
/// - `EmptyStore` when no practicable tier holds anything
/// - `NoPlayableItems` when the drawn tier is empty after its reset
/// - `InconsistentStore` when the store fails validation
/// - `InvalidConfig` for a bad configuration
pub fn pick_next<R: Rng + ?Sized>(store: &Store, config: &EngineConfig, rng: &mut R) -> Result<Pick> {
    store.validate()?;
    let probabilities = tier_probabilities(store, config)?;
    let tier = selector::select_tier(&probabilities, rng)?;
    debug!("Selected tier {tier} with probability {:.4}", probabilities[&tier]);

    let mut next = store.clone();
    let picked = picker::pick_unplayed(&mut next, tier, rng)?;
    let record = next
        .find(&picked.identity)
        .map(|(_, record)| record.clone())
        .ok_or_else(|| EngineError::InconsistentStore(format!(
            "picked identity {} vanished from tier {tier}",
            picked.identity
        )))?;

    Ok(Pick {
        tier,
        identity: picked.identity,
        record,
        reset: picked.reset,
        store: next,
    })
}

/// Record one completed presentation of `identity`.
///
/// Sets `played` and increments `play_count` by exactly one.
///
/// # Errors
///
/// `UnknownRecord` if no record has this identity, `InconsistentStore` if
/// the store fails validation.
pub fn report_completion(store: &Store, identity: &str) -> Result<Store> {
    store.validate()?;
    let mut next = store.clone();

    let (tier, record) = next
        .find_mut(identity)
        .ok_or_else(|| EngineError::UnknownRecord(identity.to_string()))?;
    record.played = true;
    record.play_count = record.play_count.saturating_add(1);
    info!(
        "Completed '{}' in tier {tier} (play_count {})",
        record.title, record.play_count
    );

    Ok(next)
}

/// Run one demotion pass. See [`crate::demotion`] for the rule.
///
/// # Errors
///
/// `InconsistentStore` if the store fails validation.
pub fn run_demotion(store: &Store) -> Result<(Store, Vec<Demotion>)> {
    let mut next = store.clone();
    let demotions = demotion::demote_in_place(&mut next)?;
    Ok((next, demotions))
}

/// Tier new single registrations land in: the highest practicable tier, or
/// tier 1 when there is none.
#[must_use]
pub fn registration_tier(store: &Store) -> TierNumber {
    store.last_tier().max(1)
}

/// Register a new record titled `title`.
///
/// The identity is minted from the current `counter` value; the advanced
/// counter is returned for the caller to persist.
///
/// # Errors
///
/// `InvalidIdentityInput`, `DuplicateTitle`, or `InconsistentStore`.
pub fn register(store: &Store, counter: IdentitySequence, title: &str) -> Result<Registration> {
    let tier = registration_tier(store);
    register_into(store, counter, title, tier)
}

/// [`register`] into an explicit tier.
///
/// # Errors
///
/// As [`register`], plus `InvalidConfig` for the reserved tier.
pub fn register_into(
    store: &Store,
    counter: IdentitySequence,
    title: &str,
    tier: TierNumber,
) -> Result<Registration> {
    if !is_practicable(tier) {
        return Err(EngineError::InvalidConfig(format!(
            "cannot register into reserved tier {tier}"
        )));
    }
    store.validate()?;
    if store.contains_title(title) {
        return Err(EngineError::DuplicateTitle(title.to_string()));
    }

    let (identity, counter) = counter.mint(title)?;
    let record = Record::new(title, identity);
    let mut next = store.clone();
    next.insert(tier, record.clone())?;
    info!("Registered '{title}' in tier {tier} as {}", record.identity);

    Ok(Registration {
        record,
        tier,
        counter,
        store: next,
    })
}

/// Move a record to `tier`, keeping its played flag and count.
///
/// # Errors
///
/// `UnknownRecord`, `InconsistentStore`, or `InvalidConfig` for the reserved
/// tier.
pub fn move_record(store: &Store, identity: &str, tier: TierNumber) -> Result<Store> {
    if !is_practicable(tier) {
        return Err(EngineError::InvalidConfig(format!(
            "cannot move records into reserved tier {tier}"
        )));
    }
    store.validate()?;
    let mut next = store.clone();

    let (from, record) = next
        .take(identity)
        .ok_or_else(|| EngineError::UnknownRecord(identity.to_string()))?;
    info!("Moved '{}' from tier {from} to tier {tier}", record.title);
    next.ensure_tier(tier).push(record);
    Ok(next)
}

/// Append `identity` to a copy of `log`, bounded by `capacity`.
#[must_use]
pub fn append_history(log: &HistoryLog, identity: &str, capacity: usize) -> HistoryLog {
    let mut next = HistoryLog::from_entries(log.iter().map(str::to_string), capacity);
    next.append(identity);
    next
}

/// Resolve `log` against `store`; unknown identities are left out.
#[must_use]
pub fn resolve_history(log: &HistoryLog, store: &Store) -> Vec<HistoryEntry> {
    let resolved = log.resolve(store);
    if resolved.len() < log.len() {
        warn!(
            "{} history entries no longer match a record",
            log.len() - resolved.len()
        );
    }
    resolved
}
