//! Batch intake of new recordings.
//!
//! New recordings arrive as `.wav` files in a folder. Their file stems become
//! titles; a batch is checked against the store and then registered together
//! into a fresh tier one above the current highest.

use crate::error::{EngineError, Result};
use crate::identity::IdentitySequence;
use crate::store::{Record, Store, TierNumber};
use anyhow::Context;
use log::{debug, info};
use std::path::Path;

/// Characters that cannot appear in a title (they break file URLs).
pub const INVALID_TITLE_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Classification of a batch of candidate titles
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CandidateCheck {
    pub valid: Vec<String>,
    pub invalid: Vec<String>,
    pub duplicate: Vec<String>,
    /// Highest tier currently in the store
    pub last_tier: TierNumber,
}

impl CandidateCheck {
    /// Tier a registration of `valid` would create, `None` when the highest
    /// tier is already `TierNumber::MAX`.
    #[must_use]
    pub const fn target_tier(&self) -> Option<TierNumber> {
        self.last_tier.checked_add(1)
    }
}

/// Result of [`register_batch`]
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRegistration {
    pub tier: TierNumber,
    pub records: Vec<Record>,
    pub counter: IdentitySequence,
    pub store: Store,
}

#[must_use]
pub fn is_valid_title(title: &str) -> bool {
    !title.trim().is_empty() && !title.contains(INVALID_TITLE_CHARS)
}

/// Sort candidates into valid, invalid and already-registered titles.
///
/// A duplicate is reported as such even when it also has invalid characters.
#[must_use]
pub fn check_candidates<S: AsRef<str>>(store: &Store, candidates: &[S]) -> CandidateCheck {
    let mut check = CandidateCheck {
        last_tier: store.last_tier(),
        ..CandidateCheck::default()
    };

    for candidate in candidates {
        let title = candidate.as_ref().to_string();
        if store.contains_title(&title) {
            check.duplicate.push(title);
        } else if is_valid_title(&title) {
            check.valid.push(title);
        } else {
            check.invalid.push(title);
        }
    }

    debug!(
        "Candidate check: {} valid, {} invalid, {} duplicate",
        check.valid.len(),
        check.invalid.len(),
        check.duplicate.len()
    );
    check
}

/// Titles of the `.wav` files directly inside `dir`, sorted by name.
///
/// # Errors
///
/// Returns an error if the folder cannot be read.
pub fn scan_folder(dir: &Path) -> anyhow::Result<Vec<String>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read intake folder {}", dir.display()))?;

    let mut titles = Vec::new();
    for entry in entries {
        let path = entry
            .with_context(|| format!("Failed to list intake folder {}", dir.display()))?
            .path();
        let is_wav = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("wav"));
        if !is_wav || !path.is_file() {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
            titles.push(stem.to_string());
        }
    }

    titles.sort();
    Ok(titles)
}

/// Register `titles` together into a new tier above the current highest.
///
/// Identities are minted in order, one counter step per title. Nothing is
/// registered unless every title is accepted.
///
/// # Errors
///
/// `DuplicateTitle` for a title already in the store or repeated in the
/// batch, `InvalidIdentityInput` for an unusable title, `InconsistentStore`
/// if the store fails validation.
pub fn register_batch<S: AsRef<str>>(
    store: &Store,
    counter: IdentitySequence,
    titles: &[S],
) -> Result<BatchRegistration> {
    store.validate()?;
    let tier = store.last_tier().checked_add(1).ok_or_else(|| {
        EngineError::InvalidConfig(format!(
            "no tier above {} left for a new batch",
            store.last_tier()
        ))
    })?;
    let mut next = store.clone();
    next.add_tier(tier);

    let mut counter = counter;
    let mut records = Vec::with_capacity(titles.len());
    for title in titles {
        let title = title.as_ref();
        if !is_valid_title(title) {
            return Err(EngineError::InvalidIdentityInput(format!(
                "title '{title}' is empty or contains one of {INVALID_TITLE_CHARS:?}"
            )));
        }
        let (identity, advanced) = counter.mint(title)?;
        let record = Record::new(title, identity);
        next.insert(tier, record.clone())?;
        records.push(record);
        counter = advanced;
    }

    info!("Registered {} new records into tier {tier}", records.len());
    Ok(BatchRegistration {
        tier,
        records,
        counter,
        store: next,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::mint_identity;
    use std::fs;
    use tempfile::TempDir;

    fn existing_store() -> Store {
        let mut store = Store::new();
        store.add_tier(0);
        store.insert(1, Record::new("old_take", "id-old")).unwrap();
        store.add_tier(2);
        store
    }

    #[test]
    fn test_check_classifies_candidates() {
        let store = existing_store();
        let check = check_candidates(&store, &["fresh_take", "bad:name", "old_take", "what?"]);

        assert_eq!(check.valid, vec!["fresh_take"]);
        assert_eq!(check.invalid, vec!["bad:name", "what?"]);
        assert_eq!(check.duplicate, vec!["old_take"]);
        assert_eq!(check.last_tier, 2);
        assert_eq!(check.target_tier(), Some(3));
    }

    #[test]
    fn test_batch_goes_into_new_tier_with_sequential_identities() {
        let store = existing_store();
        let counter = IdentitySequence::new(10).unwrap();

        let batch = register_batch(&store, counter, &["a", "b", "c"]).unwrap();

        assert_eq!(batch.tier, 3);
        assert_eq!(batch.counter.value(), 13);
        assert_eq!(batch.records[0].identity, mint_identity("a", 10).unwrap());
        assert_eq!(batch.records[2].identity, mint_identity("c", 12).unwrap());
        assert_eq!(batch.store.tier(3).unwrap().len(), 3);
        assert!(batch.records.iter().all(|r| !r.played && r.play_count == 0));
    }

    #[test]
    fn test_batch_is_atomic() {
        let store = existing_store();
        let counter = IdentitySequence::default();

        assert_eq!(
            register_batch(&store, counter, &["a", "old_take"]).map(|b| b.tier),
            Err(EngineError::DuplicateTitle("old_take".into()))
        );
        assert_eq!(
            register_batch(&store, counter, &["a", "a"]).map(|b| b.tier),
            Err(EngineError::DuplicateTitle("a".into()))
        );
        assert!(matches!(
            register_batch(&store, counter, &["a", "no|pipe"]),
            Err(EngineError::InvalidIdentityInput(_))
        ));
        assert_eq!(store.last_tier(), 2);
    }

    #[test]
    fn test_batch_refused_when_highest_tier_is_max() {
        let mut store = Store::new();
        store.insert(TierNumber::MAX, Record::new("top", "id-top")).unwrap();

        let check = check_candidates(&store, &["fresh"]);
        assert_eq!(check.last_tier, TierNumber::MAX);
        assert_eq!(check.target_tier(), None);

        assert!(matches!(
            register_batch(&store, IdentitySequence::default(), &["fresh"]),
            Err(EngineError::InvalidConfig(_))
        ));
        assert!(store.tier(0).is_none());
    }

    #[test]
    fn test_empty_store_batch_starts_at_tier_one() {
        let batch = register_batch(&Store::new(), IdentitySequence::default(), &["x"]).unwrap();
        assert_eq!(batch.tier, 1);
    }

    #[test]
    fn test_scan_folder_lists_wav_stems() -> anyhow::Result<()> {
        let dir = TempDir::new()?;
        fs::write(dir.path().join("b_take.wav"), b"")?;
        fs::write(dir.path().join("a_take.WAV"), b"")?;
        fs::write(dir.path().join("notes.txt"), b"")?;
        fs::create_dir(dir.path().join("nested.wav"))?;

        assert_eq!(scan_folder(dir.path())?, vec!["a_take", "b_take"]);
        Ok(())
    }

    #[test]
    fn test_scan_missing_folder_errors() {
        let dir = TempDir::new().unwrap();
        assert!(scan_folder(&dir.path().join("absent")).is_err());
    }
}
