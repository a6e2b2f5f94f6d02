//! # Demotion Engine
//!
//! A record whose `play_count` has reached its tier number has been drilled
//! enough at that level and moves one tier down, where its count starts over
//! at 1. Tier 1 is the floor: records there are never moved and their count
//! is left as is. The reserved tier is not scanned.
//!
//! Relocation copies the record into the lower tier and removes the original,
//! so each record stays owned by exactly one tier.

use crate::error::Result;
use crate::store::{is_practicable, Store, TierNumber};
use log::{debug, info};

/// One relocation performed by a demotion pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demotion {
    pub identity: String,
    pub title: String,
    pub from: TierNumber,
    pub to: TierNumber,
}

/// Target tier for a record that reached the threshold in `tier`.
#[must_use]
pub const fn demoted_tier(tier: TierNumber) -> TierNumber {
    if tier > 1 {
        tier - 1
    } else {
        tier
    }
}

/// Run one demotion pass over `store` in place.
///
/// Tiers are scanned in ascending order. Within a tier the candidates are
/// collected from a snapshot taken before any removal, so relocations never
/// disturb the scan.
///
/// # Errors
///
/// `InconsistentStore` if the store fails validation; the store is not
/// touched in that case.
pub fn demote_in_place(store: &mut Store) -> Result<Vec<Demotion>> {
    store.validate()?;

    let tiers: Vec<TierNumber> = store
        .tier_numbers()
        .filter(|tier| is_practicable(*tier))
        .collect();
    let mut demotions = Vec::new();

    for tier in tiers {
        let target = demoted_tier(tier);
        if target == tier {
            continue;
        }

        let snapshot: Vec<(String, String)> = store
            .tier(tier)
            .unwrap_or_default()
            .iter()
            .filter(|record| record.play_count >= tier)
            .map(|record| (record.identity.clone(), record.title.clone()))
            .collect();

        for (identity, title) in snapshot {
            let Some(records) = store.tier_mut(tier) else {
                break;
            };
            let Some(index) = records.iter().position(|r| r.identity == identity) else {
                continue;
            };

            let mut moved = records.remove(index);
            moved.play_count = 1;
            store.ensure_tier(target).push(moved);

            info!("Demoted '{title}' from tier {tier} to tier {target}");
            demotions.push(Demotion {
                identity,
                title,
                from: tier,
                to: target,
            });
        }
    }

    debug!("Demotion pass relocated {} records", demotions.len());
    Ok(demotions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use crate::store::Record;

    fn counted(title: &str, play_count: u32) -> Record {
        Record {
            play_count,
            ..Record::new(title, format!("id-{title}"))
        }
    }

    #[test]
    fn test_tier_three_item_moves_to_tier_two() {
        let mut store = Store::new();
        store.add_tier(2);
        store.insert(3, counted("a", 3)).unwrap();
        store.insert(3, counted("b", 2)).unwrap();

        let demotions = demote_in_place(&mut store).unwrap();

        assert_eq!(
            demotions,
            vec![Demotion {
                identity: "id-a".into(),
                title: "a".into(),
                from: 3,
                to: 2,
            }]
        );
        let (tier, record) = store.find("id-a").unwrap();
        assert_eq!(tier, 2);
        assert_eq!(record.play_count, 1);
        assert_eq!(store.tier(3).unwrap().len(), 1);
        assert_eq!(store.find("id-b").unwrap().0, 3);
    }

    #[test]
    fn test_tier_one_never_demotes_nor_resets() {
        let mut store = Store::new();
        store.insert(1, counted("floor", 5)).unwrap();

        let demotions = demote_in_place(&mut store).unwrap();

        assert!(demotions.is_empty());
        let (tier, record) = store.find("id-floor").unwrap();
        assert_eq!(tier, 1);
        assert_eq!(record.play_count, 5);
    }

    #[test]
    fn test_played_flag_travels_with_record() {
        let mut store = Store::new();
        let mut record = counted("a", 4);
        record.played = true;
        store.insert(4, record).unwrap();

        demote_in_place(&mut store).unwrap();

        let (tier, record) = store.find("id-a").unwrap();
        assert_eq!(tier, 3);
        assert!(record.played);
    }

    #[test]
    fn test_missing_target_tier_is_created() {
        let mut store = Store::new();
        store.insert(5, counted("a", 9)).unwrap();

        demote_in_place(&mut store).unwrap();
        assert_eq!(store.find("id-a").unwrap().0, 4);
    }

    #[test]
    fn test_several_items_removed_from_same_tier() {
        let mut store = Store::new();
        for (title, count) in [("a", 2), ("b", 2), ("c", 0), ("d", 7)] {
            store.insert(2, counted(title, count)).unwrap();
        }

        let demotions = demote_in_place(&mut store).unwrap();

        assert_eq!(demotions.len(), 3);
        let tier2: Vec<&str> = store.tier(2).unwrap().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(tier2, vec!["c"]);
        let tier1: Vec<&str> = store.tier(1).unwrap().iter().map(|r| r.title.as_str()).collect();
        assert_eq!(tier1, vec!["a", "b", "d"]);
    }

    #[test]
    fn test_second_pass_changes_nothing() {
        let mut store = Store::new();
        store.insert(1, counted("a", 3)).unwrap();
        store.insert(2, counted("b", 2)).unwrap();
        store.insert(3, counted("c", 5)).unwrap();
        store.insert(4, counted("d", 1)).unwrap();

        demote_in_place(&mut store).unwrap();
        let after_first = store.clone();

        let second = demote_in_place(&mut store).unwrap();
        assert!(second.is_empty());
        assert_eq!(store, after_first);
    }

    #[test]
    fn test_reserved_tier_not_scanned() {
        let mut store = Store::new();
        store.insert(0, counted("fresh", 10)).unwrap();

        assert!(demote_in_place(&mut store).unwrap().is_empty());
        assert_eq!(store.find("id-fresh").unwrap().0, 0);
    }

    #[test]
    fn test_inconsistent_store_untouched() {
        // Loaded without validation, as a hand-edited snapshot would be
        let json = r#"{
            "2": [{"title": "a", "played": false, "play_count": 5, "record_hash": "id-a"}],
            "3": [{"title": "b", "played": false, "play_count": 0, "record_hash": "id-a"}]
        }"#;
        let mut store: Store = serde_json::from_str(json).unwrap();
        let before = store.clone();

        assert!(matches!(
            demote_in_place(&mut store),
            Err(EngineError::InconsistentStore(_))
        ));
        assert_eq!(store, before);
    }

    #[test]
    fn test_demoted_tier_floor() {
        assert_eq!(demoted_tier(1), 1);
        assert_eq!(demoted_tier(2), 1);
        assert_eq!(demoted_tier(10), 9);
    }
}
