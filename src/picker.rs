//! Unplayed-first item picker.
//!
//! Within a tier every record is presented once before any repeats. When a
//! tier runs out of unplayed records its `played` flags are cleared once and
//! the pick is retried; a tier that is still empty after that is reported as
//! `NoPlayableItems` instead of being retried again.

use crate::error::{EngineError, Result};
use crate::store::{is_practicable, Record, Store, TierNumber};
use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;

/// Outcome of a pick inside one tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PickedItem {
    pub identity: String,
    /// Whether the tier's played flags were cleared to make this pick
    pub reset: bool,
}

/// Pick an unplayed record from `tier`, uniformly at random.
///
/// Mutates `store` only when a reset is needed; `reset` in the result tells
/// the caller the snapshot changed.
///
/// # Errors
///
/// - `InvalidConfig` if `tier` is the reserved tier
/// - `NoPlayableItems` if the tier is missing or empty after the reset
pub fn pick_unplayed<R: Rng + ?Sized>(
    store: &mut Store,
    tier: TierNumber,
    rng: &mut R,
) -> Result<PickedItem> {
    if !is_practicable(tier) {
        return Err(EngineError::InvalidConfig(format!(
            "tier {tier} is reserved and cannot be picked from"
        )));
    }

    let records = store.tier(tier).unwrap_or_default();
    if let Some(identity) = choose_unplayed(records, rng) {
        debug!("Picked {identity} from tier {tier}");
        return Ok(PickedItem { identity, reset: false });
    }

    let cleared = reset_tier(store, tier);
    info!("No unplayed items in tier {tier}, reset {cleared} played flags");

    let records = store.tier(tier).unwrap_or_default();
    choose_unplayed(records, rng)
        .map(|identity| {
            debug!("Picked {identity} from tier {tier} after reset");
            PickedItem { identity, reset: true }
        })
        .ok_or(EngineError::NoPlayableItems { tier })
}

/// Clear every `played` flag in `tier`. Returns the number of records touched.
pub fn reset_tier(store: &mut Store, tier: TierNumber) -> usize {
    store.tier_mut(tier).map_or(0, |records| {
        records.iter_mut().for_each(|record| record.played = false);
        records.len()
    })
}

fn choose_unplayed<R: Rng + ?Sized>(records: &[Record], rng: &mut R) -> Option<String> {
    let unplayed: Vec<&Record> = records.iter().filter(|record| !record.played).collect();
    unplayed.choose(rng).map(|record| record.identity.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    fn record(title: &str, played: bool) -> Record {
        Record {
            played,
            ..Record::new(title, format!("id-{title}"))
        }
    }

    fn store_with(tier: TierNumber, records: Vec<Record>) -> Store {
        let mut store = Store::new();
        for record in records {
            store.insert(tier, record).unwrap();
        }
        store
    }

    #[test]
    fn test_only_unplayed_are_picked() {
        let mut store = store_with(
            2,
            vec![record("a", true), record("b", false), record("c", true)],
        );
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..200 {
            let picked = pick_unplayed(&mut store, 2, &mut rng).unwrap();
            assert_eq!(picked.identity, "id-b");
            assert!(!picked.reset);
        }
    }

    #[test]
    fn test_uniform_over_unplayed() {
        let mut store = store_with(
            1,
            vec![record("a", false), record("b", false), record("c", false)],
        );
        let mut rng = StdRng::seed_from_u64(99);

        let seen: HashSet<String> = (0..300)
            .map(|_| pick_unplayed(&mut store, 1, &mut rng).unwrap().identity)
            .collect();
        assert_eq!(seen.len(), 3);
    }

    #[test]
    fn test_exhausted_tier_resets_once() {
        let mut store = store_with(3, vec![record("a", true), record("b", true)]);
        let mut rng = StdRng::seed_from_u64(5);

        let picked = pick_unplayed(&mut store, 3, &mut rng).unwrap();
        assert!(picked.reset);
        assert!(store.tier(3).unwrap().iter().all(|r| !r.played));
    }

    #[test]
    fn test_empty_tier_is_no_playable_items() {
        let mut store = Store::new();
        store.add_tier(4);
        let mut rng = StdRng::seed_from_u64(5);

        assert_eq!(
            pick_unplayed(&mut store, 4, &mut rng),
            Err(EngineError::NoPlayableItems { tier: 4 })
        );
        assert_eq!(
            pick_unplayed(&mut store, 9, &mut rng),
            Err(EngineError::NoPlayableItems { tier: 9 })
        );
    }

    #[test]
    fn test_reserved_tier_rejected() {
        let mut store = store_with(0, vec![record("a", false)]);
        let mut rng = StdRng::seed_from_u64(5);
        assert!(matches!(
            pick_unplayed(&mut store, 0, &mut rng),
            Err(EngineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_reset_only_touches_its_tier() {
        let mut store = store_with(1, vec![record("a", true)]);
        store.insert(2, record("b", true)).unwrap();

        assert_eq!(reset_tier(&mut store, 1), 1);
        assert!(!store.tier(1).unwrap()[0].played);
        assert!(store.tier(2).unwrap()[0].played);
        assert_eq!(reset_tier(&mut store, 7), 0);
    }
}
