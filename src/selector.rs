//! Tier selection by cumulative probability walk.

use crate::error::{EngineError, Result};
use crate::store::TierNumber;
use rand::Rng;
use std::collections::BTreeMap;

/// Draw one tier from `probabilities` using `rng`.
///
/// # Errors
///
/// `EmptyStore` when no tier has a positive probability.
pub fn select_tier<R: Rng + ?Sized>(
    probabilities: &BTreeMap<TierNumber, f64>,
    rng: &mut R,
) -> Result<TierNumber> {
    let sample: f64 = rng.gen();
    select_tier_with_sample(probabilities, sample)
}

/// Walk tiers in ascending order and return the first whose cumulative
/// probability exceeds `sample`.
///
/// When rounding leaves the cumulative sum just under `sample`, the first
/// tier with a positive probability is returned. Zero-probability tiers are
/// never returned.
///
/// # Errors
///
/// `EmptyStore` when no tier has a positive probability.
pub fn select_tier_with_sample(
    probabilities: &BTreeMap<TierNumber, f64>,
    sample: f64,
) -> Result<TierNumber> {
    let fallback = probabilities
        .iter()
        .find(|(_, p)| **p > 0.0)
        .map(|(tier, _)| *tier)
        .ok_or(EngineError::EmptyStore)?;

    let mut cumulative = 0.0;
    for (tier, probability) in probabilities {
        cumulative += probability;
        if sample < cumulative {
            log::trace!("Sample {sample:.6} landed in tier {tier} (cumulative {cumulative:.6})");
            return Ok(*tier);
        }
    }

    log::debug!("Sample {sample:.6} exhausted cumulative walk ({cumulative}), falling back to tier {fallback}");
    Ok(fallback)
}
