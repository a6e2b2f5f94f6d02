//! Tier weighting: turns per-tier item counts into a selection distribution.
//!
//! Higher tiers hold the material the learner knows least, so both
//! strategies bias the draw towards them. `exp_base` is the one knob that
//! controls how hard they lean.
//!
//! | tier | linear                      | quadratic                              |
//! |------|-----------------------------|----------------------------------------|
//! | 1    | `count`                     | `count`                                |
//! | n ≥ 2| `count × (n + exp_base)`    | `count × (0.5 × exp_base × n² + 1)`    |
//!
//! Raw weights are floored to whole numbers and then normalized by their sum.

use crate::error::{EngineError, Result};
use crate::store::{is_practicable, TierNumber};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Which weighting function the engine uses
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum WeightingStrategy {
    /// Weight grows linearly with the tier number
    #[default]
    Linear,
    /// Weight grows with the square of the tier number
    Quadratic,
}

impl WeightingStrategy {
    /// Build the weighting function for this strategy.
    ///
    /// # Errors
    ///
    /// `InvalidConfig` when `exp_base` is negative, NaN or infinite.
    pub fn weighting(self, exp_base: f64) -> Result<Box<dyn TierWeighting>> {
        validate_exp_base(exp_base)?;
        Ok(match self {
            Self::Linear => Box::new(LinearWeighting { exp_base }),
            Self::Quadratic => Box::new(QuadraticWeighting { exp_base }),
        })
    }
}

impl std::fmt::Display for WeightingStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Linear => write!(f, "linear"),
            Self::Quadratic => write!(f, "quadratic"),
        }
    }
}

/// A weighting function over `(tier, item_count)`.
pub trait TierWeighting {
    /// Unnormalized weight of a tier holding `count` items.
    fn raw_weight(&self, tier: TierNumber, count: usize) -> f64;
}

/// `count × (tier + exp_base)` above tier 1
#[derive(Debug, Clone, Copy)]
pub struct LinearWeighting {
    exp_base: f64,
}

impl LinearWeighting {
    /// # Errors
    ///
    /// `InvalidConfig` for a negative or non-finite `exp_base`.
    pub fn new(exp_base: f64) -> Result<Self> {
        validate_exp_base(exp_base)?;
        Ok(Self { exp_base })
    }
}

impl TierWeighting for LinearWeighting {
    #[allow(clippy::cast_precision_loss)]
    fn raw_weight(&self, tier: TierNumber, count: usize) -> f64 {
        let count = count as f64;
        match tier {
            1 => count,
            n => (count * (f64::from(n) + self.exp_base)).floor(),
        }
    }
}

/// `count × (0.5 × exp_base × tier² + 1)` above tier 1
#[derive(Debug, Clone, Copy)]
pub struct QuadraticWeighting {
    exp_base: f64,
}

impl QuadraticWeighting {
    /// # Errors
    ///
    /// `InvalidConfig` for a negative or non-finite `exp_base`.
    pub fn new(exp_base: f64) -> Result<Self> {
        validate_exp_base(exp_base)?;
        Ok(Self { exp_base })
    }
}

impl TierWeighting for QuadraticWeighting {
    #[allow(clippy::cast_precision_loss)]
    fn raw_weight(&self, tier: TierNumber, count: usize) -> f64 {
        let count = count as f64;
        match tier {
            1 => count,
            n => {
                let multiplier = 0.5 * self.exp_base * f64::from(n).powi(2) + 1.0;
                (count * multiplier).floor()
            }
        }
    }
}

fn validate_exp_base(exp_base: f64) -> Result<()> {
    if !exp_base.is_finite() || exp_base < 0.0 {
        return Err(EngineError::InvalidConfig(format!(
            "exp_base must be a finite non-negative number, got {exp_base}"
        )));
    }
    Ok(())
}

/// Normalize per-tier counts into selection probabilities.
///
/// The reserved tier is ignored if present. Tiers with no items stay in the
/// result with probability exactly `0.0`.
///
/// # Errors
///
/// `EmptyStore` when the total weight is zero, `InvalidConfig` when a weight
/// or their sum overflows to infinity (an `exp_base` too large for the
/// store).
///
/// # Examples
///
/// ```
/// use std::collections::BTreeMap;
/// use reprise::weighting::{tier_probabilities, LinearWeighting};
///
/// let counts = BTreeMap::from([(1, 10), (2, 10)]);
/// let probs = tier_probabilities(&counts, &LinearWeighting::new(1.0)?)?;
/// // tier 1: 10, tier 2: 10 × (2 + 1) = 30
/// assert!((probs[&1] - 0.25).abs() < 1e-12);
/// assert!((probs[&2] - 0.75).abs() < 1e-12);
/// # Ok::<(), reprise::error::EngineError>(())
/// ```
pub fn tier_probabilities(
    counts: &BTreeMap<TierNumber, usize>,
    weighting: &dyn TierWeighting,
) -> Result<BTreeMap<TierNumber, f64>> {
    let weights: BTreeMap<TierNumber, f64> = counts
        .iter()
        .filter(|(tier, _)| is_practicable(**tier))
        .map(|(tier, count)| (*tier, weighting.raw_weight(*tier, *count)))
        .collect();

    let total: f64 = weights.values().sum();
    if !total.is_finite() || weights.values().any(|weight| !weight.is_finite()) {
        return Err(EngineError::InvalidConfig(format!(
            "tier weights overflow for counts {counts:?}; exp_base is too large"
        )));
    }
    if total <= 0.0 {
        return Err(EngineError::EmptyStore);
    }
    log::trace!("Tier weights {weights:?} (total {total})");

    Ok(weights
        .into_iter()
        .map(|(tier, weight)| (tier, weight / total))
        .collect())
}

/// [`tier_probabilities`] with the strategy picked by configuration.
///
/// # Errors
///
/// `InvalidConfig` for a bad `exp_base`, `EmptyStore` for zero total weight.
pub fn calculate(
    counts: &BTreeMap<TierNumber, usize>,
    strategy: WeightingStrategy,
    exp_base: f64,
) -> Result<BTreeMap<TierNumber, f64>> {
    let weighting = strategy.weighting(exp_base)?;
    tier_probabilities(counts, weighting.as_ref())
}
