//! Error kinds surfaced by the engine.
//!
//! The engine never aborts the process: every failure is a value the caller
//! inspects. `EmptyStore` and `NoPlayableItems` are "nothing to play" states;
//! the remaining kinds point at bad upstream state or bad input.

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Failure kinds of the leveling & selection engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// No practicable tier holds any record
    #[error("Store is empty: no practicable tiers or records")]
    EmptyStore,

    /// The chosen tier is still empty after its played flags were reset
    #[error("No playable items in tier {tier}")]
    NoPlayableItems { tier: u32 },

    /// Malformed input to identity minting
    #[error("Invalid identity input: {0}")]
    InvalidIdentityInput(String),

    /// A structural invariant of the store does not hold
    #[error("Inconsistent store: {0}")]
    InconsistentStore(String),

    /// No record carries the given identity
    #[error("Unknown record: {0}")]
    UnknownRecord(String),

    /// A record with this title is already registered
    #[error("Duplicate title: {0}")]
    DuplicateTitle(String),

    /// Engine configuration or argument out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl EngineError {
    /// True for the kinds a front end should present as "nothing to play".
    #[must_use]
    pub const fn is_nothing_to_play(&self) -> bool {
        matches!(self, Self::EmptyStore | Self::NoPlayableItems { .. })
    }
}
