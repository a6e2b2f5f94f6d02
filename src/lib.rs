//! Tiered practice queue: decides which recorded drill to practise next.
//!
//! Core modules:
//! - [`store`] - Tiered record collection and its invariants
//! - [`weighting`] - Tier weighting strategies (linear, quadratic)
//! - [`selector`] - Weighted tier draw
//! - [`picker`] - Unplayed-record pick with tier reset
//! - [`demotion`] - Moves over-practised records one tier down
//! - [`identity`] - Identity minting from title and sequence number
//! - [`history`] - Bounded playback history
//! - [`engine`] - Request/response operations over a store snapshot
//!
//! ### Supporting Modules
//!
//! - [`config`] - Settings and data directory management
//! - [`snapshot`] - Store and history files on disk
//! - [`intake`] - Folder scan and batch registration of new recordings
//! - [`lock`] - Single-writer guard for the store snapshot
//! - [`cli`] - Command-line interface definitions with clap integration
//! - [`completion`] - Shell completion generation
//! - [`error`] - Engine error kinds
//!
//! ## Quick Start Example
//!
//! ```
//! use rand::{rngs::StdRng, SeedableRng};
//! use reprise::engine::{self, EngineConfig};
//! use reprise::identity::IdentitySequence;
//! use reprise::store::Store;
//!
//! let store = Store::new();
//! let counter = IdentitySequence::default();
//!
//! let registered = engine::register(&store, counter, "scale_in_thirds")?;
//! let mut rng = StdRng::seed_from_u64(7);
//! let pick = engine::pick_next(&registered.store, &EngineConfig::default(), &mut rng)?;
//! assert_eq!(pick.record.title, "scale_in_thirds");
//!
//! let completed = engine::report_completion(&pick.store, &pick.identity)?;
//! let (store, demotions) = engine::run_demotion(&completed)?;
//! assert!(demotions.is_empty());
//! assert_eq!(store.find(&pick.identity).map(|(_, r)| r.play_count), Some(1));
//! # Ok::<(), reprise::error::EngineError>(())
//! ```
//!
//! ## Selection
//!
//! A pick is two draws. The first chooses a tier with probability
//! proportional to its weight:
//!
//! - **Linear**: `count × (tier + exp_base)`
//! - **Quadratic**: `count × (0.5 × exp_base × tier² + 1)`
//!
//! Both are floored to whole numbers. Tier 1 always weighs its plain item
//! count, and tier 0 is reserved for recordings that are not in rotation.
//! The second draw picks uniformly among the tier's unplayed records; when
//! none are left the tier's played flags are cleared once and the draw is
//! retried.
//!
//! ## Demotion
//!
//! After every completion a demotion pass walks tiers in ascending order and
//! moves each record whose play count reached its tier number one tier down,
//! where it starts over with a count of 1. Tier 1 is never demoted from.
//!
//! ## Error Handling
//!
//! Engine operations return [`error::EngineError`]; the shell modules
//! ([`config`], [`snapshot`], [`intake`], [`lock`]) return `anyhow::Result`
//! with file context attached. `EmptyStore` and `NoPlayableItems` mean
//! "nothing to play" and are not failures from the user's point of view.

pub mod cli;
pub mod completion;
pub mod config;
pub mod demotion;
pub mod engine;
pub mod error;
pub mod history;
pub mod identity;
pub mod intake;
pub mod lock;
pub mod picker;
pub mod selector;
pub mod snapshot;
pub mod store;
pub mod weighting;
