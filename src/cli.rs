//! # Command-Line Interface Module
//!
//! This module defines the command-line interface for Reprise using Clap derive macros.
//!
//! ## Commands
//!
//! - `next`: Pick the next recording to practise
//! - `done`: Report a recording as practised and rebalance tiers
//! - `adjust`: Run a demotion pass on its own
//! - `register`: Add titles to the highest tier
//! - `scan`: Check a folder of new recordings, optionally registering them
//! - `move`: Put a recording into a specific tier
//! - `history`: Show recently presented recordings
//! - `status`: Show tier sizes and selection weights
//!
//! ## Examples
//!
//! ```bash
//! reprise next
//! reprise done 3f6c...e1
//! reprise scan ~/recordings/new --apply
//! reprise --strategy quadratic --exp-base 0.5 status
//! ```

use crate::weighting::WeightingStrategy;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Shell types supported for completion generation
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    /// Bash shell
    Bash,
    /// Zsh shell
    Zsh,
    /// Fish shell
    Fish,
    /// PowerShell
    PowerShell,
    /// Elvish shell
    Elvish,
}

/// Main application arguments structure.
///
/// Global flags override the settings file for a single invocation and are
/// never written back.
#[derive(Parser, Debug)]
#[command(name = "reprise")]
#[command(about = "Reprise: tiered practice queue for recorded drills")]
#[command(version)]
pub struct Args {
    /// Settings file to use instead of the one in the data directory
    #[arg(long, global = true, value_name = "PATH", value_hint = clap::ValueHint::FilePath)]
    pub settings: Option<PathBuf>,

    /// Weighting strategy for this invocation
    #[arg(long, global = true, value_enum)]
    pub strategy: Option<WeightingStrategy>,

    /// Weighting exponent base for this invocation
    #[arg(long, global = true, value_name = "F64", allow_negative_numbers = true)]
    pub exp_base: Option<f64>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Enumeration of all available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Pick the next recording to practise
    ///
    /// Draws a tier by weight, then an unplayed recording inside it. When
    /// every recording of the drawn tier has been played, the tier starts
    /// over.
    Next,

    /// Report a recording as practised
    ///
    /// Increments its play count, runs a demotion pass and appends it to
    /// the history.
    Done {
        /// Identity printed by `next`
        #[arg(value_hint = clap::ValueHint::Other)]
        identity: String,
    },

    /// Run a demotion pass without reporting anything
    Adjust,

    /// Register titles in the highest existing tier
    Register {
        /// Titles to register, one identity each
        #[arg(required = true)]
        titles: Vec<String>,
    },

    /// Check a folder of `.wav` recordings against the store
    ///
    /// Without `--apply` only the classification is printed. With it, the
    /// valid titles are registered together into a new tier.
    Scan {
        /// Folder holding the new recordings
        #[arg(value_hint = clap::ValueHint::DirPath)]
        folder: PathBuf,

        /// Register the valid titles
        #[arg(long)]
        apply: bool,
    },

    /// Move a recording into a specific tier
    Move {
        /// Identity of the recording
        identity: String,

        /// Destination tier (1 or higher)
        tier: u32,
    },

    /// Show recently presented recordings, oldest first
    History,

    /// Show tier sizes and current selection weights
    Status,

    /// Generate shell completions
    ///
    /// Usage: reprise completion bash > ~/.local/share/bash-completion/completions/reprise
    Completion {
        /// Shell to generate completions for
        shell: Shell,
    },

    /// List identities for completion (hidden command)
    #[command(hide = true)]
    CompleteIdentities {
        /// Emit `identity<TAB>title` pairs for fish
        #[arg(long)]
        fish: bool,
    },
}

impl Command {
    /// Whether the command writes the store snapshot.
    #[must_use]
    pub const fn mutates_store(&self) -> bool {
        matches!(
            self,
            Self::Next
                | Self::Done { .. }
                | Self::Adjust
                | Self::Register { .. }
                | Self::Scan { apply: true, .. }
                | Self::Move { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Args::command().debug_assert();
    }

    #[test]
    fn test_global_overrides_after_subcommand() {
        let args = Args::try_parse_from([
            "reprise", "status", "--strategy", "quadratic", "--exp-base", "0.5",
        ])
        .unwrap();

        assert_eq!(args.strategy, Some(WeightingStrategy::Quadratic));
        assert_eq!(args.exp_base, Some(0.5));
        assert!(matches!(args.command, Command::Status));
    }

    #[test]
    fn test_register_requires_titles() {
        assert!(Args::try_parse_from(["reprise", "register"]).is_err());
    }

    #[test]
    fn test_mutating_commands() {
        let scan = |apply| Command::Scan {
            folder: PathBuf::from("."),
            apply,
        };
        assert!(Command::Next.mutates_store());
        assert!(scan(true).mutates_store());
        assert!(!scan(false).mutates_store());
        assert!(!Command::History.mutates_store());
        assert!(!Command::Status.mutates_store());
    }
}
