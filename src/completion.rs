//! # Shell Completion Module
//!
//! This module provides shell completion functionality for Reprise, including:
//! - Generation of completion scripts for various shells
//! - Identity listings for `done` and `move`, read from the store snapshot
//!
//! ## Usage
//!
//! ```bash
//! # Generate bash completions
//! reprise completion bash > ~/.local/share/bash-completion/completions/reprise
//!
//! # Generate zsh completions
//! reprise completion zsh > ~/.config/zsh/completions/_reprise
//! ```

use crate::store::Store;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::{self, Write};

/// Generate shell completions for the given shell
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    generate(gen, cmd, cmd.get_name().to_string(), &mut io::stdout());
}

/// Convert our Shell enum to clap_complete's Shell enum
#[must_use]
pub fn shell_to_completion_shell(shell: &crate::cli::Shell) -> CompletionShell {
    match shell {
        crate::cli::Shell::Bash => CompletionShell::Bash,
        crate::cli::Shell::Zsh => CompletionShell::Zsh,
        crate::cli::Shell::Fish => CompletionShell::Fish,
        crate::cli::Shell::PowerShell => CompletionShell::PowerShell,
        crate::cli::Shell::Elvish => CompletionShell::Elvish,
    }
}

/// Completion lines for every practicable record, ordered by tier then
/// position.
///
/// Fish gets `identity<TAB>title` so the title shows as the description.
#[must_use]
pub fn identity_completions(store: &Store, fish: bool) -> Vec<String> {
    store
        .records()
        .filter(|(tier, _)| crate::store::is_practicable(*tier))
        .map(|(_, record)| {
            if fish {
                format!("{}\t{}", record.identity, record.title.replace(['\t', '\n'], " "))
            } else {
                record.identity.clone()
            }
        })
        .collect()
}

/// Print [`identity_completions`] to `out`, one per line.
///
/// # Errors
///
/// Returns an error if writing fails.
pub fn write_identity_completions<W: Write>(out: &mut W, store: &Store, fish: bool) -> io::Result<()> {
    for line in identity_completions(store, fish) {
        writeln!(out, "{line}")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Record;

    #[test]
    fn test_shell_conversion() {
        assert_eq!(
            shell_to_completion_shell(&crate::cli::Shell::Bash),
            CompletionShell::Bash
        );
        assert_eq!(
            shell_to_completion_shell(&crate::cli::Shell::Zsh),
            CompletionShell::Zsh
        );
    }

    #[test]
    fn test_identity_completions() {
        let mut store = Store::new();
        store.insert(0, Record::new("parked", "id-0")).unwrap();
        store.insert(1, Record::new("warm up", "id-1")).unwrap();
        store.insert(2, Record::new("etude", "id-2")).unwrap();

        assert_eq!(identity_completions(&store, false), vec!["id-1", "id-2"]);
        assert_eq!(
            identity_completions(&store, true),
            vec!["id-1\twarm up", "id-2\tetude"]
        );

        let mut out = Vec::new();
        write_identity_completions(&mut out, &store, false).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "id-1\nid-2\n");
    }

    #[test]
    fn test_empty_store_has_no_completions() {
        assert!(identity_completions(&Store::new(), false).is_empty());
    }
}
