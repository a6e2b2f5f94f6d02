//! Identity minting for new records.
//!
//! An identity is the SHA-256 digest of `"{title}_{sequence}"`, rendered as
//! 64 lowercase hex characters. The sequence number comes from a counter the
//! caller persists; this module only owns the digest and the counter's
//! arithmetic, never its storage.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Length of a minted identity in hex characters.
pub const IDENTITY_LEN: usize = 64;

/// Derive the identity for `title` at `sequence_number`.
///
/// Same inputs always give the same identity; titles reused in a later
/// registration batch still get a fresh identity because the sequence moved.
///
/// # Errors
///
/// `InvalidIdentityInput` for an empty (or whitespace-only) title or a
/// negative sequence number.
///
/// # Examples
///
/// ```
/// use reprise::identity::mint_identity;
///
/// let id = mint_identity("scale_d_minor", 7)?;
/// assert_eq!(id.len(), 64);
/// assert_eq!(id, mint_identity("scale_d_minor", 7)?);
/// assert_ne!(id, mint_identity("scale_d_minor", 8)?);
/// # Ok::<(), reprise::error::EngineError>(())
/// ```
pub fn mint_identity(title: &str, sequence_number: i64) -> Result<String> {
    if title.trim().is_empty() {
        return Err(EngineError::InvalidIdentityInput("title is empty".to_string()));
    }
    if sequence_number < 0 {
        return Err(EngineError::InvalidIdentityInput(format!(
            "sequence number {sequence_number} is negative"
        )));
    }

    let digest = Sha256::digest(format!("{title}_{sequence_number}").as_bytes());
    let identity = format!("{digest:x}");
    log::trace!("Minted identity {identity} for '{title}' at sequence {sequence_number}");
    Ok(identity)
}

/// Snapshot of the persisted identity sequence counter.
///
/// The value is the next sequence number to hand out. It only moves
/// forward; callers persist the advanced value after every mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct IdentitySequence(i64);

impl TryFrom<i64> for IdentitySequence {
    type Error = EngineError;

    fn try_from(next: i64) -> Result<Self> {
        Self::new(next)
    }
}

impl From<IdentitySequence> for i64 {
    fn from(sequence: IdentitySequence) -> Self {
        sequence.0
    }
}

impl Default for IdentitySequence {
    fn default() -> Self {
        Self(1)
    }
}

impl IdentitySequence {
    /// # Errors
    ///
    /// `InvalidIdentityInput` for a negative starting value.
    pub fn new(next: i64) -> Result<Self> {
        if next < 0 {
            return Err(EngineError::InvalidIdentityInput(format!(
                "sequence counter {next} is negative"
            )));
        }
        Ok(Self(next))
    }

    /// The number the next mint will use.
    #[must_use]
    pub const fn value(self) -> i64 {
        self.0
    }

    /// Mint an identity for `title` and return it with the advanced counter.
    ///
    /// # Errors
    ///
    /// Whatever [`mint_identity`] rejects; the counter is not advanced then.
    pub fn mint(self, title: &str) -> Result<(String, Self)> {
        let identity = mint_identity(title, self.0)?;
        let (_, next) = self.advance()?;
        Ok((identity, next))
    }

    /// The number to use now and the counter that follows it.
    ///
    /// # Errors
    ///
    /// `InvalidIdentityInput` when the counter would overflow.
    pub fn advance(self) -> Result<(i64, Self)> {
        let next = self.0.checked_add(1).ok_or_else(|| {
            EngineError::InvalidIdentityInput("sequence counter overflow".to_string())
        })?;
        Ok((self.0, Self(next)))
    }
}
