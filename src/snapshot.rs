//! Snapshot persistence for the store and the history log.
//!
//! Both files are read whole and written whole. Writes go to a temporary
//! file in the same directory which then replaces the target, so a crash
//! mid-write never leaves a half-written snapshot behind.

use crate::history::HistoryLog;
use crate::store::Store;
use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Load the store snapshot at `path`. A missing file is an empty store.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, or if the loaded
/// store breaks an invariant (duplicate identity or title).
pub fn load_store(path: &Path) -> Result<Store> {
    if !path.exists() {
        debug!("No store snapshot at {}, starting empty", path.display());
        return Ok(Store::new());
    }

    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read store snapshot {}", path.display()))?;
    let store: Store = serde_json::from_str(&text)
        .with_context(|| format!("Failed to parse store snapshot {}", path.display()))?;
    store
        .validate()
        .with_context(|| format!("Store snapshot {} is inconsistent", path.display()))?;

    debug!("Loaded {} records from {}", store.len(), path.display());
    Ok(store)
}

/// Flush `store` to `path` as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if the store is inconsistent or the write fails. An
/// inconsistent store is never written.
pub fn save_store(path: &Path, store: &Store) -> Result<()> {
    store
        .validate()
        .context("Refusing to write an inconsistent store")?;
    let json = serde_json::to_string_pretty(store).context("Failed to serialize store")?;
    write_atomic(path, json.as_bytes())
        .with_context(|| format!("Failed to write store snapshot {}", path.display()))?;
    debug!("Flushed {} records to {}", store.len(), path.display());
    Ok(())
}

/// Load the history log at `path`. A missing file is an empty log.
///
/// # Errors
///
/// Returns an error if the file exists but cannot be read.
pub fn load_history(path: &Path, capacity: usize) -> Result<HistoryLog> {
    if !path.exists() {
        return Ok(HistoryLog::with_capacity(capacity));
    }
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read history log {}", path.display()))?;
    Ok(HistoryLog::parse(&text, capacity))
}

/// # Errors
///
/// Returns an error if the write fails.
pub fn save_history(path: &Path, log: &HistoryLog) -> Result<()> {
    write_atomic(path, log.render().as_bytes())
        .with_context(|| format!("Failed to write history log {}", path.display()))
}

/// Replace `path` with `contents` via a temporary sibling file.
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the temporary file
/// cannot be written or renamed.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create directory {}", dir.display()))?;

    let mut tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;
    tmp.write_all(contents)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path)
        .map_err(|e| e.error)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    Ok(())
}
