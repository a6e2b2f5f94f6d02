//! # Configuration Module
//!
//! Settings and data directory management for Reprise.
//!
//! ## Data Storage
//!
//! Everything lives in the platform-standard data directory:
//! - Linux: `~/.local/share/reprise/`
//! - macOS: `~/Library/Application Support/reprise/`
//! - Windows: `%APPDATA%\reprise\`
//!
//! `settings.json` in that directory records where the store snapshot, the
//! history log and the recordings are, the identity sequence counter, and the
//! engine tunables. A missing settings file means defaults next to it.

use crate::engine::EngineConfig;
use crate::identity::IdentitySequence;
use crate::snapshot;
use anyhow::{Context, Result};
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";
const STORE_FILE: &str = "list_song.json";
const HISTORY_FILE: &str = "play_history.txt";
const WAVE_DIR: &str = "wave";

/// Returns the platform-appropriate data directory for Reprise, creating it
/// if needed.
///
/// # Errors
///
/// This function will return an error if:
/// - The system data directory cannot be determined
/// - The reprise subdirectory cannot be created due to permissions
///
/// # Examples
///
/// ```no_run
/// use reprise::config::get_data_dir;
///
/// let data_dir = get_data_dir()?;
/// println!("Data location: {}", data_dir.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir()
        .ok_or_else(|| anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        ))?;

    let reprise_dir = data_dir.join("reprise");
    fs::create_dir_all(&reprise_dir)
        .with_context(|| format!(
            "Failed to create Reprise data directory at {}. Please check file permissions.",
            reprise_dir.display()
        ))?;

    Ok(reprise_dir)
}

/// Default location of `settings.json`.
///
/// # Errors
///
/// See [`get_data_dir`].
pub fn get_settings_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(SETTINGS_FILE))
}

/// Persisted application settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Tiered store snapshot
    pub store_path: PathBuf,
    /// Playback history, one identity per line
    pub history_path: PathBuf,
    /// Folder holding `<title>.wav` recordings
    pub wave_dir: PathBuf,
    /// Next identity sequence number
    #[serde(default)]
    pub sequence: IdentitySequence,
    #[serde(default)]
    pub engine: EngineConfig,
}

impl Settings {
    /// Default settings with every file placed under `dir`.
    #[must_use]
    pub fn rooted_at(dir: &Path) -> Self {
        Self {
            store_path: dir.join(STORE_FILE),
            history_path: dir.join(HISTORY_FILE),
            wave_dir: dir.join(WAVE_DIR),
            sequence: IdentitySequence::default(),
            engine: EngineConfig::default(),
        }
    }

    /// # Errors
    ///
    /// See [`get_data_dir`].
    pub fn default_path() -> Result<PathBuf> {
        get_settings_path()
    }

    /// Load settings from `path`, or defaults beside it if it does not exist.
    ///
    /// Relative paths inside the file are taken relative to the file's own
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed, or
    /// if its engine block is out of range.
    pub fn load(path: &Path) -> Result<Self> {
        let base = path
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf);

        if !path.exists() {
            log::debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::rooted_at(&base));
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings file {}", path.display()))?;
        let mut settings: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse settings file {}", path.display()))?;

        settings.store_path = absolute_from(&settings.store_path, &base)?;
        settings.history_path = absolute_from(&settings.history_path, &base)?;
        settings.wave_dir = absolute_from(&settings.wave_dir, &base)?;
        settings
            .engine
            .validate()
            .with_context(|| format!("Invalid engine settings in {}", path.display()))?;

        Ok(settings)
    }

    /// Write settings to `path` atomically.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        snapshot::write_atomic(path, json.as_bytes())
            .with_context(|| format!("Failed to write settings file {}", path.display()))
    }

    /// Location of a title's recording.
    #[must_use]
    pub fn recording_path(&self, title: &str) -> PathBuf {
        self.wave_dir.join(format!("{title}.wav"))
    }

    /// `file:` URL of a title's recording, with forward slashes.
    #[must_use]
    pub fn playback_url(&self, title: &str) -> String {
        let path = self.recording_path(title).to_string_lossy().replace('\\', "/");
        if path.starts_with('/') {
            format!("file://{path}")
        } else {
            format!("file:///{path}")
        }
    }
}

fn absolute_from(path: &Path, base: &Path) -> Result<PathBuf> {
    Ok(path
        .absolutize_from(base)
        .with_context(|| format!("Failed to resolve path {}", path.display()))?
        .into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::weighting::WeightingStrategy;
    use tempfile::TempDir;

    #[test]
    fn test_missing_settings_use_defaults_beside_file() -> Result<()> {
        let dir = TempDir::new()?;
        let settings = Settings::load(&dir.path().join(SETTINGS_FILE))?;

        assert_eq!(settings.store_path, dir.path().join(STORE_FILE));
        assert_eq!(settings.history_path, dir.path().join(HISTORY_FILE));
        assert_eq!(settings.sequence, IdentitySequence::default());
        assert_eq!(settings.engine, EngineConfig::default());
        Ok(())
    }

    #[test]
    fn test_save_then_load() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(SETTINGS_FILE);

        let mut settings = Settings::rooted_at(dir.path());
        settings.sequence = IdentitySequence::new(77)?;
        settings.engine.weighting = WeightingStrategy::Quadratic;
        settings.engine.exp_base = 0.5;
        settings.save(&path)?;

        assert_eq!(Settings::load(&path)?, settings);
        Ok(())
    }

    #[test]
    fn test_relative_paths_resolve_against_settings_dir() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(
            &path,
            r#"{"store_path": "data/list.json", "history_path": "hist.txt", "wave_dir": "../wav"}"#,
        )?;

        let settings = Settings::load(&path)?;
        assert_eq!(settings.store_path, dir.path().join("data/list.json"));
        assert!(settings.wave_dir.is_absolute());
        assert_eq!(settings.sequence.value(), 1);
        Ok(())
    }

    #[test]
    fn test_invalid_engine_block_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(
            &path,
            r#"{"store_path": "s", "history_path": "h", "wave_dir": "w", "engine": {"exp_base": -2}}"#,
        )?;

        assert!(Settings::load(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_rooted_at_touches_nothing() -> Result<()> {
        let dir = TempDir::new()?;
        let root = dir.path().join("not_yet");

        let settings = Settings::rooted_at(&root);
        assert_eq!(settings.store_path, root.join(STORE_FILE));
        assert!(!root.exists());
        Ok(())
    }

    #[test]
    fn test_negative_sequence_rejected() -> Result<()> {
        let dir = TempDir::new()?;
        let path = dir.path().join(SETTINGS_FILE);
        fs::write(
            &path,
            r#"{"store_path": "s", "history_path": "h", "wave_dir": "w", "sequence": -3}"#,
        )?;

        assert!(Settings::load(&path).is_err());
        Ok(())
    }

    #[test]
    fn test_playback_url() {
        let settings = Settings::rooted_at(Path::new("/srv/drills"));
        assert_eq!(
            settings.playback_url("scale_a"),
            "file:///srv/drills/wave/scale_a.wav"
        );
    }

    #[test]
    fn test_get_data_dir_creates_directory() {
        let result = get_data_dir();
        assert!(result.is_ok());

        let dir = result.unwrap();
        assert!(dir.exists());
        assert!(dir.is_dir());
        assert_eq!(dir.file_name().unwrap(), "reprise");
    }
}
