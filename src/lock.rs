//! Single-writer guard around the store snapshot.
//!
//! The engine assumes nobody else mutates the snapshot between load and
//! flush. Commands that mutate take an exclusive `flock` on `<store>.lock`
//! for the whole load → mutate → flush cycle. The lock is advisory and goes
//! away with the guard (or the process).

use anyhow::{Context, Result};
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Held exclusive lock on a store snapshot
#[derive(Debug)]
pub struct StoreLock {
    file: File,
    path: PathBuf,
}

/// Path of the lock file guarding `store_path`.
#[must_use]
pub fn lock_path_for(store_path: &Path) -> PathBuf {
    let mut name = store_path
        .file_name()
        .map(|name| name.to_os_string())
        .unwrap_or_default();
    name.push(".lock");
    store_path.with_file_name(name)
}

impl StoreLock {
    /// Block until the exclusive lock on `store_path` is held.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened or locked.
    pub fn acquire(store_path: &Path) -> Result<Self> {
        let lock = Self::open(store_path)?;
        lock.flock(false)?;
        log::trace!("Acquired store lock {}", lock.path.display());
        Ok(lock)
    }

    /// Take the lock only if nobody else holds it.
    ///
    /// # Errors
    ///
    /// Returns an error if the lock file cannot be opened or the lock call
    /// fails for a reason other than contention.
    pub fn try_acquire(store_path: &Path) -> Result<Option<Self>> {
        let lock = Self::open(store_path)?;
        match lock.flock(true) {
            Ok(()) => Ok(Some(lock)),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(None),
            Err(e) => Err(e).with_context(|| format!("Failed to lock {}", lock.path.display())),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(store_path: &Path) -> Result<Self> {
        let path = lock_path_for(store_path);
        if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory {}", dir.display()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&path)
            .with_context(|| format!("Failed to open lock file {}", path.display()))?;
        Ok(Self { file, path })
    }

    #[cfg(unix)]
    fn flock(&self, non_blocking: bool) -> std::io::Result<()> {
        use std::os::unix::io::AsRawFd;

        let mut operation = libc::LOCK_EX;
        if non_blocking {
            operation |= libc::LOCK_NB;
        }
        // SAFETY: the descriptor belongs to `self.file`, which outlives the call.
        let rc = unsafe { libc::flock(self.file.as_raw_fd(), operation) };
        if rc == 0 {
            Ok(())
        } else {
            Err(std::io::Error::last_os_error())
        }
    }

    #[cfg(not(unix))]
    fn flock(&self, _non_blocking: bool) -> std::io::Result<()> {
        Ok(())
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        #[cfg(unix)]
        {
            use std::os::unix::io::AsRawFd;
            // SAFETY: see `flock`.
            unsafe {
                libc::flock(self.file.as_raw_fd(), libc::LOCK_UN);
            }
        }
        log::trace!("Released store lock {}", self.path.display());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lock_path_is_sibling() {
        assert_eq!(
            lock_path_for(Path::new("/data/list_song.json")),
            PathBuf::from("/data/list_song.json.lock")
        );
    }

    #[cfg(unix)]
    #[test]
    fn test_second_holder_blocked_until_release() -> Result<()> {
        let dir = TempDir::new()?;
        let store = dir.path().join("list_song.json");

        let held = StoreLock::acquire(&store)?;
        assert!(held.path().exists());
        assert!(StoreLock::try_acquire(&store)?.is_none());

        drop(held);
        assert!(StoreLock::try_acquire(&store)?.is_some());
        Ok(())
    }
}
