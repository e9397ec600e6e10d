//! Data directory lock
//!
//! Keeps a second assistant-core process from opening the same data
//! directory. Two processes rewriting one JSON mapping would race outside the
//! in-process upsert lock, and sled refuses concurrent opens anyway.
//! A requested store reset only happens once the lock is held.

use anyhow::{bail, Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{StorageBackend, StorageConfig};

/// PID lock file held for the lifetime of the server.
#[derive(Debug)]
pub struct DataDirLock {
    lock_path: PathBuf,
    held: bool,
}

impl DataDirLock {
    const LOCK_FILE_NAME: &'static str = ".assistant-core.lock";

    /// Lock `data_dir`, creating it if needed.
    ///
    /// A lock left behind by a process that is no longer running is replaced.
    pub fn acquire<P: AsRef<Path>>(data_dir: P) -> Result<Self> {
        let data_dir = data_dir.as_ref();
        fs::create_dir_all(data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        let lock_path = data_dir.join(Self::LOCK_FILE_NAME);
        if let Some(pid) = Self::live_holder(&lock_path) {
            bail!(
                "data directory {} is locked by running process {pid}; stop it or remove {}",
                data_dir.display(),
                lock_path.display()
            );
        }

        fs::write(&lock_path, format!("{}\n", std::process::id()))
            .with_context(|| format!("Failed to write lock file: {}", lock_path.display()))?;
        tracing::debug!(path = %lock_path.display(), "Acquired data directory lock");

        Ok(Self {
            lock_path,
            held: true,
        })
    }

    /// Lock the store's data directory, then wipe the store if `reset` is set.
    ///
    /// Returns `None` for the in-memory backend, which has nothing on disk.
    pub fn prepare(storage: &StorageConfig, reset: bool) -> Result<Option<Self>> {
        let lock = storage.data_dir().map(Self::acquire).transpose()?;
        if reset {
            wipe_store(storage)?;
        }
        Ok(lock)
    }

    /// PID recorded in an existing lock file, if that process is still alive.
    fn live_holder(lock_path: &Path) -> Option<u32> {
        let contents = fs::read_to_string(lock_path).ok()?;
        match contents.trim().parse::<u32>() {
            Ok(pid) if pid != std::process::id() && Self::is_running(pid) => Some(pid),
            Ok(_) => None,
            Err(_) => {
                tracing::warn!(path = %lock_path.display(), "Ignoring unreadable lock file");
                None
            }
        }
    }

    #[cfg(unix)]
    fn is_running(pid: u32) -> bool {
        // A recycled PID belonging to another program counts as stale
        fs::read_to_string(format!("/proc/{pid}/cmdline"))
            .map(|cmdline| cmdline.contains("assistant-core") || cmdline.contains("assistant_core"))
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    fn is_running(_pid: u32) -> bool {
        true
    }

    pub fn path(&self) -> &Path {
        &self.lock_path
    }

    pub fn release(&mut self) {
        if !self.held {
            return;
        }
        self.held = false;
        if let Err(e) = fs::remove_file(&self.lock_path) {
            tracing::warn!(error = %e, "Failed to remove lock file");
        }
    }
}

/// Remove the configured store file or directory.
fn wipe_store(storage: &StorageConfig) -> Result<()> {
    let path = storage.path.as_path();
    if storage.backend == StorageBackend::Memory || !path.exists() {
        tracing::info!("Decision store does not exist, nothing to reset");
        return Ok(());
    }

    tracing::warn!(path = %path.display(), "RESET_DB detected, wiping decision store");
    if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    }
    .with_context(|| format!("Failed to remove decision store: {}", path.display()))
}

impl Drop for DataDirLock {
    fn drop(&mut self) {
        self.release();
    }
}
