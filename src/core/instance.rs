//! core::instance
//!
//! Exclusive per-repository lock for the `lw watch` loop.
//!
//! Two watchers on the same repository would issue duplicate refreshes and
//! duplicate warnings, so the watcher holds an OS-level exclusive lock on
//! `<git_dir>/lockwatch/watch.lock` for its whole lifetime.
//!
//! # Invariants
//!
//! - Acquisition is non-blocking (fails fast if held)
//! - The lock is released on drop (RAII)

use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};

use fs2::FileExt;
use thiserror::Error;

use crate::core::paths::LockwatchPaths;

#[derive(Debug, Error)]
pub enum InstanceLockError {
    #[error("another lw watch is already running for this repository")]
    AlreadyRunning,

    #[error("cannot use watch lock {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Guard proving this process is the repository's only watcher.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    file: Option<File>,
}

impl InstanceLock {
    /// Take the watch lock without waiting.
    pub fn acquire(paths: &LockwatchPaths) -> Result<Self, InstanceLockError> {
        let dir = paths.state_dir();
        fs::create_dir_all(&dir).map_err(|source| InstanceLockError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = paths.watch_lock_path();
        let opened = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&path);
        let file = match opened {
            Ok(file) => file,
            Err(source) => return Err(InstanceLockError::Io { path, source }),
        };

        if let Err(source) = file.try_lock_exclusive() {
            if source.kind() == std::io::ErrorKind::WouldBlock {
                return Err(InstanceLockError::AlreadyRunning);
            }
            return Err(InstanceLockError::Io { path, source });
        }
        Ok(Self {
            path,
            file: Some(file),
        })
    }

    pub fn is_held(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if let Some(file) = self.file.take() {
            let _ = file.unlock();
        }
    }
}
