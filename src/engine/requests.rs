//! engine::requests
//!
//! Batched lock and unlock requests.
//!
//! Paths are split into batches of at most `maxFilesPerRequest` and sent as
//! one `git lfs lock` / `git lfs unlock` per batch, in order. A batch that
//! reports errors does not stop the ones after it. Before locking, files
//! already modified upstream need the user's confirmation; declining any of
//! them cancels the whole request.

use thiserror::Error;

use super::LockEngine;
use crate::core::batch::batches;
use crate::core::types::LockRecord;
use crate::git::GitError;

/// Errors that stop a request before any batch is sent.
#[derive(Debug, Error)]
pub enum LockRequestError {
    /// The user declined a confirmation.
    #[error("request cancelled by user")]
    UserAbort,

    /// Locking is switched off in the settings.
    #[error("lockwatch is disabled (enabled = false)")]
    Disabled,
}

/// What one batch invocation reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchOutcome {
    pub paths: Vec<String>,
    pub stdout: String,
    pub stderr: String,
    /// True when git ran and exited with status zero.
    pub succeeded: bool,
}

impl BatchOutcome {
    fn from_run(paths: &[String], result: Result<crate::process::ProcessResult, GitError>) -> Self {
        match result {
            Ok(r) => Self {
                paths: paths.to_vec(),
                succeeded: r.exit_code == Some(0),
                stdout: r.stdout,
                stderr: r.stderr,
            },
            Err(e) => Self {
                paths: paths.to_vec(),
                stdout: String::new(),
                stderr: e.to_string(),
                succeeded: false,
            },
        }
    }
}

impl LockEngine {
    /// Lock `paths`, one git invocation per batch.
    ///
    /// # Errors
    ///
    /// - [`LockRequestError::Disabled`] when locking is switched off
    /// - [`LockRequestError::UserAbort`] when the user declines locking a
    ///   file that changed upstream; nothing is locked
    pub fn lock_paths(&mut self, paths: &[String]) -> Result<Vec<BatchOutcome>, LockRequestError> {
        self.ensure_enabled()?;
        let paths = Self::normalize_all(paths);
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!("trying to lock {} file(s)", paths.len());

        if self.settings.warn_if_remote_modified {
            self.confirm_remote_modified(&paths)?;
        }

        let outcomes = self.run_batches(&paths, "Git LFS lock", |git, batch| git.lfs_lock(batch));
        self.refresh();
        Ok(outcomes)
    }

    /// Unlock `paths`, one git invocation per batch. No upstream check.
    pub fn unlock_paths(
        &mut self,
        paths: &[String],
        force: bool,
    ) -> Result<Vec<BatchOutcome>, LockRequestError> {
        self.ensure_enabled()?;
        let paths = Self::normalize_all(paths);
        if paths.is_empty() {
            return Ok(Vec::new());
        }
        tracing::debug!("trying to unlock {} file(s)", paths.len());

        let outcomes = self.run_batches(&paths, "Git LFS unlock", |git, batch| {
            git.lfs_unlock(batch, force)
        });
        self.refresh();
        Ok(outcomes)
    }

    /// Release every lock the current user holds.
    pub fn unlock_all_mine(&mut self) -> Result<Vec<BatchOutcome>, LockRequestError> {
        let mine: Vec<String> = self.own_locks().iter().map(|r| r.path.clone()).collect();
        self.unlock_paths(&mine, false)
    }

    /// Release the given records, skipping any not held by the current user.
    pub fn unlock_selected(
        &mut self,
        records: &[LockRecord],
    ) -> Result<Vec<BatchOutcome>, LockRequestError> {
        let mut mine = Vec::with_capacity(records.len());
        for record in records {
            if self.identity.owns(record) {
                mine.push(record.path.clone());
            } else {
                tracing::warn!("not unlocking {}: held by {}", record.path, record.owner_name());
            }
        }
        self.unlock_paths(&mine, false)
    }

    fn ensure_enabled(&self) -> Result<(), LockRequestError> {
        if self.settings.enabled {
            Ok(())
        } else {
            Err(LockRequestError::Disabled)
        }
    }

    /// Ask about every requested path that changed upstream.
    fn confirm_remote_modified(&self, paths: &[String]) -> Result<(), LockRequestError> {
        let remote = match self.remote_modified() {
            Ok(set) => set,
            Err(e) => {
                tracing::warn!("could not check for upstream changes: {}", e);
                return Ok(());
            }
        };

        for path in paths.iter().filter(|p| remote.contains(p)) {
            let message = format!(
                "{} has been modified on the server already. You really should pull \
                 before locking or you'll almost certainly get merge conflicts.",
                path
            );
            let lock_anyway = self.prompter.confirm(
                "File modified on the server",
                &message,
                "I know what I'm doing, lock anyway",
                "OK, don't lock yet",
            );
            if !lock_anyway {
                tracing::info!("lock request cancelled at {}", path);
                return Err(LockRequestError::UserAbort);
            }
        }
        Ok(())
    }

    fn run_batches<F>(&self, paths: &[String], title: &str, run: F) -> Vec<BatchOutcome>
    where
        F: Fn(&crate::git::Git, &[String]) -> Result<crate::process::ProcessResult, GitError>,
    {
        let max = self.settings.max_files_per_request;
        let mut outcomes = Vec::new();
        for batch in batches(paths, max) {
            let outcome = BatchOutcome::from_run(batch, run(&self.git, batch));
            if !outcome.stderr.trim().is_empty() {
                tracing::warn!("{}: {}", title, outcome.stderr.trim());
                self.prompter.alert(title, outcome.stderr.trim());
            }
            outcomes.push(outcome);
        }
        outcomes
    }
}
