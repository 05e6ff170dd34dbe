//! core::uncommitted
//!
//! Tracking of local uncommitted changes.
//!
//! The set is the union of staged and unstaged changed paths that still
//! exist on disk. It is rebuilt lazily: file-change notifications and
//! refresh cycles only mark it dirty, and the next consumer rebuilds it.

use std::collections::BTreeSet;

use super::host::FileProbe;
use super::types::normalize_path;
use crate::git::{Git, GitError};

/// Paths with pending local modifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UncommittedFiles {
    paths: BTreeSet<String>,
}

impl UncommittedFiles {
    pub fn from_paths<I: IntoIterator<Item = String>>(paths: I) -> Self {
        Self {
            paths: paths.into_iter().map(|p| normalize_path(&p)).collect(),
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(&normalize_path(path))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Query git for both diff sets and keep the paths that exist.
    pub fn compute(git: &Git, probe: &dyn FileProbe) -> Result<Self, GitError> {
        let mut paths = BTreeSet::new();
        for staged in [true, false] {
            for line in git.diff_names(staged)? {
                let path = normalize_path(&line);
                if probe.exists(&path) {
                    paths.insert(path);
                }
            }
        }
        Ok(Self { paths })
    }
}

/// The uncommitted set plus its dirty flag.
#[derive(Debug, Clone)]
pub struct UncommittedTracker {
    files: UncommittedFiles,
    dirty: bool,
}

impl Default for UncommittedTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl UncommittedTracker {
    /// A tracker that will build on first use.
    pub fn new() -> Self {
        Self {
            files: UncommittedFiles::default(),
            dirty: true,
        }
    }

    pub fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// The last computed set, possibly stale.
    pub fn files(&self) -> &UncommittedFiles {
        &self.files
    }

    /// Recompute and clear the dirty flag.
    ///
    /// On failure the previous set is kept; the flag is still cleared so a
    /// broken git setup does not re-run the query on every tick.
    pub fn rebuild(&mut self, git: &Git, probe: &dyn FileProbe) {
        match UncommittedFiles::compute(git, probe) {
            Ok(files) => {
                tracing::debug!("{} uncommitted file(s)", files.len());
                self.files = files;
            }
            Err(e) => tracing::warn!("failed to list uncommitted files: {}", e),
        }
        self.dirty = false;
    }

    /// Rebuild only when dirty.
    pub fn ensure_fresh(&mut self, git: &Git, probe: &dyn FileProbe) -> &UncommittedFiles {
        if self.dirty {
            self.rebuild(git, probe);
        }
        &self.files
    }
}
