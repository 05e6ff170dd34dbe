//! core::paths
//!
//! Centralized path routing for Lockwatch storage locations.
//!
//! # Storage Layout
//!
//! Per-repository state lives under `<git_dir>/lockwatch/`:
//! - `watch.lock` - held by the running `lw watch` process
//!
//! User settings live outside the repository; see [`crate::core::config`].
//!
//! Paths typed on the command line are relative to the shell's directory,
//! while the lock server and git speak repository-relative paths.
//! [`repo_relative`] bridges the two.
//!
//! # Example
//!
//! ```
//! use lockwatch::core::paths::LockwatchPaths;
//! use std::path::PathBuf;
//!
//! let paths = LockwatchPaths::new(PathBuf::from("/repo/.git"));
//! assert_eq!(
//!     paths.watch_lock_path(),
//!     PathBuf::from("/repo/.git/lockwatch/watch.lock")
//! );
//! ```

use std::path::{Component, Path, PathBuf};

use crate::core::types::normalize_path;

/// Path routing for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockwatchPaths {
    /// The repository's git directory.
    pub git_dir: PathBuf,
}

impl LockwatchPaths {
    pub fn new(git_dir: PathBuf) -> Self {
        Self { git_dir }
    }

    /// `<git_dir>/lockwatch`
    pub fn state_dir(&self) -> PathBuf {
        self.git_dir.join("lockwatch")
    }

    /// `<git_dir>/lockwatch/watch.lock`
    pub fn watch_lock_path(&self) -> PathBuf {
        self.state_dir().join("watch.lock")
    }

    /// `<git_dir>/index.lock`, present while git updates the index.
    pub fn index_lock_path(&self) -> PathBuf {
        self.git_dir.join("index.lock")
    }

    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }
}

/// Rewrite `arg`, as typed from `cwd`, relative to `root` with `/` separators.
///
/// Resolution is lexical: `.` and `..` are folded without touching the
/// filesystem, so deleted files still resolve. Returns `None` when the path
/// leaves `root` or names `root` itself.
pub fn repo_relative(root: &Path, cwd: &Path, arg: &str) -> Option<String> {
    let joined = cwd.join(normalize_path(arg));
    let mut resolved = PathBuf::new();
    for component in joined.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !resolved.pop() {
                    return None;
                }
            }
            other => resolved.push(other),
        }
    }

    let relative = resolved.strip_prefix(root).ok()?;
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}
