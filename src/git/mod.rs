//! git
//!
//! Single interface for all Git operations.
//!
//! # Architecture
//!
//! This module is the **only doorway** to Git. Every git command line in
//! Lockwatch is formatted here and executed through a
//! [`crate::process::CommandRunner`], so tests can substitute a mock runner
//! and no other module needs to know git's argument syntax.
//!
//! `git2` is used for repository discovery only. Lock traffic has to go
//! through the `git lfs` CLI, and the diff/fetch/rev-list queries follow it
//! so that they see exactly the same credentials and configuration.
//!
//! # Responsibilities
//!
//! - Repository discovery (working tree root, git dir)
//! - Version and branch queries
//! - Staged/unstaged change listing
//! - Upstream commit inspection (fetch, rev-list, diff-tree)
//! - `git lfs lock` / `git lfs unlock` / `git lfs locks`
//!
//! # Example
//!
//! ```ignore
//! use lockwatch::git::Git;
//! use lockwatch::process::SystemRunner;
//! use std::{path::Path, sync::Arc, time::Duration};
//!
//! let git = Git::open(Path::new("."), Arc::new(SystemRunner), Duration::from_secs(30))?;
//! println!("on branch {}", git.current_branch()?);
//! ```

mod interface;

pub use interface::{Git, GitError, GitVersion};
