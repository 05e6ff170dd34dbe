//! core::host
//!
//! Capabilities the engine borrows from its host environment.
//!
//! The engine never touches the filesystem or asks "is the host busy?"
//! directly; it goes through these traits so an editor integration, the CLI
//! and tests can each supply their own answer.

use std::path::{Path, PathBuf};

use super::paths::LockwatchPaths;

/// File-existence check for repository-relative paths.
pub trait FileProbe {
    fn exists(&self, repo_relative: &str) -> bool;
}

/// Reports transient busy states during which automatic work should yield.
pub trait HostState {
    fn is_busy(&self) -> bool;
}

/// A working tree on disk.
#[derive(Debug, Clone)]
pub struct WorkTree {
    root: PathBuf,
}

impl WorkTree {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl FileProbe for WorkTree {
    fn exists(&self, repo_relative: &str) -> bool {
        !repo_relative.is_empty() && self.root.join(repo_relative).is_file()
    }
}

/// The CLI host is busy while another git process holds the index lock.
#[derive(Debug, Clone)]
pub struct GitIndexHost {
    index_lock: PathBuf,
}

impl GitIndexHost {
    pub fn new(git_dir: &Path) -> Self {
        Self {
            index_lock: LockwatchPaths::new(git_dir.to_path_buf()).index_lock_path(),
        }
    }
}

impl HostState for GitIndexHost {
    fn is_busy(&self) -> bool {
        self.index_lock.exists()
    }
}

/// A host that is never busy.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleHost;

impl HostState for IdleHost {
    fn is_busy(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn work_tree_sees_files_not_directories() {
        let temp = TempDir::new().unwrap();
        fs::create_dir_all(temp.path().join("Assets")).unwrap();
        fs::write(temp.path().join("Assets/a.png"), b"png").unwrap();

        let tree = WorkTree::new(temp.path());
        assert!(tree.exists("Assets/a.png"));
        assert!(!tree.exists("Assets"));
        assert!(!tree.exists("Assets/missing.png"));
        assert!(!tree.exists(""));
    }

    #[test]
    fn index_lock_marks_host_busy() {
        let temp = TempDir::new().unwrap();
        let host = GitIndexHost::new(temp.path());
        assert!(!host.is_busy());

        fs::write(temp.path().join("index.lock"), b"").unwrap();
        assert!(host.is_busy());
    }
}
