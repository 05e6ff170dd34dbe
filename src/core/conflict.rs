//! core::conflict
//!
//! Detection of locks that collide with local uncommitted work.
//!
//! A lock on `P` is conflicting when `P` has uncommitted changes, an
//! identity is configured, and the lock is held by someone else. Each
//! conflicting path is reported once: the first report adds it to an
//! [`IgnoreList`], and the entry stays until the lock disappears or passes
//! to the current user.

use std::collections::BTreeSet;

use super::snapshot::LockSnapshot;
use super::types::{Identity, LockRecord};
use super::uncommitted::UncommittedFiles;

/// True if `record` conflicts with the local uncommitted set.
pub fn is_conflicting(
    record: &LockRecord,
    uncommitted: &UncommittedFiles,
    identity: &Identity,
) -> bool {
    identity.is_configured() && !identity.owns(record) && uncommitted.contains(&record.path)
}

/// Paths whose conflict warning has already been shown.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IgnoreList {
    paths: BTreeSet<String>,
}

impl IgnoreList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    /// Returns false if the path was already present.
    pub fn insert(&mut self, path: impl Into<String>) -> bool {
        self.paths.insert(path.into())
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

    /// Drop entries whose lock is gone from `snapshot` or now held by
    /// `identity`. Returns the removed paths.
    pub fn prune(&mut self, snapshot: &LockSnapshot, identity: &Identity) -> Vec<String> {
        let mut removed = Vec::new();
        self.paths.retain(|path| {
            let keep = snapshot
                .find(path)
                .is_some_and(|record| !identity.owns(record));
            if !keep {
                removed.push(path.clone());
            }
            keep
        });
        removed
    }
}

/// Finds newly conflicting locks in a snapshot.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConflictDetector;

impl ConflictDetector {
    /// Collect conflicting paths not yet in `ignore`, adding each to it.
    ///
    /// The returned paths follow snapshot order and form one aggregated
    /// warning for the cycle.
    pub fn detect(
        &self,
        snapshot: &LockSnapshot,
        uncommitted: &UncommittedFiles,
        identity: &Identity,
        ignore: &mut IgnoreList,
    ) -> Vec<String> {
        let mut fresh = Vec::new();
        for record in snapshot.records() {
            if is_conflicting(record, uncommitted, identity) && ignore.insert(record.path.clone())
            {
                fresh.push(record.path.clone());
            }
        }
        fresh
    }
}
