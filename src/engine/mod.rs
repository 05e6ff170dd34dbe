//! engine
//!
//! The lock-state synchronization engine.
//!
//! # Architecture
//!
//! [`LockEngine`] owns every piece of mutable lock state: the published
//! snapshot, the conflict ignore-list, the uncommitted-file tracker, the
//! refresh scheduler and the `refreshing` guard. Nothing else mutates them.
//!
//! Work is driven by a cooperative tick:
//!
//! ```text
//! tick -> [rebuild uncommitted if dirty] -> drain completions -> maybe refresh
//! ```
//!
//! Background git commands run on the [`crate::process::AsyncQueue`]
//! worker, which only stages raw results. Parsing, snapshot replacement and
//! conflict evaluation all happen on the tick, so readers always see either
//! the previous snapshot or the next one, never a partial one.
//!
//! # Submodules
//!
//! - [`refresh`] - Refresh protocol, completion handling and the tick
//! - [`hooks`] - Save, file-change and quit interception
//! - [`requests`] - Batched lock and unlock requests
//!
//! # Example
//!
//! ```ignore
//! use lockwatch::engine::LockEngine;
//! use lockwatch::ui::prompts::TerminalPrompter;
//! use std::sync::Arc;
//!
//! let mut engine = LockEngine::new(git, settings, Arc::new(TerminalPrompter::new(true)));
//! engine.refresh();
//! engine.settle(std::time::Duration::from_secs(60));
//! for record in engine.other_locks() {
//!     println!("{}", record);
//! }
//! ```

pub mod hooks;
pub mod refresh;
pub mod requests;

pub use requests::{BatchOutcome, LockRequestError};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use crate::core::config::Settings;
use crate::core::conflict::{is_conflicting, IgnoreList};
use crate::core::host::{FileProbe, GitIndexHost, HostState, WorkTree};
use crate::core::remote_modified::RemoteModifiedFiles;
use crate::core::scheduler::RefreshScheduler;
use crate::core::snapshot::LockSnapshot;
use crate::core::types::{normalize_path, Identity, LockRecord};
use crate::core::uncommitted::{UncommittedFiles, UncommittedTracker};
use crate::git::{Git, GitError};
use crate::process::AsyncQueue;
use crate::ui::prompts::Prompter;

/// Execution context for commands.
///
/// Contains global settings derived from CLI flags that affect command behavior.
#[derive(Debug, Clone)]
pub struct Context {
    /// Working directory override.
    pub cwd: Option<PathBuf>,
    /// Debug logging enabled.
    pub debug: bool,
    /// Quiet mode (minimal output).
    pub quiet: bool,
    /// Interactive mode enabled.
    pub interactive: bool,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            cwd: None,
            debug: false,
            quiet: false,
            interactive: true,
        }
    }
}

/// Callback run after every cache-affecting event.
pub type Listener = Box<dyn Fn()>;

/// Owner of all lock state for one repository.
pub struct LockEngine {
    settings: Settings,
    identity: Identity,
    git: Git,
    queue: AsyncQueue,
    prompter: Arc<dyn Prompter>,
    probe: Box<dyn FileProbe>,
    host: Box<dyn HostState>,

    snapshot: Arc<LockSnapshot>,
    loaded: bool,
    ignore: IgnoreList,
    uncommitted: UncommittedTracker,
    scheduler: RefreshScheduler,
    refreshing: bool,

    listeners: Vec<Listener>,
}

impl std::fmt::Debug for LockEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockEngine")
            .field("git", &self.git)
            .field("identity", &self.identity)
            .field("locks", &self.snapshot.len())
            .field("loaded", &self.loaded)
            .field("refreshing", &self.refreshing)
            .field("queue", &self.queue)
            .finish()
    }
}

impl LockEngine {
    /// Create an engine for `git`'s working tree.
    ///
    /// Starts the background worker. File existence is checked against the
    /// working tree and the host counts as busy while git holds its index
    /// lock; use [`LockEngine::with_probe`] / [`LockEngine::with_host`] to
    /// substitute either.
    pub fn new(git: Git, settings: Settings, prompter: Arc<dyn Prompter>) -> Self {
        let queue = AsyncQueue::spawn(
            git.runner(),
            Duration::from_secs(settings.listing_timeout_seconds),
        );
        let identity = Identity::new(&settings.host_username);
        if !identity.is_configured() {
            tracing::debug!("hostUsername is not set; no lock counts as yours");
        }

        Self {
            probe: Box::new(WorkTree::new(git.root())),
            host: Box::new(GitIndexHost::new(git.git_dir())),
            scheduler: RefreshScheduler::new(settings.refresh_interval_minutes),
            identity,
            settings,
            git,
            queue,
            prompter,
            snapshot: Arc::new(LockSnapshot::empty()),
            loaded: false,
            ignore: IgnoreList::new(),
            uncommitted: UncommittedTracker::new(),
            refreshing: false,
            listeners: Vec::new(),
        }
    }

    /// Replace the file-existence capability.
    pub fn with_probe(mut self, probe: impl FileProbe + 'static) -> Self {
        self.probe = Box::new(probe);
        self
    }

    /// Replace the busy-state capability.
    pub fn with_host(mut self, host: impl HostState + 'static) -> Self {
        self.host = Box::new(host);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn git(&self) -> &Git {
        &self.git
    }

    // =========================================================================
    // Read-only views
    // =========================================================================

    /// The published snapshot. Holding the `Arc` keeps that version alive
    /// across later refreshes.
    pub fn snapshot(&self) -> Arc<LockSnapshot> {
        Arc::clone(&self.snapshot)
    }

    /// True once a structured listing has been installed.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn is_refreshing(&self) -> bool {
        self.refreshing
    }

    pub fn last_refresh(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.scheduler.last_refresh()
    }

    /// Locks held by the current user, in snapshot order.
    pub fn own_locks(&self) -> Vec<&LockRecord> {
        self.snapshot.owned_by(&self.identity).collect()
    }

    /// Locks held by anyone else, in snapshot order.
    pub fn other_locks(&self) -> Vec<&LockRecord> {
        self.snapshot.not_owned_by(&self.identity).collect()
    }

    pub fn find(&self, path: &str) -> Option<&LockRecord> {
        self.snapshot.find(path)
    }

    /// True if `path` could be locked: a listing has loaded, the extension is
    /// not ignored and nobody holds it.
    pub fn is_available_to_lock(&self, path: &str) -> bool {
        self.loaded && !self.settings.is_ignored(path) && self.find(path).is_none()
    }

    /// True if `path` could be unlocked: a listing has loaded, the extension
    /// is not ignored and the current user holds it.
    pub fn is_available_to_unlock(&self, path: &str) -> bool {
        self.loaded
            && !self.settings.is_ignored(path)
            && self.find(path).is_some_and(|r| self.identity.owns(r))
    }

    pub fn ignore_list(&self) -> &IgnoreList {
        &self.ignore
    }

    /// The uncommitted set, rebuilt first if it is dirty.
    pub fn uncommitted(&mut self) -> &UncommittedFiles {
        self.uncommitted.ensure_fresh(&self.git, self.probe.as_ref())
    }

    /// Locks that currently conflict with local changes.
    pub fn conflicting_locks(&mut self) -> Vec<LockRecord> {
        self.uncommitted.ensure_fresh(&self.git, self.probe.as_ref());
        let files = self.uncommitted.files();
        self.snapshot
            .records()
            .iter()
            .filter(|r| is_conflicting(r, files, &self.identity))
            .cloned()
            .collect()
    }

    /// Compute the upstream-modified set. Expensive: fetches every tracked branch.
    pub fn remote_modified(&self) -> Result<RemoteModifiedFiles, GitError> {
        RemoteModifiedFiles::build(
            &self.git,
            &self.settings.remote,
            &self.settings.extra_branches_to_check,
            self.probe.as_ref(),
        )
    }

    // =========================================================================
    // Change notification
    // =========================================================================

    /// Register a repaint callback.
    pub fn subscribe(&mut self, listener: impl Fn() + 'static) {
        self.listeners.push(Box::new(listener));
    }

    fn notify(&self) {
        for listener in &self.listeners {
            listener();
        }
    }

    fn normalize_all(paths: &[String]) -> Vec<String> {
        paths
            .iter()
            .map(|p| normalize_path(p.trim()))
            .filter(|p| !p.is_empty())
            .collect()
    }
}
