//! core
//!
//! Core domain types and pure lock-state logic for Lockwatch.
//!
//! # Modules
//!
//! - [`types`] - Lock records, owners and identity
//! - [`snapshot`] - Structured listing parsing and the ordered snapshot
//! - [`conflict`] - Conflict rule and the warning ignore-list
//! - [`uncommitted`] - Local uncommitted change tracking
//! - [`remote_modified`] - Files changed upstream but not merged
//! - [`batch`] - Bounded request batching
//! - [`scheduler`] - Automatic refresh throttling
//! - [`host`] - Filesystem and busy-state capabilities
//! - [`config`] - Settings schema and loading
//! - [`paths`] - Per-repository storage locations
//! - [`instance`] - Single-watcher lock
//!
//! # Design Principles
//!
//! - Snapshots are immutable and replaced whole
//! - Anything that shells out goes through [`crate::git`]
//! - Host capabilities are traits, so logic is testable without a repo

pub mod batch;
pub mod config;
pub mod conflict;
pub mod host;
pub mod instance;
pub mod paths;
pub mod remote_modified;
pub mod scheduler;
pub mod snapshot;
pub mod types;
pub mod uncommitted;
