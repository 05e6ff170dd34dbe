//! ui::output
//!
//! Terminal rendering for lock listings and command messages.
//!
//! Lock tables and plain messages go to stdout so they can be piped.
//! Warnings go to stderr. `--quiet` suppresses both; `list --json`
//! bypasses this module entirely.

use std::fmt::Display;

use crate::core::types::{Identity, LockRecord};

/// How chatty command output should be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    /// `--quiet`: results only, no chatter.
    Quiet,
    Normal,
    /// `--debug` or `debug = true` in the settings.
    Debug,
}

impl Verbosity {
    /// Quiet wins over debug when both are given.
    pub fn from_flags(quiet: bool, debug: bool) -> Self {
        match (quiet, debug) {
            (true, _) => Self::Quiet,
            (false, true) => Self::Debug,
            (false, false) => Self::Normal,
        }
    }

    pub fn is_quiet(self) -> bool {
        self == Self::Quiet
    }
}

/// Informational line on stdout, dropped under `--quiet`.
pub fn print(message: impl Display, verbosity: Verbosity) {
    if !verbosity.is_quiet() {
        println!("{message}");
    }
}

/// `warning:`-prefixed line on stderr, dropped under `--quiet`.
pub fn warn(message: impl Display, verbosity: Verbosity) {
    if !verbosity.is_quiet() {
        eprintln!("warning: {message}");
    }
}

/// One table row per lock: marker, owner, lock time, path.
///
/// Locks held by `identity` are marked with `*`.
pub fn format_lock(record: &LockRecord, identity: &Identity) -> String {
    let marker = if identity.owns(record) { '*' } else { ' ' };
    format!(
        "{} {:<16} {}  {}",
        marker,
        record.owner_name(),
        record.locked_at.format("%Y-%m-%d %H:%M"),
        record.path
    )
}

/// Join `items` one per line, each behind `prefix`.
pub fn format_list<T: Display>(items: &[T], prefix: &str) -> String {
    let lines: Vec<String> = items.iter().map(|item| format!("{prefix}{item}")).collect();
    lines.join("\n")
}
