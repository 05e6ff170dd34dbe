//! Lockwatch - advisory Git LFS lock coordination for binary assets
//!
//! Lockwatch keeps a local, periodically refreshed picture of which files
//! are locked on a Git LFS server and who holds them. It warns when you
//! edit something another person has locked, batches lock and unlock
//! requests, and checks whether a file changed upstream before you lock it.
//!
//! Locks are advisory: nothing here ever prevents a save, a commit or a
//! push. Lockwatch only tells you early that a push will be rejected.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface layer (parses args, delegates to engine)
//! - [`engine`] - Owns lock state; refresh protocol, hooks and requests
//! - [`core`] - Domain types, snapshots, conflict rules and configuration
//! - [`git`] - Single interface for all Git operations
//! - [`process`] - External command execution and the background worker
//! - [`ui`] - Prompts and terminal output
//!
//! # Invariants
//!
//! 1. The published lock snapshot is replaced whole, never edited in place
//! 2. At most one lock listing is in flight at a time
//! 3. A conflict is reported once per path until its lock goes away
//! 4. A failed refresh keeps the previous snapshot

pub mod cli;
pub mod core;
pub mod engine;
pub mod git;
pub mod process;
pub mod ui;
