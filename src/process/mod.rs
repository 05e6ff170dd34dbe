//! process
//!
//! External command execution.
//!
//! # Modules
//!
//! - [`runner`] - Blocking execution with a deadline
//! - [`queue`] - Serialized background execution with staged completions
//! - [`mock`] - Deterministic runner for tests
//!
//! # Concurrency
//!
//! The only genuine parallelism in Lockwatch is the OS subprocess started
//! from the [`queue::AsyncQueue`] worker. Completions are staged into a
//! bounded channel and interpreted on the caller's next tick; nothing
//! delivered from the worker touches engine state directly.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use lockwatch::process::{CommandRunner, CommandSpec, SystemRunner};
//!
//! let runner = SystemRunner;
//! let result = runner.run(&CommandSpec::git(["--version"]), Duration::from_secs(30));
//! if result.is_ok() {
//!     println!("{}", result.stdout.trim());
//! }
//! ```

pub mod mock;
pub mod queue;
pub mod runner;

pub use queue::{AsyncCompletion, AsyncKind, AsyncQueue, AsyncReply, AsyncRequest};
pub use runner::{CommandRunner, CommandSpec, ProcessOutcome, ProcessResult, SystemRunner};

use thiserror::Error;

/// Errors from the background queue.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProcessError {
    /// The worker thread is gone; no further requests can run.
    #[error("background command queue is closed")]
    QueueClosed,

    /// Too many requests are waiting to run.
    #[error("background command queue is full ({0} pending)")]
    QueueFull(usize),
}
