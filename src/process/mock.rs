//! process::mock
//!
//! Mock command runner for deterministic testing.
//!
//! # Design
//!
//! Responses are keyed by [`CommandSpec::command_line`]. Several responses
//! registered for the same command line are returned in order; the last one
//! repeats. Unknown command lines succeed with empty output. Every invocation
//! is recorded so tests can assert what was run and how often.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use lockwatch::process::mock::MockRunner;
//! use lockwatch::process::{CommandRunner, CommandSpec, ProcessResult};
//!
//! let mock = MockRunner::new();
//! mock.respond("git rev-parse --abbrev-ref HEAD", ProcessResult::ok("main\n", ""));
//!
//! let result = mock.run(
//!     &CommandSpec::git(["rev-parse", "--abbrev-ref", "HEAD"]),
//!     Duration::from_secs(1),
//! );
//! assert_eq!(result.stdout, "main\n");
//! assert_eq!(mock.calls().len(), 1);
//! ```

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use super::runner::{CommandRunner, CommandSpec, ProcessResult};

/// Mock runner for testing.
///
/// Thread-safe via internal `Arc<Mutex<...>>` wrapping; clones share state.
#[derive(Debug, Clone, Default)]
pub struct MockRunner {
    inner: Arc<Mutex<MockRunnerInner>>,
}

#[derive(Debug, Default)]
struct MockRunnerInner {
    responses: HashMap<String, VecDeque<ProcessResult>>,
    calls: Vec<String>,
}

impl MockRunner {
    /// Create a mock with no canned responses.
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, MockRunnerInner> {
        // A panicking test thread must not hide the recorded calls.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Queue a response for an exact command line.
    pub fn respond(&self, command_line: &str, result: ProcessResult) {
        self.lock()
            .responses
            .entry(command_line.to_string())
            .or_default()
            .push_back(result);
    }

    /// Queue a successful response with the given stdout.
    pub fn respond_ok(&self, command_line: &str, stdout: &str) {
        self.respond(command_line, ProcessResult::ok(stdout, ""));
    }

    /// Every command line run so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    /// How many times a command line was run.
    pub fn call_count(&self, command_line: &str) -> usize {
        self.lock()
            .calls
            .iter()
            .filter(|c| c.as_str() == command_line)
            .count()
    }

    /// Forget recorded calls; canned responses are kept.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }
}

impl CommandRunner for MockRunner {
    fn run(&self, spec: &CommandSpec, _timeout: Duration) -> ProcessResult {
        let key = spec.command_line();
        let mut inner = self.lock();
        inner.calls.push(key.clone());
        match inner.responses.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or_else(empty),
            Some(queue) => queue.front().cloned().unwrap_or_else(empty),
            None => empty(),
        }
    }
}

fn empty() -> ProcessResult {
    ProcessResult::ok("", "")
}
