//! process::queue
//!
//! Serialized background execution.
//!
//! # Architecture
//!
//! One worker thread receives [`AsyncRequest`]s and runs them strictly one at
//! a time, in submission order. Each finished run is staged as an
//! [`AsyncCompletion`] into a bounded channel. The owner drains that channel
//! on its own tick; the worker never interprets results.
//!
//! Every asynchronous invocation goes through this single queue, so two
//! background git commands can never overlap. The engine's "refreshing" flag
//! only prevents *submitting* a second lock listing; the queue is what keeps
//! the diagnostic listing from racing the structured one.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};

use super::runner::{CommandRunner, CommandSpec, ProcessOutcome};
use super::ProcessError;

/// What a background request is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsyncKind {
    /// Structured lock listing whose payload feeds the snapshot.
    LockListing,
    /// Human-readable listing, shown for diagnostics only.
    DiagnosticListing,
}

/// A command queued for background execution.
#[derive(Debug, Clone)]
pub struct AsyncRequest {
    pub kind: AsyncKind,
    pub spec: CommandSpec,
}

/// Tagged result of a background run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AsyncReply {
    /// The process exited; stderr text, if any, rides along with the payload.
    Payload { stdout: String, stderr: String },
    /// The process never started or was abandoned at its deadline.
    Error(String),
}

/// A staged completion waiting for the next tick.
#[derive(Debug, Clone)]
pub struct AsyncCompletion {
    pub kind: AsyncKind,
    pub reply: AsyncReply,
}

/// Single-worker FIFO for background commands.
pub struct AsyncQueue {
    requests: Sender<AsyncRequest>,
    completions: Receiver<AsyncCompletion>,
    outstanding: Arc<AtomicUsize>,
}

impl AsyncQueue {
    /// Maximum number of requests or undrained completions held at once.
    pub const CAPACITY: usize = 8;

    /// Start the worker thread.
    ///
    /// `timeout` bounds each background run; a run that exceeds it is
    /// reported as [`AsyncReply::Error`].
    pub fn spawn(runner: Arc<dyn CommandRunner>, timeout: Duration) -> Self {
        let (request_tx, request_rx) = bounded::<AsyncRequest>(Self::CAPACITY);
        let (completion_tx, completion_rx) = bounded::<AsyncCompletion>(Self::CAPACITY);

        let spawned = thread::Builder::new()
            .name("lockwatch-async".to_string())
            .spawn(move || {
                for request in request_rx {
                    let result = runner.run(&request.spec, timeout);
                    let reply = match result.outcome {
                        ProcessOutcome::Ok => AsyncReply::Payload {
                            stdout: result.stdout,
                            stderr: result.stderr,
                        },
                        ProcessOutcome::Timeout | ProcessOutcome::LaunchFailure => {
                            AsyncReply::Error(result.stderr)
                        }
                    };
                    let completion = AsyncCompletion {
                        kind: request.kind,
                        reply,
                    };
                    if completion_tx.send(completion).is_err() {
                        break;
                    }
                }
            });

        if let Err(e) = spawned {
            // The request receiver was dropped with the closure; submit()
            // will report QueueClosed from here on.
            tracing::error!("failed to start background worker: {}", e);
        }

        Self {
            requests: request_tx,
            completions: completion_rx,
            outstanding: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queue a request behind any already waiting.
    pub fn submit(&self, request: AsyncRequest) -> Result<(), ProcessError> {
        tracing::debug!("queueing {:?}: {}", request.kind, request.spec);
        match self.requests.try_send(request) {
            Ok(()) => {
                self.outstanding.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
            Err(TrySendError::Full(_)) => Err(ProcessError::QueueFull(Self::CAPACITY)),
            Err(TrySendError::Disconnected(_)) => Err(ProcessError::QueueClosed),
        }
    }

    /// Take every completion staged since the last drain, oldest first.
    pub fn drain(&self) -> Vec<AsyncCompletion> {
        let drained: Vec<_> = self.completions.try_iter().collect();
        if !drained.is_empty() {
            self.outstanding.fetch_sub(drained.len(), Ordering::SeqCst);
        }
        drained
    }

    /// Requests submitted whose completion has not been drained yet.
    pub fn outstanding(&self) -> usize {
        self.outstanding.load(Ordering::SeqCst)
    }
}

impl std::fmt::Debug for AsyncQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncQueue")
            .field("outstanding", &self.outstanding())
            .finish()
    }
}
