//! ui::prompts
//!
//! Interactive prompts and confirmations.
//!
//! # Design
//!
//! The engine talks to the user only through the [`Prompter`] trait: a
//! blocking alert and a two-way confirmation. [`TerminalPrompter`] answers
//! on the terminal; in non-interactive mode every confirmation takes its
//! decline branch. [`ScriptedPrompter`] replays canned answers for tests.

use std::collections::VecDeque;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

/// Errors from prompts.
#[derive(Debug, Error)]
pub enum PromptError {
    #[error("prompt cancelled by user")]
    Cancelled,

    #[error("not in interactive mode")]
    NotInteractive,

    #[error("IO error: {0}")]
    IoError(String),
}

/// Blocking user notifications.
pub trait Prompter {
    /// Show a message the user must acknowledge.
    fn alert(&self, title: &str, message: &str);

    /// Ask a two-way question. `true` means the `accept` option was chosen.
    fn confirm(&self, title: &str, message: &str, accept: &str, decline: &str) -> bool;
}

/// Prompts on stdin/stderr.
#[derive(Debug, Clone, Copy)]
pub struct TerminalPrompter {
    interactive: bool,
}

impl TerminalPrompter {
    pub fn new(interactive: bool) -> Self {
        Self { interactive }
    }

    pub fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn ask(&self, accept: &str, decline: &str) -> Result<bool, PromptError> {
        if !self.interactive {
            return Err(PromptError::NotInteractive);
        }
        let mut stderr = io::stderr();
        write!(stderr, "  [y] {}  [n] {} > ", accept, decline)
            .and_then(|_| stderr.flush())
            .map_err(|e| PromptError::IoError(e.to_string()))?;

        let mut line = String::new();
        let read = io::stdin()
            .lock()
            .read_line(&mut line)
            .map_err(|e| PromptError::IoError(e.to_string()))?;
        if read == 0 {
            return Err(PromptError::Cancelled);
        }
        Ok(matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
    }
}

impl Prompter for TerminalPrompter {
    fn alert(&self, title: &str, message: &str) {
        eprintln!("== {} ==", title);
        eprintln!("{}", message);
    }

    fn confirm(&self, title: &str, message: &str, accept: &str, decline: &str) -> bool {
        self.alert(title, message);
        match self.ask(accept, decline) {
            Ok(answer) => answer,
            Err(e) => {
                tracing::warn!("{}: {}, choosing '{}'", title, e, decline);
                false
            }
        }
    }
}

/// One prompt shown through a [`ScriptedPrompter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRecord {
    pub title: String,
    pub message: String,
    /// `None` for alerts, the answer given for confirmations.
    pub answer: Option<bool>,
}

/// Replays queued confirmation answers and records every prompt.
///
/// With no answers queued, confirmations decline. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPrompter {
    inner: Arc<Mutex<ScriptedInner>>,
}

#[derive(Debug, Default)]
struct ScriptedInner {
    answers: VecDeque<bool>,
    shown: Vec<PromptRecord>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// A prompter that answers with `answers`, in order.
    pub fn answering(answers: impl IntoIterator<Item = bool>) -> Self {
        let prompter = Self::new();
        prompter.lock().answers.extend(answers);
        prompter
    }

    fn lock(&self) -> MutexGuard<'_, ScriptedInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn push_answer(&self, answer: bool) {
        self.lock().answers.push_back(answer);
    }

    /// Everything shown so far, in order.
    pub fn shown(&self) -> Vec<PromptRecord> {
        self.lock().shown.clone()
    }

    /// Alerts only.
    pub fn alerts(&self) -> Vec<PromptRecord> {
        self.shown().into_iter().filter(|p| p.answer.is_none()).collect()
    }

    /// Confirmations only.
    pub fn confirmations(&self) -> Vec<PromptRecord> {
        self.shown().into_iter().filter(|p| p.answer.is_some()).collect()
    }
}

impl Prompter for ScriptedPrompter {
    fn alert(&self, title: &str, message: &str) {
        self.lock().shown.push(PromptRecord {
            title: title.to_string(),
            message: message.to_string(),
            answer: None,
        });
    }

    fn confirm(&self, title: &str, message: &str, _accept: &str, _decline: &str) -> bool {
        let mut inner = self.lock();
        let answer = inner.answers.pop_front().unwrap_or(false);
        inner.shown.push(PromptRecord {
            title: title.to_string(),
            message: message.to_string(),
            answer: Some(answer),
        });
        answer
    }
}
