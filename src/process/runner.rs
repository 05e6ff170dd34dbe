//! process::runner
//!
//! Blocking command execution with a deadline.
//!
//! Output is collected line by line on two reader threads so a chatty child
//! cannot deadlock on a full pipe. The caller polls the child until it exits
//! or the deadline passes. A timed-out child is killed and its readers are
//! abandoned; the result of a timed-out run is never data.

use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// How a command run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// The process exited on its own (any exit code).
    Ok,
    /// The deadline passed before the process exited.
    Timeout,
    /// The executable could not be started.
    LaunchFailure,
}

/// Captured output of one command run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    pub stdout: String,
    pub stderr: String,
    pub outcome: ProcessOutcome,
    /// Exit code, when the process exited normally.
    pub exit_code: Option<i32>,
}

impl ProcessResult {
    /// A normal exit with the given streams.
    pub fn ok(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: stderr.into(),
            outcome: ProcessOutcome::Ok,
            exit_code: Some(0),
        }
    }

    /// A run abandoned at its deadline.
    pub fn timeout(description: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: format!("process timed out ({})", description.into()),
            outcome: ProcessOutcome::Timeout,
            exit_code: None,
        }
    }

    /// A run that never started.
    pub fn launch_failure(message: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: message.into(),
            outcome: ProcessOutcome::LaunchFailure,
            exit_code: None,
        }
    }

    /// True when the process exited on its own.
    ///
    /// A non-zero exit code still counts: some "no results" states are only
    /// reported through the output text.
    pub fn is_ok(&self) -> bool {
        self.outcome == ProcessOutcome::Ok
    }

    /// Stdout split into trimmed, non-empty lines.
    pub fn stdout_lines(&self) -> impl Iterator<Item = &str> {
        self.stdout
            .lines()
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
    }
}

/// A command to run: program, argv and working directory.
///
/// Arguments are passed as discrete argv elements, so paths containing
/// spaces need no quoting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
}

impl CommandSpec {
    pub fn new<I, S>(program: impl Into<String>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            cwd: None,
        }
    }

    /// A `git` invocation.
    pub fn git<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new("git", args)
    }

    /// Run the command from `dir`.
    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    /// Program and arguments joined by single spaces, unquoted.
    ///
    /// Used as a lookup key by [`super::mock::MockRunner`].
    pub fn command_line(&self) -> String {
        if self.args.is_empty() {
            self.program.clone()
        } else {
            format!("{} {}", self.program, self.args.join(" "))
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Something that can run a command to completion or deadline.
///
/// Implementations must be shareable with the background worker.
pub trait CommandRunner: Send + Sync {
    /// Run `spec`, blocking the caller for at most `timeout`.
    fn run(&self, spec: &CommandSpec, timeout: Duration) -> ProcessResult;
}

/// Runs commands as real OS processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, spec: &CommandSpec, timeout: Duration) -> ProcessResult {
        match &spec.cwd {
            Some(dir) => tracing::debug!("$ {} [{}]", spec, dir.display()),
            None => tracing::debug!("$ {}", spec),
        }

        let mut cmd = Command::new(&spec.program);
        cmd.args(&spec.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &spec.cwd {
            cmd.current_dir(dir);
        }
        // Credential prompts would hang a background listing forever.
        if spec.program == "git" {
            cmd.env("GIT_TERMINAL_PROMPT", "0");
        }

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                tracing::error!("failed to launch {}: {}", spec.program, e);
                return ProcessResult::launch_failure(format!(
                    "failed to launch {}: {}",
                    spec.program, e
                ));
            }
        };

        let stdout_reader = collect_lines(child.stdout.take());
        let stderr_reader = collect_lines(child.stderr.take());

        let started = Instant::now();
        let deadline = started + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break Some(status),
                Ok(None) => {
                    if Instant::now() >= deadline {
                        let _ = child.kill();
                        let _ = child.wait();
                        // Readers stay detached: a grandchild may still hold the pipes.
                        tracing::warn!("timed out after {:?}: {}", timeout, spec);
                        return ProcessResult::timeout(spec.to_string());
                    }
                    thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    tracing::warn!("failed to wait for {}: {}", spec, e);
                    break None;
                }
            }
        };

        let stdout = stdout_reader.join().unwrap_or_default();
        let stderr = stderr_reader.join().unwrap_or_default();
        let exit_code = status.and_then(|s| s.code());

        tracing::debug!(
            "[exit={:?}] {} ({} ms)",
            exit_code,
            spec,
            started.elapsed().as_millis()
        );

        ProcessResult {
            stdout,
            stderr,
            outcome: ProcessOutcome::Ok,
            exit_code,
        }
    }
}

/// Read a stream to EOF line by line on a background thread.
fn collect_lines<R: Read + Send + 'static>(stream: Option<R>) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut collected = String::new();
        if let Some(stream) = stream {
            for line in BufReader::new(stream).lines() {
                match line {
                    Ok(line) => {
                        collected.push_str(&line);
                        collected.push('\n');
                    }
                    Err(_) => break,
                }
            }
        }
        collected
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_line_joins_args() {
        let spec = CommandSpec::git(["lfs", "locks", "--json"]);
        assert_eq!(spec.command_line(), "git lfs locks --json");
    }

    #[test]
    fn display_quotes_paths_with_spaces() {
        let spec = CommandSpec::git(["lfs", "lock", "Assets/my file.png"]);
        assert_eq!(spec.to_string(), "git lfs lock \"Assets/my file.png\"");
    }

    #[test]
    fn stdout_lines_skips_blank_lines() {
        let result = ProcessResult::ok("a.png\n\n  b.png \r\n", "");
        let lines: Vec<_> = result.stdout_lines().collect();
        assert_eq!(lines, vec!["a.png", "b.png"]);
    }

    #[test]
    #[cfg(unix)]
    fn runs_fast_command() {
        let result = SystemRunner.run(
            &CommandSpec::new("echo", ["hello"]),
            Duration::from_secs(5),
        );
        assert!(result.is_ok());
        assert_eq!(result.exit_code, Some(0));
        assert!(result.stdout.contains("hello"));
    }

    #[test]
    #[cfg(unix)]
    fn nonzero_exit_is_still_ok_outcome() {
        let result = SystemRunner.run(
            &CommandSpec::new("sh", ["-c", "echo oops >&2; exit 3"]),
            Duration::from_secs(5),
        );
        assert_eq!(result.outcome, ProcessOutcome::Ok);
        assert_eq!(result.exit_code, Some(3));
        assert!(result.stderr.contains("oops"));
    }

    #[test]
    #[cfg(unix)]
    fn slow_command_times_out() {
        let result = SystemRunner.run(
            &CommandSpec::new("sleep", ["10"]),
            Duration::from_millis(50),
        );
        assert_eq!(result.outcome, ProcessOutcome::Timeout);
        assert!(result.stdout.is_empty());
        assert!(result.stderr.contains("timed out"));
    }

    #[test]
    fn missing_executable_is_launch_failure() {
        let result = SystemRunner.run(
            &CommandSpec::new("lockwatch-definitely-not-a-binary", Vec::<String>::new()),
            Duration::from_secs(5),
        );
        assert_eq!(result.outcome, ProcessOutcome::LaunchFailure);
        assert!(result.stderr.contains("failed to launch"));
    }

    #[test]
    #[cfg(unix)]
    fn runs_in_working_directory() {
        let dir = tempfile::TempDir::new().unwrap();
        std::fs::write(dir.path().join("marker.txt"), "x").unwrap();
        let result = SystemRunner.run(
            &CommandSpec::new("ls", Vec::<String>::new()).in_dir(dir.path()),
            Duration::from_secs(5),
        );
        assert!(result.stdout.contains("marker.txt"));
    }
}
