//! git::interface
//!
//! Git CLI interface.
//!
//! # Error Handling
//!
//! Failures are categorized so callers can tell "git could not run" from
//! "git ran and said no":
//! - [`GitError::NotARepo`]: discovery found no repository
//! - [`GitError::Launch`]: the git executable could not be started
//! - [`GitError::Timeout`]: git did not finish before the deadline
//! - [`GitError::CommandFailed`]: git exited non-zero

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::core::paths::repo_relative;
use crate::process::{CommandRunner, CommandSpec, ProcessOutcome, ProcessResult};

/// Errors from Git operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// Not inside a Git repository.
    #[error("not a git repository: {path}")]
    NotARepo {
        /// The path that was searched
        path: PathBuf,
    },

    /// Repository is bare (no working directory).
    #[error("bare repository not supported")]
    BareRepo,

    /// The git executable could not be started.
    #[error("failed to run `{command}`: {message}")]
    Launch {
        /// The command line
        command: String,
        /// OS error text
        message: String,
    },

    /// Git did not finish in time; its output is undefined.
    #[error("`{command}` timed out")]
    Timeout {
        /// The command line
        command: String,
    },

    /// Git exited with a failure status.
    #[error("`{command}` failed: {stderr}")]
    CommandFailed {
        /// The command line
        command: String,
        /// Exit code, if any
        code: Option<i32>,
        /// Trimmed stderr (or stdout when stderr was empty)
        stderr: String,
    },

    /// A command-line path does not name anything inside the working tree.
    #[error("'{path}' is outside repository {root}")]
    OutsideRepository {
        /// The path as given
        path: String,
        /// The working tree root
        root: PathBuf,
    },

    /// Output could not be understood.
    #[error("unexpected output from `{command}`: {output}")]
    UnexpectedOutput {
        /// The command line
        command: String,
        /// The offending output
        output: String,
    },

    /// Internal git2 error.
    #[error("git error: {message}")]
    Internal {
        /// The error message
        message: String,
    },
}

/// Parsed `git --version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct GitVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl GitVersion {
    /// Oldest version whose bundled credential manager handles LFS auth.
    pub const MINIMUM: GitVersion = GitVersion {
        major: 2,
        minor: 30,
        patch: 0,
    };

    /// Parse output such as `git version 2.42.0.windows.1`.
    pub fn parse(output: &str) -> Option<Self> {
        let token = output
            .split_whitespace()
            .find(|t| t.starts_with(|c: char| c.is_ascii_digit()))?;
        let mut parts = token.split('.').map(|p| p.parse::<u32>());
        let major = parts.next()?.ok()?;
        let minor = parts.next()?.ok()?;
        let patch = parts.next().and_then(|p| p.ok()).unwrap_or(0);
        Some(Self {
            major,
            minor,
            patch,
        })
    }

    /// True when older than [`GitVersion::MINIMUM`].
    pub fn is_outdated(&self) -> bool {
        *self < Self::MINIMUM
    }
}

impl std::fmt::Display for GitVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Git CLI doorway bound to one working tree.
#[derive(Clone)]
pub struct Git {
    runner: Arc<dyn CommandRunner>,
    root: PathBuf,
    git_dir: PathBuf,
    timeout: Duration,
}

impl std::fmt::Debug for Git {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Git")
            .field("root", &self.root)
            .field("git_dir", &self.git_dir)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl Git {
    /// Discover the repository containing `path`.
    ///
    /// `timeout` bounds every blocking query made through this handle.
    pub fn open(
        path: &Path,
        runner: Arc<dyn CommandRunner>,
        timeout: Duration,
    ) -> Result<Self, GitError> {
        let repo = git2::Repository::discover(path).map_err(|e| {
            if e.code() == git2::ErrorCode::NotFound {
                GitError::NotARepo {
                    path: path.to_path_buf(),
                }
            } else {
                GitError::Internal {
                    message: e.message().to_string(),
                }
            }
        })?;
        let root = repo.workdir().ok_or(GitError::BareRepo)?.to_path_buf();
        let git_dir = repo.path().to_path_buf();
        Ok(Self::with_root(root, git_dir, runner, timeout))
    }

    /// Bind to a known working tree without discovery.
    pub fn with_root(
        root: PathBuf,
        git_dir: PathBuf,
        runner: Arc<dyn CommandRunner>,
        timeout: Duration,
    ) -> Self {
        Self {
            runner,
            root,
            git_dir,
            timeout,
        }
    }

    /// Working tree root; every command runs from here.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The repository's git directory.
    pub fn git_dir(&self) -> &Path {
        &self.git_dir
    }

    /// Rewrite a path typed from `cwd` relative to the working tree root.
    ///
    /// Tried lexically first, then again with both sides canonicalized so a
    /// relative `cwd` or a symlinked checkout still resolves.
    pub fn repo_path(&self, cwd: &Path, arg: &str) -> Result<String, GitError> {
        repo_relative(&self.root, cwd, arg)
            .or_else(|| repo_relative(&canonical(&self.root), &canonical(cwd), arg))
            .ok_or_else(|| GitError::OutsideRepository {
                path: arg.to_string(),
                root: self.root.clone(),
            })
    }

    /// The runner shared with the background queue.
    pub fn runner(&self) -> Arc<dyn CommandRunner> {
        Arc::clone(&self.runner)
    }

    fn spec<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::git(args).in_dir(&self.root)
    }

    /// Run and map launch/timeout outcomes to errors. Non-zero exits pass.
    fn run(&self, spec: CommandSpec) -> Result<ProcessResult, GitError> {
        let result = self.runner.run(&spec, self.timeout);
        match result.outcome {
            ProcessOutcome::Ok => Ok(result),
            ProcessOutcome::Timeout => Err(GitError::Timeout {
                command: spec.to_string(),
            }),
            ProcessOutcome::LaunchFailure => Err(GitError::Launch {
                command: spec.to_string(),
                message: result.stderr.trim().to_string(),
            }),
        }
    }

    /// Run and additionally fail on a non-zero exit or a signal kill.
    fn run_checked(&self, spec: CommandSpec) -> Result<ProcessResult, GitError> {
        let command = spec.to_string();
        let result = self.run(spec)?;
        match result.exit_code {
            Some(0) => Ok(result),
            code => {
                let text = if result.stderr.trim().is_empty() {
                    result.stdout.trim()
                } else {
                    result.stderr.trim()
                };
                Err(GitError::CommandFailed {
                    command,
                    code,
                    stderr: text.to_string(),
                })
            }
        }
    }

    fn lines(result: &ProcessResult) -> Vec<String> {
        result.stdout_lines().map(str::to_string).collect()
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Installed git version.
    pub fn version(&self) -> Result<GitVersion, GitError> {
        let spec = self.spec(["--version"]);
        let command = spec.to_string();
        let result = self.run_checked(spec)?;
        GitVersion::parse(&result.stdout).ok_or_else(|| GitError::UnexpectedOutput {
            command,
            output: result.stdout.trim().to_string(),
        })
    }

    /// First line of `git lfs version`.
    pub fn lfs_version(&self) -> Result<String, GitError> {
        let result = self.run_checked(self.spec(["lfs", "version"]))?;
        let first = result.stdout_lines().next().unwrap_or_default().to_string();
        Ok(first)
    }

    /// Name of the checked-out branch (`HEAD` when detached).
    pub fn current_branch(&self) -> Result<String, GitError> {
        let spec = self.spec(["rev-parse", "--abbrev-ref", "HEAD"]);
        let command = spec.to_string();
        let result = self.run_checked(spec)?;
        let branch = result.stdout_lines().next().map(str::to_string);
        branch.ok_or_else(|| GitError::UnexpectedOutput {
            command,
            output: String::new(),
        })
    }

    /// Paths with staged (`staged = true`) or unstaged changes.
    pub fn diff_names(&self, staged: bool) -> Result<Vec<String>, GitError> {
        let spec = if staged {
            self.spec(["diff", "--name-only", "--staged"])
        } else {
            self.spec(["diff", "--name-only"])
        };
        Ok(Self::lines(&self.run_checked(spec)?))
    }

    /// Fetch a single branch from `remote`.
    pub fn fetch(&self, remote: &str, branch: &str) -> Result<(), GitError> {
        self.run_checked(self.spec(["fetch", remote, branch]))?;
        Ok(())
    }

    /// Commits on `remote/branch` that are not reachable from `current`.
    pub fn remote_only_commits(
        &self,
        current: &str,
        remote: &str,
        branch: &str,
    ) -> Result<Vec<String>, GitError> {
        let range = format!("{}..{}/{}", current, remote, branch);
        Ok(Self::lines(&self.run_checked(self.spec(["rev-list".to_string(), range]))?))
    }

    /// Files touched by a single commit.
    pub fn commit_files(&self, commit: &str) -> Result<Vec<String>, GitError> {
        let spec = self.spec(["diff-tree", "--no-commit-id", "--name-only", "-r", commit]);
        Ok(Self::lines(&self.run_checked(spec)?))
    }

    // =========================================================================
    // LFS locking
    // =========================================================================

    /// Structured lock listing, run in the background.
    pub fn listing_spec(&self) -> CommandSpec {
        self.spec(["lfs", "locks", "--json"])
    }

    /// Human-readable lock listing, used to surface errors hidden by an
    /// empty structured result.
    pub fn diagnostic_listing_spec(&self) -> CommandSpec {
        self.spec(["lfs", "locks"])
    }

    /// Lock one batch of paths.
    ///
    /// A non-zero exit is returned as data: git-lfs reports per-file
    /// failures on stderr while still locking the rest of the batch.
    pub fn lfs_lock(&self, paths: &[String]) -> Result<ProcessResult, GitError> {
        let mut args = vec!["lfs".to_string(), "lock".to_string()];
        args.extend(paths.iter().cloned());
        self.run(self.spec(args))
    }

    /// Unlock one batch of paths.
    pub fn lfs_unlock(&self, paths: &[String], force: bool) -> Result<ProcessResult, GitError> {
        let mut args = vec!["lfs".to_string(), "unlock".to_string()];
        args.extend(paths.iter().cloned());
        if force {
            args.push("--force".to_string());
        }
        self.run(self.spec(args))
    }

    /// Configure `credential.helper`, globally or for this repository.
    pub fn set_credential_helper(&self, helper: &str, global: bool) -> Result<(), GitError> {
        let scope = if global { "--global" } else { "--local" };
        self.run_checked(self.spec(["config", scope, "credential.helper", helper]))?;
        Ok(())
    }
}

fn canonical(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}
