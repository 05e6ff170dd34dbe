//! core::remote_modified
//!
//! Files changed upstream that are not merged locally yet.
//!
//! For every tracked branch (configured extras plus the current branch) the
//! branch is fetched, the commits on `<remote>/<branch>` missing from the
//! current branch are listed, and the files each of those commits touched
//! are collected. Only files that exist in the working tree are kept.
//!
//! This is expensive (one fetch per branch, one diff per commit) and is
//! never cached. Build it once per user action, not per path.

use std::collections::BTreeSet;

use super::host::FileProbe;
use super::types::normalize_path;
use crate::git::{Git, GitError};

/// Split a comma-separated branch list, dropping blanks and duplicates.
pub fn parse_branch_list(raw: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for name in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if !out.iter().any(|b| b == name) {
            out.push(name.to_string());
        }
    }
    out
}

/// Paths touched by unmerged upstream commits.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteModifiedFiles {
    paths: BTreeSet<String>,
}

impl RemoteModifiedFiles {
    /// Query the remote for every tracked branch.
    ///
    /// # Errors
    ///
    /// Fails only when the current branch cannot be determined. A branch
    /// that cannot be fetched or compared is logged and skipped.
    pub fn build(
        git: &Git,
        remote: &str,
        extra_branches: &str,
        probe: &dyn FileProbe,
    ) -> Result<Self, GitError> {
        let current = git.current_branch()?;

        let mut branches = parse_branch_list(extra_branches);
        if current != "HEAD" && !branches.contains(&current) {
            branches.push(current.clone());
        }

        let mut paths = BTreeSet::new();
        for branch in &branches {
            if let Err(e) = git.fetch(remote, branch) {
                tracing::warn!("skipping {}/{}: {}", remote, branch, e);
                continue;
            }
            let commits = match git.remote_only_commits(&current, remote, branch) {
                Ok(commits) => commits,
                Err(e) => {
                    tracing::warn!("skipping {}/{}: {}", remote, branch, e);
                    continue;
                }
            };
            tracing::debug!(
                "{} commit(s) on {}/{} not in {}",
                commits.len(),
                remote,
                branch,
                current
            );
            for commit in &commits {
                match git.commit_files(commit) {
                    Ok(files) => paths.extend(
                        files
                            .iter()
                            .map(|f| normalize_path(f))
                            .filter(|f| probe.exists(f)),
                    ),
                    Err(e) => tracing::warn!("failed to list files of {}: {}", commit, e),
                }
            }
        }

        Ok(Self { paths })
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(&normalize_path(path))
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::process::mock::MockRunner;
    use crate::process::{ProcessOutcome, ProcessResult};
    use std::path::PathBuf;
    use std::sync::Arc;
    use std::time::Duration;

    struct Everything;

    impl FileProbe for Everything {
        fn exists(&self, path: &str) -> bool {
            !path.starts_with("deleted/")
        }
    }

    fn git(mock: &MockRunner) -> Git {
        Git::with_root(
            PathBuf::from("/repo"),
            PathBuf::from("/repo/.git"),
            Arc::new(mock.clone()),
            Duration::from_secs(5),
        )
    }

    #[test]
    fn branch_list_parsing() {
        assert_eq!(parse_branch_list(""), Vec::<String>::new());
        assert_eq!(
            parse_branch_list(" develop, release ,,develop"),
            vec!["develop", "release"]
        );
    }

    #[test]
    fn collects_files_from_all_branches() {
        let mock = MockRunner::new();
        mock.respond_ok("git rev-parse --abbrev-ref HEAD", "main\n");
        mock.respond_ok("git rev-list main..origin/develop", "c1\n");
        mock.respond_ok("git rev-list main..origin/main", "c2\nc3\n");
        mock.respond_ok("git diff-tree --no-commit-id --name-only -r c1", "Assets/a.png\n");
        mock.respond_ok(
            "git diff-tree --no-commit-id --name-only -r c2",
            "Assets\\b.png\ndeleted/x.png\n",
        );
        mock.respond_ok("git diff-tree --no-commit-id --name-only -r c3", "Assets/a.png\n");

        let set = RemoteModifiedFiles::build(&git(&mock), "origin", "develop", &Everything).unwrap();
        let files: Vec<_> = set.iter().collect();
        assert_eq!(files, vec!["Assets/a.png", "Assets/b.png"]);
        assert_eq!(mock.call_count("git fetch origin develop"), 1);
        assert_eq!(mock.call_count("git fetch origin main"), 1);
    }

    #[test]
    fn unfetchable_branch_is_skipped() {
        let mock = MockRunner::new();
        mock.respond_ok("git rev-parse --abbrev-ref HEAD", "main\n");
        mock.respond(
            "git fetch origin gone",
            ProcessResult {
                stdout: String::new(),
                stderr: "fatal: couldn't find remote ref gone".to_string(),
                outcome: ProcessOutcome::Ok,
                exit_code: Some(128),
            },
        );
        mock.respond_ok("git rev-list main..origin/main", "c1\n");
        mock.respond_ok("git diff-tree --no-commit-id --name-only -r c1", "a.png\n");

        let set = RemoteModifiedFiles::build(&git(&mock), "origin", "gone", &Everything).unwrap();
        assert!(set.contains("a.png"));
        assert_eq!(mock.call_count("git rev-list main..origin/gone"), 0);
    }

    #[test]
    fn detached_head_checks_extras_only() {
        let mock = MockRunner::new();
        mock.respond_ok("git rev-parse --abbrev-ref HEAD", "HEAD\n");
        let set = RemoteModifiedFiles::build(&git(&mock), "origin", "", &Everything).unwrap();
        assert!(set.is_empty());
        assert_eq!(mock.calls(), vec!["git rev-parse --abbrev-ref HEAD"]);
    }
}
