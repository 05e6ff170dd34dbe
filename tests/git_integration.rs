//! Integration tests for the Git interface.
//!
//! These tests use real git repositories created via tempfile to verify
//! that the Git interface works correctly with actual git operations.
//! They are skipped when no `git` binary is available.

use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use tempfile::TempDir;

use lockwatch::core::host::WorkTree;
use lockwatch::core::remote_modified::RemoteModifiedFiles;
use lockwatch::core::uncommitted::UncommittedFiles;
use lockwatch::git::{Git, GitError};
use lockwatch::process::SystemRunner;

/// Test fixture that creates a real git repository.
struct TestRepo {
    dir: TempDir,
}

impl TestRepo {
    /// Create a new test repository with an initial commit on main.
    fn new() -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        init_repo(dir.path());

        // Create initial commit
        std::fs::create_dir_all(dir.path().join("Assets")).unwrap();
        std::fs::write(dir.path().join("README.md"), "# Test Repo\n").unwrap();
        std::fs::write(dir.path().join("Assets/hero.png"), "v1").unwrap();
        std::fs::write(dir.path().join("Assets/boss.png"), "v1").unwrap();
        run_git(dir.path(), &["add", "."]);
        run_git(dir.path(), &["commit", "-m", "Initial commit"]);

        Self { dir }
    }

    /// Clone `origin` into a fresh directory.
    fn clone_of(origin: &TestRepo) -> Self {
        let dir = TempDir::new().expect("failed to create temp dir");
        let status = Command::new("git")
            .arg("clone")
            .arg(origin.path())
            .arg(dir.path())
            .output()
            .expect("failed to run git clone");
        assert!(status.status.success(), "git clone failed");
        run_git(dir.path(), &["config", "user.email", "test@example.com"]);
        run_git(dir.path(), &["config", "user.name", "Test User"]);
        Self { dir }
    }

    /// Get the path to the repository.
    fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Open a Git interface to this repository.
    fn git(&self) -> Git {
        Git::open(self.path(), Arc::new(SystemRunner), Duration::from_secs(30))
            .expect("failed to open test repo")
    }

    fn write(&self, path: &str, content: &str) {
        std::fs::write(self.path().join(path), content).unwrap();
    }

    fn commit_all(&self, message: &str) {
        run_git(self.path(), &["add", "-A"]);
        run_git(self.path(), &["commit", "-m", message]);
    }
}

fn init_repo(path: &Path) {
    run_git(path, &["init"]);
    run_git(path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    run_git(path, &["config", "user.email", "test@example.com"]);
    run_git(path, &["config", "user.name", "Test User"]);
}

/// Run a git command in the given directory.
fn run_git(dir: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("failed to run git");

    if !output.status.success() {
        panic!(
            "git {:?} failed: {}",
            args,
            String::from_utf8_lossy(&output.stderr)
        );
    }
}

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

macro_rules! require_git {
    () => {
        if !git_available() {
            eprintln!("skipping: git not installed");
            return;
        }
    };
}

mod open {
    use super::*;

    #[test]
    fn discovers_root_from_subdirectory() {
        require_git!();
        let repo = TestRepo::new();
        let nested = repo.path().join("Assets");

        let git = Git::open(&nested, Arc::new(SystemRunner), Duration::from_secs(30)).unwrap();
        assert_eq!(
            git.root().canonicalize().unwrap(),
            repo.path().canonicalize().unwrap()
        );
        assert!(git.git_dir().ends_with(".git") || git.git_dir().ends_with(".git/"));
    }

    #[test]
    fn subdirectory_paths_resolve_against_root() {
        require_git!();
        let repo = TestRepo::new();
        let nested = repo.path().join("Assets");

        let git = Git::open(&nested, Arc::new(SystemRunner), Duration::from_secs(30)).unwrap();
        assert_eq!(git.repo_path(&nested, "hero.png").unwrap(), "Assets/hero.png");
        assert_eq!(git.repo_path(&nested, "../README.md").unwrap(), "README.md");
        assert_eq!(
            git.repo_path(repo.path(), "Assets/boss.png").unwrap(),
            "Assets/boss.png"
        );
    }

    #[test]
    fn paths_outside_tree_are_rejected() {
        require_git!();
        let repo = TestRepo::new();
        let nested = repo.path().join("Assets");
        let git = Git::open(&nested, Arc::new(SystemRunner), Duration::from_secs(30)).unwrap();

        let err = git.repo_path(&nested, "../../elsewhere.png").unwrap_err();
        assert!(matches!(err, GitError::OutsideRepository { .. }));
        assert!(git.repo_path(&nested, "..").is_err());
    }

    #[test]
    fn plain_directory_is_not_a_repo() {
        let dir = TempDir::new().unwrap();
        let result = Git::open(dir.path(), Arc::new(SystemRunner), Duration::from_secs(30));
        assert!(matches!(result, Err(GitError::NotARepo { .. })));
    }
}

mod queries {
    use super::*;

    #[test]
    fn version_is_parsed() {
        require_git!();
        let repo = TestRepo::new();
        let version = repo.git().version().unwrap();
        assert!(version.major >= 2);
    }

    #[test]
    fn current_branch_name() {
        require_git!();
        let repo = TestRepo::new();
        assert_eq!(repo.git().current_branch().unwrap(), "main");

        run_git(repo.path(), &["checkout", "-b", "feature/art"]);
        assert_eq!(repo.git().current_branch().unwrap(), "feature/art");
    }

    #[test]
    fn detached_head_reports_head() {
        require_git!();
        let repo = TestRepo::new();
        run_git(repo.path(), &["checkout", "--detach"]);
        assert_eq!(repo.git().current_branch().unwrap(), "HEAD");
    }

    #[test]
    fn failing_command_carries_stderr() {
        require_git!();
        let repo = TestRepo::new();
        let err = repo.git().fetch("nowhere", "main").unwrap_err();
        assert!(matches!(err, GitError::CommandFailed { .. }));
    }
}

mod uncommitted {
    use super::*;

    #[test]
    fn staged_and_unstaged_changes_are_collected() {
        require_git!();
        let repo = TestRepo::new();
        repo.write("Assets/hero.png", "v2");
        repo.write("Assets/new.png", "v1");
        run_git(repo.path(), &["add", "Assets/new.png"]);

        let git = repo.git();
        let files = UncommittedFiles::compute(&git, &WorkTree::new(git.root())).unwrap();

        let paths: Vec<&str> = files.iter().collect();
        assert_eq!(paths, vec!["Assets/hero.png", "Assets/new.png"]);
    }

    #[test]
    fn deleted_files_are_filtered_out() {
        require_git!();
        let repo = TestRepo::new();
        std::fs::remove_file(repo.path().join("Assets/boss.png")).unwrap();
        repo.write("Assets/hero.png", "v2");

        let git = repo.git();
        let files = UncommittedFiles::compute(&git, &WorkTree::new(git.root())).unwrap();

        assert!(files.contains("Assets/hero.png"));
        assert!(!files.contains("Assets/boss.png"));
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn clean_tree_is_empty() {
        require_git!();
        let repo = TestRepo::new();
        let git = repo.git();
        let files = UncommittedFiles::compute(&git, &WorkTree::new(git.root())).unwrap();
        assert!(files.is_empty());
    }
}

mod remote_modified {
    use super::*;

    #[test]
    fn upstream_commits_are_found() {
        require_git!();
        let origin = TestRepo::new();
        let local = TestRepo::clone_of(&origin);

        origin.write("Assets/hero.png", "upstream");
        origin.commit_all("Retouch hero");

        let git = local.git();
        let files =
            RemoteModifiedFiles::build(&git, "origin", "", &WorkTree::new(git.root())).unwrap();

        assert!(files.contains("Assets/hero.png"));
        assert!(!files.contains("Assets/boss.png"));
    }

    #[test]
    fn merged_changes_are_not_reported() {
        require_git!();
        let origin = TestRepo::new();
        let local = TestRepo::clone_of(&origin);

        origin.write("Assets/hero.png", "upstream");
        origin.commit_all("Retouch hero");
        run_git(local.path(), &["pull", "--ff-only", "origin", "main"]);

        let git = local.git();
        let files =
            RemoteModifiedFiles::build(&git, "origin", "", &WorkTree::new(git.root())).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn missing_extra_branch_is_skipped() {
        require_git!();
        let origin = TestRepo::new();
        let local = TestRepo::clone_of(&origin);

        origin.write("Assets/boss.png", "upstream");
        origin.commit_all("Retouch boss");

        let git = local.git();
        let files = RemoteModifiedFiles::build(
            &git,
            "origin",
            "does-not-exist",
            &WorkTree::new(git.root()),
        )
        .unwrap();
        assert!(files.contains("Assets/boss.png"));
    }
}
