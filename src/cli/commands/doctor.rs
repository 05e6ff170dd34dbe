//! doctor command - Check the git and lockwatch setup

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};

use super::{load_settings, working_dir};
use crate::core::config::Config;
use crate::engine::Context;
use crate::git::{Git, GitError, GitVersion};
use crate::process::SystemRunner;

/// Diagnose the environment; with `setup_credentials`, also set the
/// global credential helper.
pub fn doctor(ctx: &Context, setup_credentials: bool) -> Result<()> {
    let settings = load_settings()?;
    let cwd = working_dir(ctx)?;
    let timeout = Duration::from_secs(settings.request_timeout_seconds);

    // Version checks work outside a repository too.
    let git = match Git::open(&cwd, Arc::new(SystemRunner), timeout) {
        Ok(git) => {
            println!("ok    repository at {}", git.root().display());
            git
        }
        Err(GitError::NotARepo { .. }) => {
            println!("warn  {} is not inside a git repository", cwd.display());
            Git::with_root(cwd.clone(), cwd.join(".git"), Arc::new(SystemRunner), timeout)
        }
        Err(e) => return Err(e).context("Failed to open repository"),
    };

    let mut failures = 0;

    match git.version() {
        Ok(version) if version.is_outdated() => println!(
            "warn  git {} is older than {}; the bundled credential manager needs an update",
            version,
            GitVersion::MINIMUM
        ),
        Ok(version) => println!("ok    git {}", version),
        Err(e) => {
            failures += 1;
            println!("fail  git not usable: {}", e);
        }
    }

    match git.lfs_version() {
        Ok(version) => println!("ok    {}", version),
        Err(e) => {
            failures += 1;
            println!("fail  git-lfs not usable: {}", e);
        }
    }

    if settings.host_username.trim().is_empty() {
        println!("warn  hostUsername is not set; run 'lw config set hostUsername <name>'");
    } else {
        println!("ok    hostUsername = {}", settings.host_username);
    }

    let config_path = Config::load()
        .context("Failed to load config")?
        .target_path()?;
    println!("info  settings file: {}", config_path.display());

    if setup_credentials {
        git.set_credential_helper(&settings.credential_helper, true)
            .context("Failed to configure credential.helper")?;
        println!(
            "ok    credential.helper set to '{}' globally",
            settings.credential_helper
        );
    }

    if failures > 0 {
        bail!("{} check(s) failed", failures);
    }
    if !ctx.quiet {
        println!("Setup looks usable.");
    }
    Ok(())
}
