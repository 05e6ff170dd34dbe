//! cli::commands
//!
//! Command handlers.
//!
//! Each handler opens the repository named by the context, builds a
//! [`LockEngine`] over it and prints what the engine reports. Handlers
//! return `anyhow::Result` so failures surface with their context chain.

mod completion;
mod config_cmd;
mod doctor;
mod list;
mod lock;
mod remote_modified;
mod status;
mod unlock;
mod watch;

pub use completion::completion;
pub use doctor::doctor;
pub use list::list;
pub use lock::lock;
pub use remote_modified::remote_modified;
pub use status::status;
pub use unlock::unlock;
pub use watch::watch;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context as _, Result};

use super::args::{Command, ConfigAction};
use crate::core::config::{Config, Settings};
use crate::engine::{BatchOutcome, Context, LockEngine};
use crate::git::Git;
use crate::process::SystemRunner;
use crate::ui::output::{self, Verbosity};
use crate::ui::prompts::TerminalPrompter;

/// Dispatch a command to its handler.
pub fn dispatch(command: Command, ctx: &Context) -> Result<()> {
    match command {
        Command::List { mine, others, json } => list(ctx, mine, others, json),
        Command::Lock { paths } => lock(ctx, &paths),
        Command::Unlock {
            paths,
            force,
            all_mine,
        } => unlock(ctx, &paths, force, all_mine),
        Command::Status => status(ctx),
        Command::RemoteModified => remote_modified(ctx),
        Command::Watch { tick } => watch(ctx, Duration::from_secs(tick)),
        Command::Config { action } => match action {
            ConfigAction::Get { key } => config_cmd::get(ctx, &key),
            ConfigAction::Set { key, value } => config_cmd::set(ctx, &key, &value),
            ConfigAction::List => config_cmd::list(ctx),
            ConfigAction::Path => config_cmd::path(ctx),
        },
        Command::Doctor { setup_credentials } => doctor(ctx, setup_credentials),
        Command::Completion { shell } => completion(shell),
    }
}

/// Directory the command runs in.
fn working_dir(ctx: &Context) -> Result<PathBuf> {
    match &ctx.cwd {
        Some(cwd) => Ok(cwd.clone()),
        None => std::env::current_dir().context("Failed to determine current directory"),
    }
}

fn load_settings() -> Result<Settings> {
    let config = Config::load().context("Failed to load config")?;
    Ok(config.settings)
}

/// Open the repository containing the working directory.
fn open_git(ctx: &Context, settings: &Settings) -> Result<Git> {
    let cwd = working_dir(ctx)?;
    Git::open(
        &cwd,
        Arc::new(SystemRunner),
        Duration::from_secs(settings.request_timeout_seconds),
    )
    .context("Failed to open repository")
}

/// Build an engine for the current repository.
fn open_engine(ctx: &Context) -> Result<LockEngine> {
    let settings = load_settings()?;
    let git = open_git(ctx, &settings)?;
    let prompter = Arc::new(TerminalPrompter::new(ctx.interactive));
    Ok(LockEngine::new(git, settings, prompter))
}

/// Rewrite command-line paths relative to the repository root.
///
/// Fails on the first path outside the working tree so nothing is sent.
fn repo_paths(ctx: &Context, engine: &LockEngine, paths: &[String]) -> Result<Vec<String>> {
    let cwd = working_dir(ctx)?;
    paths
        .iter()
        .map(|path| engine.git().repo_path(&cwd, path).map_err(Into::into))
        .collect()
}

/// Run one refresh and wait for it to land.
fn fetch_listing(engine: &mut LockEngine) -> Result<()> {
    if !engine.settings().enabled {
        bail!("lockwatch is disabled (enabled = false)");
    }
    let wait = Duration::from_secs(engine.settings().listing_timeout_seconds + 5);
    engine.refresh();
    if !engine.settle(wait) {
        bail!("Timed out waiting for the lock listing");
    }
    if !engine.is_loaded() {
        bail!("Could not read the lock listing from the LFS server");
    }
    Ok(())
}

/// Print per-batch results. Returns the number of failed batches.
fn report_batches(outcomes: &[BatchOutcome], verbosity: Verbosity) -> usize {
    let mut failed = 0;
    for outcome in outcomes {
        let stdout = outcome.stdout.trim();
        if !stdout.is_empty() {
            output::print(stdout, verbosity);
        }
        if !outcome.succeeded {
            failed += 1;
            tracing::debug!("batch failed: {}", outcome.paths.join(", "));
        }
    }
    failed
}
