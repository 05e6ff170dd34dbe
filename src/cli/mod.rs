//! cli
//!
//! Command-line interface layer for Lockwatch.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Initialize logging
//! - Delegate to command handlers
//!
//! # Architecture
//!
//! The CLI layer is thin. It parses arguments via clap and hands each
//! command to a handler that drives the [`crate::engine::LockEngine`].
//! All lock state lives in the engine; handlers only print it.

pub mod args;
pub mod commands;

pub use args::{Cli, Shell};

use crate::core::config::Config;
use crate::engine;
use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<()> {
    let cli = Cli::parse_args();

    // A broken config file is reported by the command that needs it.
    let config_debug = Config::load().map(|c| c.settings.debug).unwrap_or(false);
    let ctx = engine::Context {
        cwd: cli.cwd.clone(),
        debug: cli.debug || config_debug,
        quiet: cli.quiet,
        interactive: cli.interactive(),
    };
    init_tracing(&ctx);

    commands::dispatch(cli.command, &ctx)
}

/// Install the global subscriber. `RUST_LOG` wins over the flags.
fn init_tracing(ctx: &engine::Context) {
    let default_filter = if ctx.debug {
        "lockwatch=debug"
    } else if ctx.quiet {
        "lockwatch=error"
    } else {
        "lockwatch=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
