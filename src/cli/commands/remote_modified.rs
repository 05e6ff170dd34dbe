//! remote-modified command - Files changed upstream but not merged here

use anyhow::{Context as _, Result};

use super::open_engine;
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};

/// Fetch each tracked branch and list the files its new commits touch.
pub fn remote_modified(ctx: &Context) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let engine = open_engine(ctx)?;

    let files = engine
        .remote_modified()
        .context("Failed to check remote branches")?;
    if files.is_empty() {
        output::print("No upstream modifications.", verbosity);
        return Ok(());
    }
    for path in files.iter() {
        println!("{}", path);
    }
    Ok(())
}
