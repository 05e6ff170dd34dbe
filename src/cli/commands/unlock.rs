//! unlock command - Release locks on the LFS server

use std::time::Duration;

use anyhow::{bail, Result};

use super::{fetch_listing, open_engine, repo_paths, report_batches};
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};

/// Release `paths`, or every lock the user holds with `all_mine`.
pub fn unlock(ctx: &Context, paths: &[String], force: bool, all_mine: bool) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let mut engine = open_engine(ctx)?;

    let outcomes = if all_mine {
        if !engine.identity().is_configured() {
            bail!("hostUsername is not set, so none of the locks is known to be yours");
        }
        fetch_listing(&mut engine)?;
        if engine.own_locks().is_empty() {
            output::print("You hold no locks.", verbosity);
            return Ok(());
        }
        engine.unlock_all_mine()?
    } else {
        let paths = repo_paths(ctx, &engine, paths)?;
        engine.unlock_paths(&paths, force)?
    };

    let failed = report_batches(&outcomes, verbosity);
    engine.settle(Duration::from_secs(engine.settings().listing_timeout_seconds));
    if failed > 0 {
        bail!("{} of {} unlock request(s) failed", failed, outcomes.len());
    }
    Ok(())
}
