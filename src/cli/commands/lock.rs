//! lock command - Lock files on the LFS server

use std::time::Duration;

use anyhow::{bail, Result};

use super::{open_engine, repo_paths, report_batches};
use crate::engine::{Context, LockRequestError};
use crate::ui::output::{self, Verbosity};

/// Lock `paths` in batches.
pub fn lock(ctx: &Context, paths: &[String]) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let mut engine = open_engine(ctx)?;
    let paths = repo_paths(ctx, &engine, paths)?;

    let outcomes = match engine.lock_paths(&paths) {
        Ok(outcomes) => outcomes,
        Err(LockRequestError::UserAbort) => {
            output::print("Nothing locked.", verbosity);
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let failed = report_batches(&outcomes, verbosity);
    engine.settle(Duration::from_secs(engine.settings().listing_timeout_seconds));
    if failed > 0 {
        bail!("{} of {} lock request(s) failed", failed, outcomes.len());
    }
    Ok(())
}
