//! status command - Summarize locks against local changes

use anyhow::Result;

use super::{fetch_listing, open_engine};
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};

/// Print held locks, uncommitted files and conflicts.
pub fn status(ctx: &Context) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let mut engine = open_engine(ctx)?;
    fetch_listing(&mut engine)?;

    let limit = engine.settings().displayed_own_locks_count;
    let own: Vec<String> = engine.own_locks().iter().map(|r| r.path.clone()).collect();
    let others = engine.other_locks().len();

    match engine.identity().name() {
        Some(name) => println!("You are {} on the lock server.", name),
        None => println!("hostUsername is not set."),
    }
    println!("{} lock(s) held by you, {} by others.", own.len(), others);
    if !own.is_empty() {
        let shown = &own[..own.len().min(limit)];
        println!("{}", output::format_list(shown, "  * "));
        if own.len() > shown.len() {
            println!("  ... and {} more", own.len() - shown.len());
        }
    }

    let uncommitted: Vec<String> = engine.uncommitted().iter().map(str::to_string).collect();
    println!("{} uncommitted file(s).", uncommitted.len());
    if !verbosity.is_quiet() && !uncommitted.is_empty() {
        println!("{}", output::format_list(&uncommitted, "  "));
    }

    let conflicts = engine.conflicting_locks();
    if conflicts.is_empty() {
        println!("No conflicts.");
    } else {
        println!("{} conflict(s):", conflicts.len());
        for record in &conflicts {
            println!("  {}", record);
        }
    }
    Ok(())
}
