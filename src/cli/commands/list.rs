//! list command - Print the current locks

use anyhow::{Context as _, Result};

use super::{fetch_listing, open_engine};
use crate::core::types::LockRecord;
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};

/// Refresh once and print the lock table.
pub fn list(ctx: &Context, mine: bool, others: bool, json: bool) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let mut engine = open_engine(ctx)?;
    fetch_listing(&mut engine)?;

    let records: Vec<LockRecord> = if mine {
        engine.own_locks().into_iter().cloned().collect()
    } else if others {
        engine.other_locks().into_iter().cloned().collect()
    } else {
        engine.snapshot().records().to_vec()
    };

    if json {
        let text = serde_json::to_string_pretty(&records).context("Failed to encode locks")?;
        println!("{}", text);
        return Ok(());
    }

    if records.is_empty() {
        output::print("No locks.", verbosity);
    } else {
        let identity = engine.identity();
        for record in &records {
            println!("{}", output::format_lock(record, identity));
        }
    }

    if !engine.identity().is_configured() {
        output::warn(
            "hostUsername is not set; no lock is shown as yours. Run 'lw config set hostUsername <name>'.",
            verbosity,
        );
    }
    Ok(())
}
