//! config command - Get, set, or list configuration values

use anyhow::{Context as _, Result};

use crate::core::config::{Config, KEYS};
use crate::engine::Context;
use crate::ui::output::{self, Verbosity};

/// Get a configuration value.
pub fn get(_ctx: &Context, key: &str) -> Result<()> {
    let config = Config::load().context("Failed to load config")?;
    let value = config.settings.get(key)?;

    if value.is_empty() {
        // Key exists but has no value - exit silently
        Ok(())
    } else {
        println!("{}", value);
        Ok(())
    }
}

/// Set a configuration value.
pub fn set(ctx: &Context, key: &str, value: &str) -> Result<()> {
    let mut config = Config::load().context("Failed to load config")?;
    config.settings.set(key, value)?;
    let path = config.save().context("Failed to save config")?;

    output::print(
        format!("Set {} = {} in {}", key, value.trim(), path.display()),
        Verbosity::from_flags(ctx.quiet, ctx.debug),
    );
    Ok(())
}

/// List all configuration values.
pub fn list(_ctx: &Context) -> Result<()> {
    let config = Config::load().context("Failed to load config")?;
    for key in KEYS {
        println!("{} = {}", key, config.settings.get(key)?);
    }
    Ok(())
}

/// Print the file settings are read from and written to.
pub fn path(_ctx: &Context) -> Result<()> {
    let config = Config::load().context("Failed to load config")?;
    println!("{}", config.target_path()?.display());
    Ok(())
}
