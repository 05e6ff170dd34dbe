//! core::config
//!
//! Configuration schema and loading.
//!
//! # Overview
//!
//! Lockwatch has a single, user-scoped configuration file holding
//! [`Settings`]. A missing file means all defaults.
//!
//! # Locations
//!
//! Searched in order:
//! 1. `$LOCKWATCH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/lockwatch/config.toml`
//! 3. `~/.lockwatch/config.toml` (canonical write location)
//!
//! Saving writes back to the file that was loaded. When none was found it
//! writes to `$LOCKWATCH_CONFIG` if set, else to the canonical location.
//!
//! # Example
//!
//! ```no_run
//! use lockwatch::core::config::Config;
//!
//! let mut config = Config::load().unwrap();
//! config.settings.set("hostUsername", "alice").unwrap();
//! let path = config.save().unwrap();
//! println!("saved to {}", path.display());
//! ```

pub mod schema;

pub use schema::{Settings, KEYS};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file '{path}': {message}")]
    ParseError { path: PathBuf, message: String },

    #[error("failed to write config file '{path}': {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config value: {0}")]
    InvalidValue(String),

    #[error("home directory not found")]
    NoHomeDir,
}

/// Loaded settings and where they came from.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: Settings,
    loaded_from: Option<PathBuf>,
}

impl Config {
    /// Load settings from the first existing standard location.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file exists but cannot be read, parsed
    /// or validated. A missing file is not an error.
    pub fn load() -> Result<Self, ConfigError> {
        match Self::locate() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    /// Load settings from an explicit file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        let settings: Settings = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        settings.validate()?;

        tracing::debug!("loaded settings from {}", path.display());
        Ok(Self {
            settings,
            loaded_from: Some(path.to_path_buf()),
        })
    }

    /// First existing config file in search order.
    fn locate() -> Option<PathBuf> {
        // 1. Check $LOCKWATCH_CONFIG
        if let Ok(path) = std::env::var("LOCKWATCH_CONFIG") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        // 2. Check $XDG_CONFIG_HOME/lockwatch/config.toml
        if let Ok(xdg_home) = std::env::var("XDG_CONFIG_HOME") {
            let path = PathBuf::from(xdg_home).join("lockwatch/config.toml");
            if path.exists() {
                return Some(path);
            }
        }

        // 3. Check ~/.lockwatch/config.toml
        dirs::home_dir()
            .map(|home| home.join(".lockwatch/config.toml"))
            .filter(|path| path.exists())
    }

    /// Get the canonical config path, `~/.lockwatch/config.toml`.
    pub fn global_config_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Ok(home.join(".lockwatch/config.toml"))
    }

    /// The file these settings were read from, if any.
    pub fn loaded_from(&self) -> Option<&Path> {
        self.loaded_from.as_deref()
    }

    /// Where [`Config::save`] will write: the loaded file, else
    /// `$LOCKWATCH_CONFIG`, else the canonical path.
    pub fn target_path(&self) -> Result<PathBuf, ConfigError> {
        if let Some(path) = &self.loaded_from {
            return Ok(path.clone());
        }
        match std::env::var_os("LOCKWATCH_CONFIG") {
            Some(path) if !path.is_empty() => Ok(PathBuf::from(path)),
            _ => Self::global_config_path(),
        }
    }

    /// Validate and write the settings atomically.
    pub fn save(&mut self) -> Result<PathBuf, ConfigError> {
        self.settings.validate()?;
        let path = self.target_path()?;
        write_atomic(&path, &self.settings)?;
        self.loaded_from = Some(path.clone());
        Ok(path)
    }
}

/// Write a config file atomically.
fn write_atomic<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), ConfigError> {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| ConfigError::WriteError {
            path: path.to_path_buf(),
            source: e,
        })?;
    }

    let contents =
        toml::to_string_pretty(value).map_err(|e| ConfigError::InvalidValue(e.to_string()))?;

    // Write to temp file in same directory (for atomic rename)
    let temp_path = path.with_extension("toml.tmp");
    let mut file = fs::File::create(&temp_path).map_err(|e| ConfigError::WriteError {
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(contents.as_bytes())
        .map_err(|e| ConfigError::WriteError {
            path: temp_path.clone(),
            source: e,
        })?;

    file.sync_all().map_err(|e| ConfigError::WriteError {
        path: temp_path.clone(),
        source: e,
    })?;

    fs::rename(&temp_path, path).map_err(|e| ConfigError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })?;

    Ok(())
}
