//! core::config::schema
//!
//! Configuration schema types.
//!
//! # Settings
//!
//! Located at (in order of precedence):
//! 1. `$LOCKWATCH_CONFIG` if set
//! 2. `$XDG_CONFIG_HOME/lockwatch/config.toml`
//! 3. `~/.lockwatch/config.toml` (canonical write location)
//!
//! # Validation
//!
//! Values are validated after parsing: batch size and timeouts must be
//! positive and the remote name must not be empty.

use serde::{Deserialize, Serialize};

use super::ConfigError;

/// User-scoped settings.
///
/// # Example
///
/// ```toml
/// enabled = true
/// autoRefresh = true
/// refreshIntervalMinutes = 5
/// maxFilesPerRequest = 15
/// hostUsername = "alice"
/// extraBranchesToCheck = "develop,release"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "camelCase")]
pub struct Settings {
    /// Master switch for the whole subsystem
    pub enabled: bool,

    /// Periodic refresh in `lw watch`
    pub auto_refresh: bool,

    /// Minimum gap between automatic refreshes
    pub refresh_interval_minutes: u32,

    /// Batch size cap for lock/unlock requests
    pub max_files_per_request: usize,

    /// Warn when a refresh finds locks on locally modified files
    pub show_conflict_warning: bool,

    /// Confirm before quitting while holding locks
    pub warn_on_quit_with_open_locks: bool,

    /// Confirm before locking files changed upstream
    pub warn_if_remote_modified: bool,

    /// Report third-party locks that appeared since the last refresh
    pub notify_new_locks: bool,

    /// How many of the user's own locks a summary shows
    pub displayed_own_locks_count: usize,

    /// Comma-separated branches checked besides the current one
    pub extra_branches_to_check: String,

    /// Lock-service user name of the current user
    pub host_username: String,

    /// Remote fetched for upstream checks
    pub remote: String,

    /// Timeout for short blocking git queries
    pub request_timeout_seconds: u64,

    /// Timeout after which a background listing is abandoned
    pub listing_timeout_seconds: u64,

    /// Extensions never offered for locking
    pub ignored_extensions: Vec<String>,

    /// Helper configured by the credential remediation action
    pub credential_helper: String,

    /// Verbose logging
    pub debug: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            enabled: true,
            auto_refresh: true,
            refresh_interval_minutes: 5,
            max_files_per_request: 15,
            show_conflict_warning: true,
            warn_on_quit_with_open_locks: true,
            warn_if_remote_modified: true,
            notify_new_locks: false,
            displayed_own_locks_count: 5,
            extra_branches_to_check: String::new(),
            host_username: String::new(),
            remote: "origin".to_string(),
            request_timeout_seconds: 30,
            listing_timeout_seconds: 300,
            ignored_extensions: vec![".meta".to_string()],
            credential_helper: "manager".to_string(),
            debug: false,
        }
    }
}

/// Every key accepted by [`Settings::get`] and [`Settings::set`].
pub const KEYS: &[&str] = &[
    "enabled",
    "autoRefresh",
    "refreshIntervalMinutes",
    "maxFilesPerRequest",
    "showConflictWarning",
    "warnOnQuitWithOpenLocks",
    "warnIfRemoteModified",
    "notifyNewLocks",
    "displayedOwnLocksCount",
    "extraBranchesToCheck",
    "hostUsername",
    "remote",
    "requestTimeoutSeconds",
    "listingTimeoutSeconds",
    "ignoredExtensions",
    "credentialHelper",
    "debug",
];

impl Settings {
    /// Validate the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if any value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_files_per_request == 0 {
            return Err(ConfigError::InvalidValue(
                "maxFilesPerRequest must be at least 1".to_string(),
            ));
        }
        if self.request_timeout_seconds == 0 || self.listing_timeout_seconds == 0 {
            return Err(ConfigError::InvalidValue(
                "timeouts must be at least 1 second".to_string(),
            ));
        }
        if self.remote.trim().is_empty() {
            return Err(ConfigError::InvalidValue(
                "remote cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// True if `path` has one of the ignored extensions.
    pub fn is_ignored(&self, path: &str) -> bool {
        let lower = path.to_ascii_lowercase();
        self.ignored_extensions
            .iter()
            .any(|ext| !ext.is_empty() && lower.ends_with(&ext.to_ascii_lowercase()))
    }

    /// Read a setting by its config-file key.
    pub fn get(&self, key: &str) -> Result<String, ConfigError> {
        let value = match key {
            "enabled" => self.enabled.to_string(),
            "autoRefresh" => self.auto_refresh.to_string(),
            "refreshIntervalMinutes" => self.refresh_interval_minutes.to_string(),
            "maxFilesPerRequest" => self.max_files_per_request.to_string(),
            "showConflictWarning" => self.show_conflict_warning.to_string(),
            "warnOnQuitWithOpenLocks" => self.warn_on_quit_with_open_locks.to_string(),
            "warnIfRemoteModified" => self.warn_if_remote_modified.to_string(),
            "notifyNewLocks" => self.notify_new_locks.to_string(),
            "displayedOwnLocksCount" => self.displayed_own_locks_count.to_string(),
            "extraBranchesToCheck" => self.extra_branches_to_check.clone(),
            "hostUsername" => self.host_username.clone(),
            "remote" => self.remote.clone(),
            "requestTimeoutSeconds" => self.request_timeout_seconds.to_string(),
            "listingTimeoutSeconds" => self.listing_timeout_seconds.to_string(),
            "ignoredExtensions" => self.ignored_extensions.join(","),
            "credentialHelper" => self.credential_helper.clone(),
            "debug" => self.debug.to_string(),
            _ => return Err(unknown_key(key)),
        };
        Ok(value)
    }

    /// Set a setting from its string form, then re-validate.
    ///
    /// On error `self` is left unchanged.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut next = self.clone();
        match key {
            "enabled" => next.enabled = parse_bool(key, value)?,
            "autoRefresh" => next.auto_refresh = parse_bool(key, value)?,
            "refreshIntervalMinutes" => next.refresh_interval_minutes = parse_num(key, value)?,
            "maxFilesPerRequest" => next.max_files_per_request = parse_num(key, value)?,
            "showConflictWarning" => next.show_conflict_warning = parse_bool(key, value)?,
            "warnOnQuitWithOpenLocks" => {
                next.warn_on_quit_with_open_locks = parse_bool(key, value)?
            }
            "warnIfRemoteModified" => next.warn_if_remote_modified = parse_bool(key, value)?,
            "notifyNewLocks" => next.notify_new_locks = parse_bool(key, value)?,
            "displayedOwnLocksCount" => next.displayed_own_locks_count = parse_num(key, value)?,
            "extraBranchesToCheck" => next.extra_branches_to_check = value.trim().to_string(),
            "hostUsername" => next.host_username = value.trim().to_string(),
            "remote" => next.remote = value.trim().to_string(),
            "requestTimeoutSeconds" => next.request_timeout_seconds = parse_num(key, value)?,
            "listingTimeoutSeconds" => next.listing_timeout_seconds = parse_num(key, value)?,
            "ignoredExtensions" => {
                next.ignored_extensions = value
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            }
            "credentialHelper" => next.credential_helper = value.trim().to_string(),
            "debug" => next.debug = parse_bool(key, value)?,
            _ => return Err(unknown_key(key)),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}

fn unknown_key(key: &str) -> ConfigError {
    ConfigError::InvalidValue(format!(
        "unknown key '{}', expected one of: {}",
        key,
        KEYS.join(", ")
    ))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Ok(true),
        "false" | "no" | "off" | "0" => Ok(false),
        other => Err(ConfigError::InvalidValue(format!(
            "{} expects true or false, got '{}'",
            key, other
        ))),
    }
}

fn parse_num<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| {
        ConfigError::InvalidValue(format!(
            "{} expects a non-negative integer, got '{}'",
            key,
            value.trim()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    mod defaults {
        use super::*;

        #[test]
        fn documented_defaults() {
            let s = Settings::default();
            assert!(s.enabled);
            assert!(s.auto_refresh);
            assert_eq!(s.refresh_interval_minutes, 5);
            assert_eq!(s.max_files_per_request, 15);
            assert!(s.show_conflict_warning);
            assert!(s.warn_on_quit_with_open_locks);
            assert!(s.warn_if_remote_modified);
            assert!(!s.notify_new_locks);
            assert_eq!(s.displayed_own_locks_count, 5);
            assert_eq!(s.extra_branches_to_check, "");
            assert_eq!(s.host_username, "");
            assert_eq!(s.remote, "origin");
            assert!(s.validate().is_ok());
        }

        #[test]
        fn empty_toml_is_defaults() {
            let s: Settings = toml::from_str("").unwrap();
            assert_eq!(s, Settings::default());
        }
    }

    mod parsing {
        use super::*;

        #[test]
        fn camel_case_keys() {
            let s: Settings = toml::from_str(
                r#"
                hostUsername = "alice"
                maxFilesPerRequest = 3
                notifyNewLocks = true
                "#,
            )
            .unwrap();
            assert_eq!(s.host_username, "alice");
            assert_eq!(s.max_files_per_request, 3);
            assert!(s.notify_new_locks);
        }

        #[test]
        fn unknown_field_rejected() {
            let result: Result<Settings, _> = toml::from_str("host_username = \"alice\"");
            assert!(result.is_err());
        }

        #[test]
        fn serialized_form_reads_back() {
            let mut s = Settings::default();
            s.host_username = "bob".to_string();
            let text = toml::to_string_pretty(&s).unwrap();
            assert!(text.contains("hostUsername = \"bob\""));
            let back: Settings = toml::from_str(&text).unwrap();
            assert_eq!(back, s);
        }
    }

    mod validation {
        use super::*;

        #[test]
        fn zero_batch_size_rejected() {
            let s = Settings {
                max_files_per_request: 0,
                ..Settings::default()
            };
            assert!(s.validate().is_err());
        }

        #[test]
        fn zero_timeout_rejected() {
            let s = Settings {
                request_timeout_seconds: 0,
                ..Settings::default()
            };
            assert!(s.validate().is_err());
        }

        #[test]
        fn empty_remote_rejected() {
            let s = Settings {
                remote: " ".to_string(),
                ..Settings::default()
            };
            assert!(s.validate().is_err());
        }
    }

    mod key_access {
        use super::*;

        #[test]
        fn every_key_is_readable() {
            let s = Settings::default();
            for key in KEYS {
                assert!(s.get(key).is_ok(), "key {} not readable", key);
            }
        }

        #[test]
        fn set_then_get() {
            let mut s = Settings::default();
            s.set("hostUsername", " alice ").unwrap();
            s.set("autoRefresh", "off").unwrap();
            s.set("ignoredExtensions", ".meta, .tmp").unwrap();
            assert_eq!(s.get("hostUsername").unwrap(), "alice");
            assert_eq!(s.get("autoRefresh").unwrap(), "false");
            assert_eq!(s.ignored_extensions, vec![".meta", ".tmp"]);
        }

        #[test]
        fn invalid_set_leaves_settings_unchanged() {
            let mut s = Settings::default();
            assert!(s.set("maxFilesPerRequest", "0").is_err());
            assert!(s.set("maxFilesPerRequest", "many").is_err());
            assert!(s.set("enabled", "maybe").is_err());
            assert!(s.set("colorblindMode", "true").is_err());
            assert_eq!(s, Settings::default());
        }
    }

    #[test]
    fn ignored_extension_match_is_case_insensitive() {
        let s = Settings::default();
        assert!(s.is_ignored("Assets/a.png.meta"));
        assert!(s.is_ignored("Assets/A.PNG.META"));
        assert!(!s.is_ignored("Assets/a.png"));
    }
}
