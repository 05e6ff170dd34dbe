//! core::types
//!
//! Strong types for lock records and ownership.
//!
//! # Design
//!
//! A [`LockRecord`] stores only the repository-relative path of the locked
//! file. Anything that needs a richer handle (an open asset, an editor
//! object) asks an [`AssetResolver`] for it on demand; records never own
//! such handles.
//!
//! Paths are normalized to forward slashes on entry so that lookups made
//! with native Windows separators still match.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Normalize a repository-relative path to forward-slash separators.
///
/// Also strips a trailing carriage return left behind by CRLF output.
///
/// # Example
///
/// ```
/// use lockwatch::core::types::normalize_path;
///
/// assert_eq!(normalize_path("Assets\\Art\\hero.png"), "Assets/Art/hero.png");
/// assert_eq!(normalize_path("Assets/a.png\r"), "Assets/a.png");
/// ```
pub fn normalize_path(path: &str) -> String {
    path.trim_end_matches(['\r', '\n']).replace('\\', "/")
}

/// Owner of a lock as reported by the lock service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LockOwner {
    pub name: String,
}

/// An exclusive claim on a file path by a named owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    #[serde(deserialize_with = "deserialize_id")]
    pub id: u64,

    #[serde(deserialize_with = "deserialize_path")]
    pub path: String,

    pub owner: LockOwner,

    #[serde(deserialize_with = "deserialize_timestamp")]
    pub locked_at: DateTime<Utc>,
}

impl LockRecord {
    /// Name of the lock's owner.
    pub fn owner_name(&self) -> &str {
        &self.owner.name
    }

    /// Resolve the locked path to an asset handle, if the asset system knows it.
    pub fn resolve<R: AssetResolver + ?Sized>(&self, resolver: &R) -> Option<R::Handle> {
        resolver.resolve(&self.path)
    }
}

impl fmt::Display for LockRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.owner.name, self.path)
    }
}

/// On-demand lookup from a repository path to an asset handle.
pub trait AssetResolver {
    type Handle;

    /// Look up the asset at `path`; `None` when it is not loaded or unknown.
    fn resolve(&self, path: &str) -> Option<Self::Handle>;
}

/// The current user's lock-service identity.
///
/// An unset identity owns nothing. Ownership comparisons against it always
/// fail, so no lock is ever "mine" and no lock can be conflicting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity(Option<String>);

impl Identity {
    /// Build from a configured user name; blank means unset.
    pub fn new(name: &str) -> Self {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            Self(None)
        } else {
            Self(Some(trimmed.to_string()))
        }
    }

    /// An identity that owns nothing.
    pub fn none() -> Self {
        Self(None)
    }

    /// The configured name, if any.
    pub fn name(&self) -> Option<&str> {
        self.0.as_deref()
    }

    pub fn is_configured(&self) -> bool {
        self.0.is_some()
    }

    /// True if `record` is held by this identity.
    pub fn owns(&self, record: &LockRecord) -> bool {
        self.0.as_deref() == Some(record.owner.name.as_str())
    }
}

// -----------------------------------------------------------------------------
// Payload field decoding
// -----------------------------------------------------------------------------

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Number(u64),
    Text(String),
}

/// git-lfs reports ids as strings; older servers used numbers.
fn deserialize_id<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    match RawId::deserialize(deserializer)? {
        RawId::Number(n) => Ok(n),
        RawId::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid lock id '{}'", s))),
    }
}

fn deserialize_path<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if raw.trim().is_empty() {
        return Err(serde::de::Error::custom("empty lock path"));
    }
    Ok(normalize_path(&raw))
}

fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid locked_at '{}'", raw)))
}

/// Parse an RFC 3339 timestamp, or a naive one taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
