//! core::snapshot
//!
//! The cached set of known lock records.
//!
//! # Invariants
//!
//! - A path appears at most once.
//! - Records held by the current identity come first; within each
//!   ownership class records are ordered by path.
//! - A snapshot is never edited after construction. A refresh builds a new
//!   one and swaps it in whole.
//!
//! # Payload
//!
//! The structured listing is a JSON array of records:
//!
//! ```json
//! [{"id": 1, "path": "Assets/a.png", "owner": {"name": "bob"},
//!   "locked_at": "2024-01-01T10:00:00Z"}]
//! ```

use std::collections::HashSet;

use thiserror::Error;

use super::types::{normalize_path, Identity, LockRecord};

/// Errors from interpreting a lock listing.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// The payload does not start with a JSON array.
    #[error("lock listing is not a structured payload")]
    NotStructured,

    /// The payload looked structured but could not be decoded.
    #[error("failed to parse lock listing: {0}")]
    Parse(String),
}

/// True if `payload` is the structured empty-list token.
pub fn is_empty_listing(payload: &str) -> bool {
    let trimmed = payload.trim();
    trimmed.starts_with('[') && trimmed[1..].trim() == "]"
}

/// True if `payload` should be treated as data at all.
pub fn is_structured(payload: &str) -> bool {
    payload.trim_start().starts_with('[')
}

/// Decode a structured listing into records, in payload order.
///
/// # Errors
///
/// - [`SnapshotError::NotStructured`] if the payload is not a list
/// - [`SnapshotError::Parse`] if any record is malformed
pub fn parse_payload(payload: &str) -> Result<Vec<LockRecord>, SnapshotError> {
    if !is_structured(payload) {
        return Err(SnapshotError::NotStructured);
    }
    serde_json::from_str(payload.trim()).map_err(|e| SnapshotError::Parse(e.to_string()))
}

/// An immutable, ordered set of lock records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LockSnapshot {
    records: Vec<LockRecord>,
}

impl LockSnapshot {
    /// Build a snapshot ordered for `identity`.
    ///
    /// Duplicate paths keep their first occurrence.
    pub fn new(records: Vec<LockRecord>, identity: &Identity) -> Self {
        let mut seen = HashSet::with_capacity(records.len());
        let mut unique = Vec::with_capacity(records.len());
        for record in records {
            if seen.insert(record.path.clone()) {
                unique.push(record);
            } else {
                tracing::warn!("duplicate lock for '{}' in listing, ignoring", record.path);
            }
        }

        unique.sort_by(|a, b| {
            identity
                .owns(b)
                .cmp(&identity.owns(a))
                .then_with(|| a.path.cmp(&b.path))
        });

        Self { records: unique }
    }

    /// A snapshot with no records.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[LockRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Look up a record by path; separators are normalized first.
    pub fn find(&self, path: &str) -> Option<&LockRecord> {
        let wanted = normalize_path(path);
        self.records.iter().find(|r| r.path == wanted)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    /// Records held by `identity`.
    pub fn owned_by<'a>(&'a self, identity: &'a Identity) -> impl Iterator<Item = &'a LockRecord> {
        self.records.iter().filter(move |r| identity.owns(r))
    }

    /// Records held by anyone other than `identity`.
    pub fn not_owned_by<'a>(
        &'a self,
        identity: &'a Identity,
    ) -> impl Iterator<Item = &'a LockRecord> {
        self.records.iter().filter(move |r| !identity.owns(r))
    }

    /// Records whose path is absent from `previous` and which `identity`
    /// does not hold.
    pub fn new_locks_since<'a>(
        &'a self,
        previous: &LockSnapshot,
        identity: &Identity,
    ) -> Vec<&'a LockRecord> {
        let known: HashSet<&str> = previous.records.iter().map(|r| r.path.as_str()).collect();
        self.records
            .iter()
            .filter(|r| !known.contains(r.path.as_str()) && !identity.owns(r))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASIC: &str = r#"[{"id":1,"path":"Assets/a.png","owner":{"name":"bob"},"locked_at":"2024-01-01T10:00:00"}]"#;

    fn payload(entries: &[(u64, &str, &str)]) -> String {
        let items: Vec<String> = entries
            .iter()
            .map(|(id, path, owner)| {
                format!(
                    r#"{{"id":{},"path":"{}","owner":{{"name":"{}"}},"locked_at":"2024-01-01T10:00:00Z"}}"#,
                    id, path, owner
                )
            })
            .collect();
        format!("[{}]", items.join(","))
    }

    fn paths(snapshot: &LockSnapshot) -> Vec<&str> {
        snapshot.records().iter().map(|r| r.path.as_str()).collect()
    }

    mod payloads {
        use super::*;

        #[test]
        fn empty_listing_token() {
            assert!(is_empty_listing("[]"));
            assert!(is_empty_listing("  [ ]\n"));
            assert!(!is_empty_listing(BASIC));
            assert!(!is_empty_listing(""));
        }

        #[test]
        fn non_list_is_not_structured() {
            assert!(matches!(
                parse_payload("Error: authentication required"),
                Err(SnapshotError::NotStructured)
            ));
            assert!(matches!(parse_payload(""), Err(SnapshotError::NotStructured)));
        }

        #[test]
        fn truncated_list_is_parse_error() {
            assert!(matches!(
                parse_payload(r#"[{"id":1,"path":"a.png""#),
                Err(SnapshotError::Parse(_))
            ));
        }

        #[test]
        fn basic_listing_parses() {
            let records = parse_payload(BASIC).unwrap();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].path, "Assets/a.png");
            assert_eq!(records[0].owner_name(), "bob");
        }

        #[test]
        fn empty_list_parses_to_no_records() {
            assert!(parse_payload("[]\n").unwrap().is_empty());
        }
    }

    mod ordering {
        use super::*;

        #[test]
        fn own_locks_first_then_by_path() {
            let records = parse_payload(&payload(&[
                (1, "z.png", "bob"),
                (2, "m.png", "alice"),
                (3, "a.png", "carol"),
                (4, "b.png", "alice"),
            ]))
            .unwrap();
            let snap = LockSnapshot::new(records, &Identity::new("alice"));
            assert_eq!(paths(&snap), vec!["b.png", "m.png", "a.png", "z.png"]);
        }

        #[test]
        fn without_identity_order_is_by_path() {
            let records =
                parse_payload(&payload(&[(1, "b.png", "bob"), (2, "a.png", "alice")])).unwrap();
            let snap = LockSnapshot::new(records, &Identity::none());
            assert_eq!(paths(&snap), vec!["a.png", "b.png"]);
        }

        #[test]
        fn duplicate_paths_keep_first() {
            let records =
                parse_payload(&payload(&[(1, "a.png", "bob"), (2, "a.png", "carol")])).unwrap();
            let snap = LockSnapshot::new(records, &Identity::none());
            assert_eq!(snap.len(), 1);
            assert_eq!(snap.records()[0].id, 1);
        }
    }

    mod views {
        use super::*;

        #[test]
        fn basic_listing_scenario() {
            let alice = Identity::new("alice");
            let snap = LockSnapshot::new(parse_payload(BASIC).unwrap(), &alice);
            assert_eq!(snap.owned_by(&alice).count(), 0);
            let others: Vec<_> = snap.not_owned_by(&alice).collect();
            assert_eq!(others.len(), 1);
            assert_eq!(others[0].path, "Assets/a.png");
        }

        #[test]
        fn find_normalizes_separators() {
            let snap = LockSnapshot::new(parse_payload(BASIC).unwrap(), &Identity::none());
            assert!(snap.find("Assets\\a.png").is_some());
            assert!(!snap.contains("Assets/b.png"));
        }

        #[test]
        fn new_locks_excludes_known_and_own() {
            let alice = Identity::new("alice");
            let old = LockSnapshot::new(
                parse_payload(&payload(&[(1, "a.png", "bob")])).unwrap(),
                &alice,
            );
            let new = LockSnapshot::new(
                parse_payload(&payload(&[
                    (1, "a.png", "bob"),
                    (2, "b.png", "carol"),
                    (3, "c.png", "alice"),
                ]))
                .unwrap(),
                &alice,
            );
            let fresh: Vec<_> = new
                .new_locks_since(&old, &alice)
                .into_iter()
                .map(|r| r.path.as_str())
                .collect();
            assert_eq!(fresh, vec!["b.png"]);
        }
    }
}
