//! engine::refresh
//!
//! The refresh protocol.
//!
//! # States
//!
//! `Idle -> Refreshing -> Idle`. [`LockEngine::refresh`] is a no-op while a
//! listing is in flight.
//!
//! # Completion handling
//!
//! A structured listing reply is interpreted on the tick:
//!
//! 1. `[]` additionally queues the human-readable listing. An empty
//!    structured result and a transport failure look alike; the plain
//!    listing's output (or error) tells them apart. It is never parsed.
//! 2. A reply starting with `[` is parsed. On failure the old snapshot
//!    stays published.
//! 3. On success the new snapshot is installed, the uncommitted set is
//!    rebuilt, conflicts are reported (once per path), stale ignore-list
//!    entries are pruned and, optionally, new third-party locks are
//!    reported.
//! 4. Anything else is diagnostic text only.
//!
//! `refreshing` is cleared on every branch.

use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};

use super::LockEngine;
use crate::core::conflict::ConflictDetector;
use crate::core::snapshot::{is_empty_listing, is_structured, parse_payload, LockSnapshot};
use crate::core::types::LockRecord;
use crate::process::{AsyncCompletion, AsyncKind, AsyncReply, AsyncRequest};

const CONFLICT_TITLE: &str = "Warning";
const CONFLICT_MESSAGE: &str = "The following files are currently locked and you have \
uncommitted changes on them that you'll probably not be able to push:";
const NEW_LOCKS_TITLE: &str = "New locks";
const LISTING_ERROR_TITLE: &str = "Git LFS locks error";

impl LockEngine {
    /// Start a refresh now. Returns false if one is already in flight or the
    /// request could not be queued.
    pub fn refresh(&mut self) -> bool {
        self.refresh_at(Utc::now())
    }

    /// [`LockEngine::refresh`] with an explicit clock.
    pub fn refresh_at(&mut self, now: DateTime<Utc>) -> bool {
        if self.refreshing {
            tracing::debug!("refresh already in flight, skipping");
            return false;
        }
        self.scheduler.mark_refreshed(now);
        self.refreshing = true;

        let request = AsyncRequest {
            kind: AsyncKind::LockListing,
            spec: self.git.listing_spec(),
        };
        if let Err(e) = self.queue.submit(request) {
            tracing::error!("failed to queue lock listing: {}", e);
            self.refreshing = false;
            return false;
        }
        true
    }

    /// Refresh if automatic refresh is on, the interval has elapsed and the
    /// host is idle.
    pub fn check_and_maybe_refresh(&mut self) -> bool {
        self.check_and_maybe_refresh_at(Utc::now())
    }

    pub fn check_and_maybe_refresh_at(&mut self, now: DateTime<Utc>) -> bool {
        let busy = self.host.is_busy();
        if self.scheduler.is_due(now, self.settings.auto_refresh, busy) {
            self.refresh_at(now)
        } else {
            false
        }
    }

    /// One cooperative scheduler tick.
    pub fn tick(&mut self) {
        self.tick_at(Utc::now());
    }

    pub fn tick_at(&mut self, now: DateTime<Utc>) {
        if !self.settings.enabled {
            return;
        }
        if self.host.is_busy() {
            tracing::trace!("host busy, yielding");
            return;
        }
        if self.uncommitted.is_dirty() {
            self.uncommitted.rebuild(&self.git, self.probe.as_ref());
        }
        self.process_completions();
        self.check_and_maybe_refresh_at(now);
    }

    /// Interpret every staged background result. Returns how many there were.
    pub fn process_completions(&mut self) -> usize {
        let completions = self.queue.drain();
        let count = completions.len();
        for completion in completions {
            self.handle_completion(completion);
        }
        count
    }

    /// Process completions until no listing is in flight and the queue is
    /// empty, or `timeout` passes. Returns false on timeout.
    pub fn settle(&mut self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        loop {
            self.process_completions();
            if !self.refreshing && self.queue.outstanding() == 0 {
                return true;
            }
            if Instant::now() >= deadline {
                tracing::warn!("gave up waiting for lock listing after {:?}", timeout);
                return false;
            }
            thread::sleep(Duration::from_millis(20));
        }
    }

    fn handle_completion(&mut self, completion: AsyncCompletion) {
        match (completion.kind, completion.reply) {
            (AsyncKind::LockListing, AsyncReply::Payload { stdout, stderr }) => {
                if !stderr.trim().is_empty() {
                    self.surface_listing_error(&stderr);
                }
                self.apply_listing(&stdout);
            }
            (AsyncKind::LockListing, AsyncReply::Error(text)) => {
                self.surface_listing_error(&text);
                self.finish_refresh();
            }
            (AsyncKind::DiagnosticListing, AsyncReply::Payload { stdout, stderr }) => {
                let stdout = stdout.trim();
                if !stdout.is_empty() {
                    tracing::info!("git lfs locks: {}", stdout);
                }
                if !stderr.trim().is_empty() {
                    self.surface_listing_error(&stderr);
                }
            }
            (AsyncKind::DiagnosticListing, AsyncReply::Error(text)) => {
                self.surface_listing_error(&text);
            }
        }
    }

    fn apply_listing(&mut self, payload: &str) {
        if is_empty_listing(payload) {
            let request = AsyncRequest {
                kind: AsyncKind::DiagnosticListing,
                spec: self.git.diagnostic_listing_spec(),
            };
            if let Err(e) = self.queue.submit(request) {
                tracing::warn!("failed to queue diagnostic listing: {}", e);
            }
        }

        if is_structured(payload) {
            match parse_payload(payload) {
                Ok(records) => {
                    self.install(records);
                    self.refreshing = false;
                    self.notify();
                    return;
                }
                Err(e) => tracing::error!("{}; keeping previous snapshot", e),
            }
        } else if !payload.trim().is_empty() {
            tracing::info!("lock listing returned no data: {}", payload.trim());
        }
        self.finish_refresh();
    }

    /// Close a cycle that did not install a snapshot.
    fn finish_refresh(&mut self) {
        self.uncommitted.mark_dirty();
        self.refreshing = false;
        self.notify();
    }

    fn install(&mut self, records: Vec<LockRecord>) {
        let fresh = Arc::new(LockSnapshot::new(records, &self.identity));
        let previous = std::mem::replace(&mut self.snapshot, fresh);
        let first_listing = !self.loaded;
        self.loaded = true;
        tracing::debug!(
            "installed snapshot with {} lock(s), previously {}",
            self.snapshot.len(),
            previous.len()
        );

        self.uncommitted.rebuild(&self.git, self.probe.as_ref());

        if self.settings.show_conflict_warning {
            let conflicts = ConflictDetector.detect(
                &self.snapshot,
                self.uncommitted.files(),
                &self.identity,
                &mut self.ignore,
            );
            if !conflicts.is_empty() {
                tracing::warn!("{} new conflicting lock(s)", conflicts.len());
                let message = format!("{}\n{}", CONFLICT_MESSAGE, conflicts.join("\n"));
                self.prompter.alert(CONFLICT_TITLE, &message);
            }
        }

        let pruned = self.ignore.prune(&self.snapshot, &self.identity);
        if !pruned.is_empty() {
            tracing::debug!("no longer ignoring: {}", pruned.join(", "));
        }

        // Against an empty baseline every lock would look new.
        if self.settings.notify_new_locks && !first_listing {
            let lines: Vec<String> = self
                .snapshot
                .new_locks_since(&previous, &self.identity)
                .into_iter()
                .map(ToString::to_string)
                .collect();
            if !lines.is_empty() {
                self.prompter.alert(NEW_LOCKS_TITLE, &lines.join("\n"));
            }
        }
    }

    /// Show a listing failure and offer to configure a credential helper.
    fn surface_listing_error(&self, text: &str) {
        let text = text.trim();
        tracing::error!("lock listing failed: {}", text);

        let message = format!(
            "Git LFS locks error:\n\n{}\n\nIf this is your first time using lockwatch, \
             you should probably set up a credential helper.",
            text
        );
        if !self
            .prompter
            .confirm(LISTING_ERROR_TITLE, &message, "Setup credentials", "OK")
        {
            return;
        }

        let helper = &self.settings.credential_helper;
        match self.git.set_credential_helper(helper, true) {
            Ok(()) => tracing::info!("credential.helper set to '{}'", helper),
            Err(e) => {
                tracing::error!("failed to set credential.helper: {}", e);
                self.prompter
                    .alert("Credential setup failed", &e.to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::Settings;
    use crate::core::host::{FileProbe, HostState, IdleHost};
    use crate::git::Git;
    use crate::process::mock::MockRunner;
    use crate::process::ProcessResult;
    use crate::ui::prompts::ScriptedPrompter;
    use chrono::TimeZone;
    use std::path::PathBuf;

    struct AllExist;

    impl FileProbe for AllExist {
        fn exists(&self, _path: &str) -> bool {
            true
        }
    }

    struct Busy;

    impl HostState for Busy {
        fn is_busy(&self) -> bool {
            true
        }
    }

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, minute, 0).unwrap()
    }

    fn setup(mock: &MockRunner, settings: Settings) -> (LockEngine, ScriptedPrompter) {
        let prompter = ScriptedPrompter::new();
        let git = Git::with_root(
            PathBuf::from("/repo"),
            PathBuf::from("/repo/.git"),
            Arc::new(mock.clone()),
            Duration::from_secs(5),
        );
        let engine = LockEngine::new(git, settings, Arc::new(prompter.clone()))
            .with_probe(AllExist)
            .with_host(IdleHost);
        (engine, prompter)
    }

    fn alice() -> Settings {
        Settings {
            host_username: "alice".to_string(),
            ..Settings::default()
        }
    }

    #[test]
    fn second_refresh_is_noop_while_in_flight() {
        let mock = MockRunner::new();
        let (mut engine, _) = setup(&mock, alice());
        assert!(engine.refresh());
        assert!(engine.is_refreshing());
        assert!(!engine.refresh());
        engine.settle(Duration::from_secs(5));
        assert_eq!(mock.call_count("git lfs locks --json"), 1);
    }

    #[test]
    fn non_data_reply_clears_refreshing_and_keeps_snapshot() {
        let mock = MockRunner::new();
        mock.respond_ok(
            "git lfs locks --json",
            r#"[{"id":1,"path":"a.png","owner":{"name":"bob"},"locked_at":"2024-01-01T10:00:00Z"}]"#,
        );
        mock.respond_ok("git lfs locks --json", "batch response: unavailable");
        let (mut engine, _) = setup(&mock, alice());

        engine.refresh();
        engine.settle(Duration::from_secs(5));
        assert_eq!(engine.snapshot().len(), 1);

        engine.refresh();
        engine.settle(Duration::from_secs(5));
        assert!(!engine.is_refreshing());
        assert_eq!(engine.snapshot().len(), 1);
    }

    #[test]
    fn stderr_offers_credential_setup() {
        let mock = MockRunner::new();
        mock.respond(
            "git lfs locks --json",
            ProcessResult::ok("", "Authentication required\n"),
        );
        let (mut engine, prompter) = setup(&mock, alice());
        prompter.push_answer(true);

        engine.refresh();
        engine.settle(Duration::from_secs(5));

        let asked = prompter.confirmations();
        assert_eq!(asked.len(), 1);
        assert!(asked[0].message.contains("Authentication required"));
        assert_eq!(
            mock.call_count("git config --global credential.helper manager"),
            1
        );
        assert!(!engine.is_refreshing());
    }

    #[test]
    fn launch_failure_is_surfaced_and_cycle_completes() {
        let mock = MockRunner::new();
        mock.respond(
            "git lfs locks --json",
            ProcessResult::launch_failure("failed to launch git: not found"),
        );
        let (mut engine, prompter) = setup(&mock, alice());

        engine.refresh();
        engine.settle(Duration::from_secs(5));

        assert!(!engine.is_refreshing());
        assert!(!engine.is_loaded());
        assert_eq!(prompter.confirmations().len(), 1);
        assert_eq!(
            mock.call_count("git config --global credential.helper manager"),
            0
        );
    }

    #[test]
    fn new_locks_since_previous_listing_are_reported() {
        let mock = MockRunner::new();
        mock.respond_ok(
            "git lfs locks --json",
            r#"[{"id":1,"path":"a.png","owner":{"name":"bob"},"locked_at":"2024-01-01T10:00:00Z"}]"#,
        );
        mock.respond_ok(
            "git lfs locks --json",
            r#"[{"id":1,"path":"a.png","owner":{"name":"bob"},"locked_at":"2024-01-01T10:00:00Z"},
                {"id":2,"path":"b.png","owner":{"name":"carol"},"locked_at":"2024-01-01T10:00:00Z"},
                {"id":3,"path":"c.png","owner":{"name":"alice"},"locked_at":"2024-01-01T10:00:00Z"}]"#,
        );
        let settings = Settings {
            notify_new_locks: true,
            ..alice()
        };
        let (mut engine, prompter) = setup(&mock, settings);

        engine.refresh();
        engine.settle(Duration::from_secs(5));
        engine.refresh();
        engine.settle(Duration::from_secs(5));

        let alerts = prompter.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].title, "New locks");
        assert_eq!(alerts[0].message, "[carol] b.png");
    }

    #[test]
    fn first_listing_reports_no_new_locks() {
        let mock = MockRunner::new();
        mock.respond_ok(
            "git lfs locks --json",
            r#"[{"id":1,"path":"a.png","owner":{"name":"bob"},"locked_at":"2024-01-01T10:00:00Z"}]"#,
        );
        let settings = Settings {
            notify_new_locks: true,
            ..alice()
        };
        let (mut engine, prompter) = setup(&mock, settings);

        engine.refresh();
        engine.settle(Duration::from_secs(5));

        assert!(engine.is_loaded());
        assert!(prompter.alerts().is_empty());
    }

    #[test]
    fn tick_respects_interval() {
        let mock = MockRunner::new();
        mock.respond_ok("git lfs locks --json", "[]");
        let (mut engine, _) = setup(&mock, alice());

        engine.tick_at(at(0));
        engine.settle(Duration::from_secs(5));
        engine.tick_at(at(3));
        engine.settle(Duration::from_secs(5));
        assert_eq!(mock.call_count("git lfs locks --json"), 1);

        engine.tick_at(at(5));
        engine.settle(Duration::from_secs(5));
        assert_eq!(mock.call_count("git lfs locks --json"), 2);
    }

    #[test]
    fn tick_does_nothing_when_disabled() {
        let mock = MockRunner::new();
        let settings = Settings {
            enabled: false,
            ..alice()
        };
        let (mut engine, _) = setup(&mock, settings);
        engine.tick_at(at(0));
        assert!(mock.calls().is_empty());
    }

    #[test]
    fn busy_host_defers_everything() {
        let mock = MockRunner::new();
        let (engine, _) = setup(&mock, alice());
        let mut engine = engine.with_host(Busy);
        engine.tick_at(at(0));
        assert!(mock.calls().is_empty());
        assert!(!engine.is_refreshing());
    }

    #[test]
    fn manual_refresh_ignores_auto_refresh_setting() {
        let mock = MockRunner::new();
        let settings = Settings {
            auto_refresh: false,
            ..alice()
        };
        let (mut engine, _) = setup(&mock, settings);
        assert!(!engine.check_and_maybe_refresh_at(at(0)));
        assert!(engine.refresh_at(at(0)));
    }
}
