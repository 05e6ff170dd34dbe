//! engine::hooks
//!
//! Interception points for the host: saves, file changes and quitting.
//!
//! None of these block the host's action outright. A save always goes
//! ahead; only quitting can be cancelled, and only by the user.

use super::LockEngine;
use crate::ui::prompts::Prompter;

impl LockEngine {
    /// Warn about files being saved that someone else has locked.
    ///
    /// Each such path is reported once and added to the conflict
    /// ignore-list. The paths are returned unchanged.
    pub fn before_save(&mut self, paths: Vec<String>) -> Vec<String> {
        if !self.settings.enabled {
            return paths;
        }
        self.uncommitted.mark_dirty();

        if self.settings.show_conflict_warning {
            for path in Self::normalize_all(&paths) {
                let Some(record) = self.snapshot.find(&path) else {
                    continue;
                };
                if self.identity.owns(record) || self.ignore.contains(&path) {
                    continue;
                }
                let message = format!(
                    "{} is locked by {}. You will probably not be able to push your changes.",
                    path,
                    record.owner_name()
                );
                tracing::warn!("saving {} locked by {}", path, record.owner_name());
                self.prompter.alert("File locked", &message);
                self.ignore.insert(path);
            }
        }

        self.notify();
        paths
    }

    /// React to changed files reported by the host.
    ///
    /// The uncommitted set only matters for locked paths, so it is marked
    /// dirty only when one of them changed.
    pub fn on_files_changed(&mut self, paths: &[String]) {
        let touched_lock = Self::normalize_all(paths)
            .iter()
            .any(|p| self.snapshot.contains(p));
        if touched_lock {
            tracing::debug!("locked file changed, uncommitted set is stale");
            self.uncommitted.mark_dirty();
            self.notify();
        }
    }

    /// Decide whether the host may quit.
    ///
    /// While the current user still holds locks, the user is asked to
    /// confirm when `warnOnQuitWithOpenLocks` is set.
    pub fn request_quit(&self, prompter: &dyn Prompter) -> bool {
        if !self.settings.enabled || !self.settings.warn_on_quit_with_open_locks {
            return true;
        }
        let held = self.own_locks().len();
        if held == 0 {
            return true;
        }
        let message = format!(
            "You still own {} lock(s), do you want to quit anyway?",
            held
        );
        prompter.confirm("Remaining locks", &message, "Yes", "No, take me back")
    }
}
