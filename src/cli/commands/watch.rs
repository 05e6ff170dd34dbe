//! watch command - Foreground refresh loop
//!
//! Drives [`LockEngine::tick`] on a fixed interval, feeds working-tree
//! changes from a filesystem watcher into the engine and asks before
//! quitting while the user still holds locks.

use std::path::{Component, Path};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};
use crossbeam_channel::{Receiver, TryRecvError};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::time::MissedTickBehavior;

use super::open_engine;
use crate::core::instance::InstanceLock;
use crate::core::paths::LockwatchPaths;
use crate::core::types::normalize_path;
use crate::engine::{Context, LockEngine};
use crate::ui::output::{self, Verbosity};
use crate::ui::prompts::TerminalPrompter;

type WatchEvent = notify::Result<Event>;

/// Run until Ctrl-C is confirmed.
pub fn watch(ctx: &Context, tick: Duration) -> Result<()> {
    let verbosity = Verbosity::from_flags(ctx.quiet, ctx.debug);
    let mut engine = open_engine(ctx)?;
    let root = engine.git().root().to_path_buf();

    let paths = LockwatchPaths::new(engine.git().git_dir().to_path_buf());
    let _instance = InstanceLock::acquire(&paths)?;

    let (tx, rx) = crossbeam_channel::unbounded::<WatchEvent>();
    let mut watcher = RecommendedWatcher::new(
        move |result: WatchEvent| {
            let _ = tx.send(result);
        },
        notify::Config::default(),
    )
    .context("Failed to create file watcher")?;
    watcher
        .watch(&root, RecursiveMode::Recursive)
        .with_context(|| format!("Failed to watch {}", root.display()))?;

    let prompter = TerminalPrompter::new(ctx.interactive);
    output::print(
        format!("Watching locks for {} (Ctrl-C to stop)", root.display()),
        verbosity,
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    runtime.block_on(run_loop(
        &mut engine,
        &rx,
        &root,
        &prompter,
        tick,
        verbosity,
    ))
}

async fn run_loop(
    engine: &mut LockEngine,
    events: &Receiver<WatchEvent>,
    root: &Path,
    prompter: &TerminalPrompter,
    tick: Duration,
    verbosity: Verbosity,
) -> Result<()> {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    engine.refresh();
    let mut shown = engine.snapshot();

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let changed = drain_changes(events, root);
                if !changed.is_empty() {
                    engine.on_files_changed(&changed);
                }
                engine.tick();

                let current = engine.snapshot();
                if !Arc::ptr_eq(&current, &shown) {
                    output::print(
                        format!(
                            "{} lock(s), {} yours",
                            current.len(),
                            engine.own_locks().len()
                        ),
                        verbosity,
                    );
                    shown = current;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                if engine.request_quit(prompter) {
                    break;
                }
                if !prompter.is_interactive() {
                    tracing::warn!(
                        "quitting while still holding {} lock(s)",
                        engine.own_locks().len()
                    );
                    break;
                }
            }
        }
    }
    Ok(())
}

/// Repository-relative paths from all pending watcher events.
fn drain_changes(events: &Receiver<WatchEvent>, root: &Path) -> Vec<String> {
    let mut changed = Vec::new();
    loop {
        match events.try_recv() {
            Ok(Ok(event)) => {
                if matches!(event.kind, EventKind::Access(_)) {
                    continue;
                }
                changed.extend(event.paths.iter().filter_map(|p| relative_path(p, root)));
            }
            Ok(Err(e)) => tracing::warn!("file watcher error: {}", e),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
        }
    }
    changed.sort();
    changed.dedup();
    changed
}

/// `path` relative to `root`, or None for paths outside it or under `.git`.
fn relative_path(path: &Path, root: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?;
    if relative
        .components()
        .any(|c| c == Component::Normal(".git".as_ref()))
    {
        return None;
    }
    let text = normalize_path(&relative.to_string_lossy());
    (!text.is_empty()).then_some(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn relative_paths_skip_git_dir() {
        let root = PathBuf::from("/work/game");
        assert_eq!(
            relative_path(Path::new("/work/game/Assets/hero.png"), &root),
            Some("Assets/hero.png".to_string())
        );
        assert_eq!(relative_path(Path::new("/work/game/.git/index.lock"), &root), None);
        assert_eq!(relative_path(Path::new("/elsewhere/file.png"), &root), None);
        assert_eq!(relative_path(&root, &root), None);
    }

    #[test]
    fn drain_collects_and_dedups() {
        let root = PathBuf::from("/work/game");
        let (tx, rx) = crossbeam_channel::unbounded::<WatchEvent>();
        let modify = |p: &str| {
            Event::new(EventKind::Modify(notify::event::ModifyKind::Any))
                .add_path(PathBuf::from(p))
        };
        tx.send(Ok(modify("/work/game/Assets/a.png"))).unwrap();
        tx.send(Ok(modify("/work/game/Assets/a.png"))).unwrap();
        tx.send(Ok(Event::new(EventKind::Access(notify::event::AccessKind::Any))
            .add_path(PathBuf::from("/work/game/Assets/b.png"))))
            .unwrap();
        tx.send(Ok(modify("/work/game/.git/HEAD"))).unwrap();

        assert_eq!(drain_changes(&rx, &root), vec!["Assets/a.png".to_string()]);
        assert!(drain_changes(&rx, &root).is_empty());
    }
}
