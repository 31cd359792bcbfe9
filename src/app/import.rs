// FollowDiff - app/import.rs
//
// Background import lifecycle. Reads an export file and builds its username
// set on a worker thread, sending progress messages to the consumer thread
// via an mpsc channel.
//
// Architecture:
//   - `ImportManager` lives on the consumer thread; `run_import` runs on a
//     worker thread, one per started import.
//   - Workers never touch the session. They produce an `ImportOutcome`; the
//     consumer decides whether to commit it.
//   - Each side has a generation counter. Starting a new import for a side
//     cancels the in-flight one and bumps the generation; messages tagged
//     with an older generation are stale and must not be committed.
//   - Extraction is chunked: the worker checks its cancel flag and yields
//     the thread between fixed-size slices of records.

use crate::core::importer::{self, ImportConfig};
use crate::core::model::{ImportProgress, Side};
use crate::platform::fs;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};

/// Per-side bookkeeping.
#[derive(Debug, Default)]
struct SideSlot {
    /// Generation of the most recently started import.
    generation: u64,

    /// Cancel flag of the in-flight import; `None` when idle.
    cancel_flag: Option<Arc<AtomicBool>>,
}

/// Manages background imports for both sides.
pub struct ImportManager {
    config: ImportConfig,
    tx: mpsc::Sender<ImportProgress>,
    rx: mpsc::Receiver<ImportProgress>,
    slots: [SideSlot; 2],
}

impl ImportManager {
    pub fn new(config: ImportConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            config,
            tx,
            rx,
            slots: Default::default(),
        }
    }

    /// Start importing `path` for `side` on a worker thread.
    ///
    /// Any import already running for the same side is cancelled and its
    /// results become stale. Returns the generation of the new import.
    pub fn start_import(&mut self, side: Side, path: PathBuf) -> u64 {
        self.cancel(side);

        let cancel = Arc::new(AtomicBool::new(false));
        let slot = &mut self.slots[side.index()];
        slot.generation += 1;
        slot.cancel_flag = Some(Arc::clone(&cancel));
        let generation = slot.generation;

        let tx = self.tx.clone();
        let config = self.config.clone();

        tracing::info!(side = %side, generation, file = %path.display(), "Import started");

        std::thread::spawn(move || {
            run_import(side, generation, path, config, tx, cancel);
        });

        generation
    }

    /// Request cancellation of the running import for `side`, if any.
    /// The worker sends `ImportProgress::Cancelled` and exits.
    pub fn cancel(&mut self, side: Side) {
        if let Some(flag) = self.slots[side.index()].cancel_flag.take() {
            flag.store(true, Ordering::SeqCst);
            tracing::debug!(side = %side, "Import cancelled");
        }
    }

    /// True if `message` belongs to the latest import started for its side.
    pub fn is_current(&self, message: &ImportProgress) -> bool {
        self.slots[message.side().index()].generation == message.generation()
    }

    /// True while the latest import for `side` has not finished.
    pub fn in_flight(&self, side: Side) -> bool {
        self.slots[side.index()].cancel_flag.is_some()
    }

    fn any_in_flight(&self) -> bool {
        Side::all().iter().any(|side| self.in_flight(*side))
    }

    /// Poll for progress messages without blocking. Returns all pending
    /// messages, stale ones included; filter with [`Self::is_current`].
    pub fn poll_progress(&mut self) -> Vec<ImportProgress> {
        let mut messages = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            self.observe(&msg);
            messages.push(msg);
        }
        messages
    }

    /// Block until the next message arrives. Returns `None` once no import
    /// is in flight, so callers can loop on it without hanging.
    pub fn wait_next(&mut self) -> Option<ImportProgress> {
        if let Ok(msg) = self.rx.try_recv() {
            self.observe(&msg);
            return Some(msg);
        }
        if !self.any_in_flight() {
            return None;
        }
        // The manager holds a sender, so recv only fails if that is dropped.
        let msg = self.rx.recv().ok()?;
        self.observe(&msg);
        Some(msg)
    }

    /// Clear the in-flight marker when the current import of a side ends.
    fn observe(&mut self, message: &ImportProgress) {
        if message.is_terminal() && self.is_current(message) {
            self.slots[message.side().index()].cancel_flag = None;
        }
    }
}

impl Drop for ImportManager {
    fn drop(&mut self) {
        for slot in &mut self.slots {
            if let Some(flag) = slot.cancel_flag.take() {
                flag.store(true, Ordering::SeqCst);
            }
        }
    }
}

// =============================================================================
// Worker
// =============================================================================

/// Read, parse, and extract one file. Runs on a worker thread.
fn run_import(
    side: Side,
    generation: u64,
    path: PathBuf,
    config: ImportConfig,
    tx: mpsc::Sender<ImportProgress>,
    cancel: Arc<AtomicBool>,
) {
    macro_rules! send {
        ($msg:expr) => {
            if tx.send($msg).is_err() {
                return; // Receiver dropped; exit quietly.
            }
        };
    }

    macro_rules! check_cancel {
        () => {
            if cancel.load(Ordering::SeqCst) {
                send!(ImportProgress::Cancelled { side, generation });
                return;
            }
        };
    }

    send!(ImportProgress::Started { side, generation });

    let file = fs::display_name(&path);
    let text = match fs::read_import_file(&path, config.max_file_size) {
        Ok(text) => text,
        Err(error) => {
            tracing::warn!(side = %side, error = %error, "Import file read failed");
            send!(ImportProgress::Failed {
                side,
                generation,
                error,
            });
            return;
        }
    };

    check_cancel!();

    let result = importer::import_text_chunked(&file, &text, &config, |processed, total| {
        if cancel.load(Ordering::SeqCst) {
            return ControlFlow::Break(());
        }
        // Non-fatal: the consumer may have stopped listening.
        let _ = tx.send(ImportProgress::Progress {
            side,
            generation,
            processed,
            total,
        });
        std::thread::yield_now();
        ControlFlow::Continue(())
    });

    match result {
        Ok(Some(outcome)) => send!(ImportProgress::Completed {
            side,
            generation,
            outcome,
        }),
        Ok(None) => send!(ImportProgress::Cancelled { side, generation }),
        Err(error) => {
            tracing::warn!(side = %side, error = %error, "Import failed");
            send!(ImportProgress::Failed {
                side,
                generation,
                error,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::session::Session;
    use crate::util::error::ImportError;
    use std::path::Path;
    use tempfile::TempDir;

    fn write(dir: &Path, name: &str, names: &[&str]) -> PathBuf {
        let items: Vec<String> = names
            .iter()
            .map(|n| format!(r#"{{"string_list_data":[{{"value":"{n}"}}]}}"#))
            .collect();
        let path = dir.join(name);
        std::fs::write(&path, format!("[{}]", items.join(","))).unwrap();
        path
    }

    /// Drive the manager until nothing is in flight, committing current
    /// completions and collecting current failures.
    fn drain(manager: &mut ImportManager, session: &mut Session) -> Vec<ImportError> {
        let mut failures = Vec::new();
        while let Some(msg) = manager.wait_next() {
            if !manager.is_current(&msg) {
                continue;
            }
            match msg {
                ImportProgress::Completed { side, outcome, .. } => {
                    session.commit(side, outcome);
                }
                ImportProgress::Failed { error, .. } => failures.push(error),
                _ => {}
            }
        }
        failures
    }

    #[test]
    fn test_background_import_of_both_sides() {
        let dir = TempDir::new().unwrap();
        let followers = write(dir.path(), "followers_1.json", &["x", "y"]);
        let following = write(dir.path(), "following.json", &["x", "y", "z"]);

        let mut manager = ImportManager::new(ImportConfig::default());
        let mut session = Session::default();
        manager.start_import(Side::Followers, followers);
        manager.start_import(Side::Following, following);

        let failures = drain(&mut manager, &mut session);
        assert!(failures.is_empty(), "unexpected failures: {failures:?}");
        assert!(!manager.in_flight(Side::Followers));
        assert!(!manager.in_flight(Side::Following));

        let names: Vec<String> = session
            .non_followers(true, "")
            .iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(names, vec!["z"]);
    }

    #[test]
    fn test_missing_file_fails_without_touching_session() {
        let dir = TempDir::new().unwrap();
        let mut manager = ImportManager::new(ImportConfig::default());
        let mut session = Session::default();

        manager.start_import(Side::Followers, dir.path().join("absent.json"));
        let failures = drain(&mut manager, &mut session);

        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], ImportError::Read { .. }));
        assert!(!session.is_loaded(Side::Followers));
    }

    #[test]
    fn test_newer_import_supersedes_older() {
        let dir = TempDir::new().unwrap();
        let first = write(dir.path(), "first.json", &["stale"]);
        let second = write(dir.path(), "second.json", &["fresh"]);

        let mut manager = ImportManager::new(ImportConfig::default());
        let mut session = Session::default();

        let g1 = manager.start_import(Side::Following, first);
        let g2 = manager.start_import(Side::Following, second);
        assert!(g2 > g1);

        drain(&mut manager, &mut session);
        session.import_followers("f.json", "[]").unwrap();

        let names: Vec<String> = session
            .non_followers(true, "")
            .iter()
            .map(|u| u.to_string())
            .collect();
        assert_eq!(names, vec!["fresh"]);
    }

    #[test]
    fn test_progress_is_reported_in_chunks() {
        let dir = TempDir::new().unwrap();
        let many: Vec<String> = (0..250).map(|i| format!("user{i}")).collect();
        let refs: Vec<&str> = many.iter().map(String::as_str).collect();
        let path = write(dir.path(), "following.json", &refs);

        let config = ImportConfig {
            chunk_size: 100,
            ..Default::default()
        };
        let mut manager = ImportManager::new(config);
        manager.start_import(Side::Following, path);

        let mut progress = Vec::new();
        let mut completed = false;
        while let Some(msg) = manager.wait_next() {
            match msg {
                ImportProgress::Progress {
                    processed, total, ..
                } => progress.push((processed, total)),
                ImportProgress::Completed { outcome, .. } => {
                    assert_eq!(outcome.usernames.len(), 250);
                    completed = true;
                }
                _ => {}
            }
        }
        assert!(completed);
        assert_eq!(progress, vec![(100, 250), (200, 250), (250, 250)]);
    }

    #[test]
    fn test_wait_next_returns_none_when_idle() {
        let mut manager = ImportManager::new(ImportConfig::default());
        assert!(manager.wait_next().is_none());
        assert!(manager.poll_progress().is_empty());
    }
}
