//! Watch mode: resync whenever the source tree changes.
//!
//! ```text
//! notify callback ──Changed──▶ ┌────────────┐   quiet period    ┌──────────┐
//!                              │ watch loop │ ────elapsed────▶ │ SyncSlot │──▶ worker thread
//! worker ──────SyncFinished──▶ └────────────┘                  └──────────┘     (one at a time)
//! ```
//!
//! Every relevant file-system event restarts the quiet period. When it
//! elapses a sync is requested through a single-slot queue: a request while
//! a sync is running marks one follow-up run, and any number of further
//! requests collapse into that same follow-up. Requests are never dropped.
//!
//! Access events and events confined to the root `thumbnails/` directory
//! are ignored; the sync writes there itself.

use crate::paths::THUMBNAILS_DIR;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WatchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// Sync scheduling state: at most one run in flight, at most one pending.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SyncSlot {
    #[default]
    Idle,
    Running,
    RunningQueued,
}

impl SyncSlot {
    /// Ask for a sync. Returns `true` when the caller should start one now.
    pub fn request(&mut self) -> bool {
        match self {
            SyncSlot::Idle => {
                *self = SyncSlot::Running;
                true
            }
            SyncSlot::Running | SyncSlot::RunningQueued => {
                *self = SyncSlot::RunningQueued;
                false
            }
        }
    }

    /// A run finished. Returns `true` when the queued run should start now.
    pub fn finish(&mut self) -> bool {
        match self {
            SyncSlot::RunningQueued => {
                *self = SyncSlot::Running;
                true
            }
            SyncSlot::Running | SyncSlot::Idle => {
                *self = SyncSlot::Idle;
                false
            }
        }
    }
}

/// Trailing-edge debounce on explicit instants.
#[derive(Debug, Clone)]
pub struct Debouncer {
    quiet: Duration,
    deadline: Option<Instant>,
}

impl Debouncer {
    pub fn new(quiet: Duration) -> Self {
        Self { quiet, deadline: None }
    }

    /// An event arrived: (re)start the quiet period.
    pub fn on_event(&mut self, now: Instant) {
        self.deadline = Some(now + self.quiet);
    }

    /// Whether the quiet period has elapsed. Fires once per burst.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Time left in the current quiet period, `None` when idle.
    pub fn time_until(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }
}

/// Messages driving the watch loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchMessage {
    /// A relevant file-system change.
    Changed,
    /// The worker finished a sync (successfully or not).
    SyncFinished,
    Shutdown,
}

/// Counters returned when the loop stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WatchStats {
    pub events: u64,
    pub runs: u64,
}

/// Whether a file-system event should trigger a resync.
pub fn is_relevant(event: &Event, source_dir: &Path) -> bool {
    if matches!(event.kind, EventKind::Access(_)) {
        return false;
    }
    if event.paths.is_empty() {
        return true;
    }
    let thumbs_dir = source_dir.join(THUMBNAILS_DIR);
    !event.paths.iter().all(|p| p.starts_with(&thumbs_dir))
}

fn spawn_run<F>(run_sync: &Arc<F>, tx: &Sender<WatchMessage>) -> JoinHandle<()>
where
    F: Fn() + Send + Sync + 'static,
{
    let run_sync = Arc::clone(run_sync);
    let tx = tx.clone();
    std::thread::spawn(move || {
        run_sync();
        let _ = tx.send(WatchMessage::SyncFinished);
    })
}

/// Drive debounce and the sync slot from `rx` until [`WatchMessage::Shutdown`]
/// (or until every sender is gone). An initial sync starts immediately.
///
/// `tx` must feed `rx`; workers use it to report completion.
pub fn run_watch_loop<F>(
    rx: Receiver<WatchMessage>,
    tx: Sender<WatchMessage>,
    quiet: Duration,
    run_sync: F,
) -> WatchStats
where
    F: Fn() + Send + Sync + 'static,
{
    let run_sync = Arc::new(run_sync);
    let mut slot = SyncSlot::default();
    let mut debouncer = Debouncer::new(quiet);
    let mut stats = WatchStats::default();
    let mut worker: Option<JoinHandle<()>> = None;

    if slot.request() {
        stats.runs += 1;
        worker = Some(spawn_run(&run_sync, &tx));
    }

    loop {
        let message = match debouncer.time_until(Instant::now()) {
            Some(wait) => match rx.recv_timeout(wait) {
                Ok(message) => Some(message),
                Err(RecvTimeoutError::Timeout) => None,
                Err(RecvTimeoutError::Disconnected) => break,
            },
            None => match rx.recv() {
                Ok(message) => Some(message),
                Err(_) => break,
            },
        };

        let mut start = false;
        match message {
            Some(WatchMessage::Changed) => {
                stats.events += 1;
                debouncer.on_event(Instant::now());
            }
            Some(WatchMessage::SyncFinished) => {
                if let Some(handle) = worker.take() {
                    let _ = handle.join();
                }
                start = slot.finish();
            }
            Some(WatchMessage::Shutdown) => break,
            None => {}
        }
        if debouncer.poll(Instant::now()) {
            start |= slot.request();
        }
        if start {
            stats.runs += 1;
            worker = Some(spawn_run(&run_sync, &tx));
        }
    }

    if let Some(handle) = worker.take() {
        let _ = handle.join();
    }
    stats
}

/// Watch `source_dir` recursively and call `run_sync` after every quiet
/// period. Blocks for the life of the process.
pub fn watch<F>(source_dir: &Path, quiet: Duration, run_sync: F) -> Result<WatchStats, WatchError>
where
    F: Fn() + Send + Sync + 'static,
{
    std::fs::create_dir_all(source_dir)?;
    let (tx, rx) = mpsc::channel();

    let events_tx = tx.clone();
    let watched: PathBuf = source_dir.canonicalize()?;
    let filter_root = watched.clone();
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<Event>| match res {
        Ok(event) => {
            if is_relevant(&event, &filter_root) {
                let _ = events_tx.send(WatchMessage::Changed);
            }
        }
        Err(e) => eprintln!("watch error: {e}"),
    })?;
    watcher.watch(&watched, RecursiveMode::Recursive)?;

    Ok(run_watch_loop(rx, tx, quiet, run_sync))
}
