//! Watch/dispatch loop.
//!
//! The notify callback forwards every event into an unbounded channel. A
//! single dedicated thread drains it and re-reads the bound file for each
//! event, one event at a time, so events for one path apply in arrival
//! order and the last one wins.

use dashmap::{DashMap, DashSet};
use notify::event::ModifyKind;
use notify::{Event, EventKind, PollWatcher, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tokio::sync::mpsc;

use crate::config::{WatchBackend, WatchConfig};
use crate::flag::handle::{Binding, Phase};
use crate::observability::metrics;

/// Dynamic flags keyed by the absolute path of their backing file.
pub(crate) type Bindings = Arc<DashMap<PathBuf, Arc<dyn Binding>>>;

/// Messages consumed by the dispatch thread.
pub(crate) enum Dispatch {
    Event(notify::Result<Event>),
    Stop,
}

/// The notification backend and the directories handed to it. Shared by
/// the registry, which adds watches at bind time, and the dispatch thread,
/// which adds them when a missing directory appears.
#[derive(Default)]
pub(crate) struct Watches {
    watcher: Mutex<Option<Box<dyn Watcher + Send>>>,
    dirs: DashSet<PathBuf>,
}

impl Watches {
    pub(crate) fn new(watcher: Box<dyn Watcher + Send>) -> Self {
        Self {
            watcher: Mutex::new(Some(watcher)),
            dirs: DashSet::new(),
        }
    }

    /// Watch `dir` once. Returns whether it is watched afterwards.
    fn watch(&self, dir: &Path) -> bool {
        if !self.dirs.insert(dir.to_path_buf()) {
            return true;
        }

        let mut guard = lock(&self.watcher);
        let Some(watcher) = guard.as_mut() else {
            self.dirs.remove(dir);
            return false;
        };
        match watcher.watch(dir, RecursiveMode::NonRecursive) {
            Ok(()) => true,
            Err(e) => {
                tracing::debug!(dir = %dir.display(), error = %e, "Cannot watch directory");
                self.dirs.remove(dir);
                false
            }
        }
    }

    /// Watch `dir`, or its nearest existing ancestor while `dir` does not
    /// exist yet. Creating the next missing component then produces an
    /// event that moves the watch one level down.
    pub(crate) fn watch_nearest(&self, dir: &Path) {
        let Some(mut current) = dir.ancestors().find(|a| a.is_dir()) else {
            return;
        };
        loop {
            if !self.watch(current) || current == dir {
                return;
            }
            // The next component may have appeared before the watch was in
            // place, in which case its create event was never delivered.
            match dir.ancestors().find(|a| a.parent() == Some(current)) {
                Some(child) if child.is_dir() => current = child,
                _ => {
                    tracing::debug!(
                        dir = %dir.display(),
                        watching = %current.display(),
                        "Directory missing, watching ancestor"
                    );
                    return;
                }
            }
        }
    }

    /// Drop bookkeeping for `dir` and everything below it, so a removed and
    /// recreated directory is watched again.
    fn forget(&self, dir: &Path) {
        self.dirs.retain(|d| !d.starts_with(dir));
    }

    #[cfg(test)]
    fn is_watched(&self, dir: &Path) -> bool {
        self.dirs.contains(dir)
    }

    /// Tear down the backend. Later watch requests are ignored.
    pub(crate) fn shutdown(&self) {
        drop(lock(&self.watcher).take());
        self.dirs.clear();
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Create the notification backend, forwarding into `tx`.
pub(crate) fn build_watcher(
    config: &WatchConfig,
    tx: mpsc::UnboundedSender<Dispatch>,
) -> notify::Result<Box<dyn Watcher + Send>> {
    let handler = move |res: notify::Result<Event>| {
        // The receiver is gone once the set is closed.
        let _ = tx.send(Dispatch::Event(res));
    };

    let watcher: Box<dyn Watcher + Send> = match config.backend {
        WatchBackend::Native => Box::new(RecommendedWatcher::new(
            handler,
            notify::Config::default(),
        )?),
        WatchBackend::Poll => Box::new(PollWatcher::new(
            handler,
            notify::Config::default().with_poll_interval(config.poll_interval()),
        )?),
    };
    Ok(watcher)
}

/// Start the dispatch thread.
pub(crate) fn spawn(
    bindings: Bindings,
    watches: Arc<Watches>,
    rx: mpsc::UnboundedReceiver<Dispatch>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("k8sflag-dispatch".into())
        .spawn(move || run(bindings, watches, rx))
}

fn run(
    bindings: Bindings,
    watches: Arc<Watches>,
    mut rx: mpsc::UnboundedReceiver<Dispatch>,
) {
    tracing::debug!("Dispatch loop started");

    while let Some(msg) = rx.blocking_recv() {
        match msg {
            Dispatch::Event(Ok(event)) => handle_event(&bindings, &watches, &event),
            Dispatch::Event(Err(e)) => {
                tracing::debug!(error = %e, "Error event");
                metrics::record_watch_error();
            }
            Dispatch::Stop => break,
        }
    }

    tracing::debug!("Dispatch loop stopped");
}

pub(crate) fn handle_event(bindings: &Bindings, watches: &Watches, event: &Event) {
    if event.kind.is_access() {
        return;
    }

    for path in &event.paths {
        // Clone out of the map so no shard lock is held during the read.
        let bound = bindings.get(path).map(|b| Arc::clone(b.value()));
        match bound {
            Some(binding) => refresh(path, &binding),
            None if is_atomic_writer_entry(path) => refresh_dir(bindings, path),
            None => {
                if !(changes_entries(event) && refresh_subtree(bindings, watches, path)) {
                    tracing::debug!(path = %path.display(), "No binding");
                }
            }
        }
    }
}

fn refresh(path: &Path, binding: &Arc<dyn Binding>) {
    if let Err(e) = binding.refresh(path, Phase::Update) {
        tracing::warn!(flag = %binding.name(), error = %e, "Refresh failed");
    }
}

/// Kubernetes volumes publish updates by swapping a `..data` symlink, so
/// the files themselves never see an event. Any change to a `..` entry
/// refreshes every binding in the same directory.
fn refresh_dir(bindings: &Bindings, entry: &Path) {
    let Some(dir) = entry.parent() else {
        return;
    };

    let affected: Vec<(PathBuf, Arc<dyn Binding>)> = bindings
        .iter()
        .filter(|b| b.key().parent() == Some(dir))
        .map(|b| (b.key().clone(), Arc::clone(b.value())))
        .collect();

    tracing::debug!(
        entry = %entry.display(),
        flags = affected.len(),
        "Volume update, refreshing directory"
    );
    for (path, binding) in &affected {
        refresh(path, binding);
    }
}

/// A directory on the way to one or more bound files was created or
/// removed. Move the watches to follow it and re-read everything below.
/// Returns false when nothing is bound under `dir`.
fn refresh_subtree(bindings: &Bindings, watches: &Watches, dir: &Path) -> bool {
    let affected: Vec<(PathBuf, Arc<dyn Binding>)> = bindings
        .iter()
        .filter(|b| b.key() != dir && b.key().starts_with(dir))
        .map(|b| (b.key().clone(), Arc::clone(b.value())))
        .collect();
    if affected.is_empty() {
        return false;
    }

    tracing::debug!(
        dir = %dir.display(),
        flags = affected.len(),
        "Directory changed, refreshing flags below it"
    );
    watches.forget(dir);
    for (path, binding) in &affected {
        if let Some(parent) = path.parent() {
            watches.watch_nearest(parent);
        }
        refresh(path, binding);
    }
    true
}

fn changes_entries(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Any
            | EventKind::Create(_)
            | EventKind::Remove(_)
            | EventKind::Modify(ModifyKind::Name(_))
    )
}

fn is_atomic_writer_entry(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with(".."))
}
