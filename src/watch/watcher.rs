// src/watch/watcher.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::engine::EngineEvent;
use crate::watch::path_utils::is_ignored_path;

/// Upper bound on the interval between size checks while waiting for a
/// file to settle.
const STABILITY_POLL: Duration = Duration::from_millis(100);

/// Give up waiting for a file that keeps growing after this long.
const STABILITY_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle for the filesystem watcher.
///
/// Dropping this handle stops file watching.
pub struct WatcherHandle {
    _inner: RecommendedWatcher,
    roots: Vec<PathBuf>,
}

impl WatcherHandle {
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }
}

impl std::fmt::Debug for WatcherHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatcherHandle")
            .field("roots", &self.roots)
            .finish()
    }
}

/// What to watch and what to leave alone.
#[derive(Debug, Clone)]
pub struct WatchOptions {
    /// Directories watched recursively. Missing ones are skipped.
    pub roots: Vec<PathBuf>,
    /// Exact files never forwarded (e.g. the generated types file).
    pub ignore_files: Vec<PathBuf>,
    /// How long a file's size must stay unchanged before its event counts.
    pub stability_threshold: Duration,
}

/// Spawn a watcher over `options.roots` that forwards settled changes as
/// `EngineEvent::PathsChanged`.
pub fn spawn_watcher(
    options: WatchOptions,
    runtime_tx: mpsc::Sender<EngineEvent>,
) -> Result<WatcherHandle> {
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<Event>();

    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<Event>| match res {
            Ok(event) => {
                if let Err(err) = event_tx.send(event) {
                    eprintln!("autoload: failed to forward notify event: {err}");
                }
            }
            Err(err) => eprintln!("autoload: file watch error: {err}"),
        },
        Config::default(),
    )?;

    let mut roots = Vec::new();
    for root in &options.roots {
        if !root.is_dir() {
            warn!(?root, "watch directory does not exist; skipping");
            continue;
        }
        watcher.watch(root, RecursiveMode::Recursive)?;
        roots.push(root.clone());
    }
    info!(?roots, "file watcher started");

    let filter = Arc::new(PathFilter {
        roots: roots.clone(),
        ignore_files: options.ignore_files.clone(),
    });
    let threshold = options.stability_threshold;

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if matches!(event.kind, EventKind::Access(_)) {
                continue;
            }
            debug!(?event, "received notify event");

            let paths: Vec<PathBuf> = event
                .paths
                .into_iter()
                .filter(|p| filter.accepts(p))
                .collect();
            if paths.is_empty() {
                continue;
            }

            let tx = runtime_tx.clone();
            tokio::spawn(async move {
                for path in &paths {
                    wait_for_stable(path, threshold).await;
                }
                if let Err(err) = tx.send(EngineEvent::PathsChanged(paths)).await {
                    debug!("runtime channel closed; dropping change: {err}");
                }
            });
        }

        debug!("file watcher loop ended");
    });

    Ok(WatcherHandle {
        _inner: watcher,
        roots,
    })
}

#[derive(Debug)]
struct PathFilter {
    roots: Vec<PathBuf>,
    ignore_files: Vec<PathBuf>,
}

impl PathFilter {
    fn accepts(&self, path: &Path) -> bool {
        if self.ignore_files.iter().any(|f| f == path) {
            return false;
        }
        // Only the part below the watched root is checked, so a project
        // living under a dot directory is still watched.
        let rel = self
            .roots
            .iter()
            .find_map(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        !is_ignored_path(rel)
    }
}

/// Wait until the size of `path` stays the same for `threshold`.
///
/// Returns immediately for files that no longer exist.
pub async fn wait_for_stable(path: &Path, threshold: Duration) {
    if threshold.is_zero() {
        return;
    }
    let poll = threshold.min(STABILITY_POLL);
    let started = Instant::now();

    let mut last = file_size(path).await;
    let mut stable_since = Instant::now();
    loop {
        if last.is_none() {
            return;
        }
        if stable_since.elapsed() >= threshold {
            return;
        }
        if started.elapsed() >= STABILITY_TIMEOUT {
            warn!(?path, "file did not settle; forwarding change anyway");
            return;
        }
        tokio::time::sleep(poll).await;
        let current = file_size(path).await;
        if current != last {
            last = current;
            stable_since = Instant::now();
        }
    }
}

async fn file_size(path: &Path) -> Option<u64> {
    tokio::fs::metadata(path).await.ok().map(|m| m.len())
}
