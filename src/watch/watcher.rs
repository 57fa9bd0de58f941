//! Watcher thread: notify + debounce, send settled PDF paths to the async side.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use notify::{RecursiveMode, Watcher};

use crate::error::{Result, StatuteRagError};
use crate::ingest::is_pdf;

/// Whether a filesystem event on `path` should trigger re-ingestion.
///
/// Only PDFs directly inside the corpus directory count; the cache file we
/// write ourselves never does.
pub fn is_relevant(path: &Path, cache_file_name: &str) -> bool {
    if path.file_name().map(|n| n == cache_file_name).unwrap_or(false) {
        return false;
    }
    is_pdf(path)
}

/// Watch `root` (non-recursively) and send each relevant path over `tx` once
/// it has been quiet for `debounce_ms`. Returns when the receiver is dropped
/// or the watcher fails to start.
pub fn run_watcher_thread(
    root: &Path,
    cache_file_name: &str,
    debounce_ms: u64,
    tx: mpsc::Sender<PathBuf>,
) -> Result<()> {
    let debounce = Duration::from_millis(debounce_ms);
    let (event_tx, event_rx) = mpsc::channel::<Vec<PathBuf>>();

    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if let Ok(ev) = res {
            let _ = event_tx.send(ev.paths);
        }
    })
    .map_err(|e| StatuteRagError::Config(format!("watcher: {}", e)))?;

    watcher
        .watch(root, RecursiveMode::NonRecursive)
        .map_err(|e| StatuteRagError::Config(format!("watch {}: {}", root.display(), e)))?;

    let mut pending: HashMap<PathBuf, Instant> = HashMap::new();

    loop {
        match event_rx.recv_timeout(debounce) {
            Ok(paths) => {
                let now = Instant::now();
                for p in paths.into_iter().filter(|p| is_relevant(p, cache_file_name)) {
                    pending.insert(p, now);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                let now = Instant::now();
                let ready: Vec<PathBuf> = pending
                    .iter()
                    .filter(|(_, t)| now.duration_since(**t) >= debounce)
                    .map(|(p, _)| p.clone())
                    .collect();
                for p in ready {
                    pending.remove(&p);
                    if tx.send(p).is_err() {
                        return Ok(());
                    }
                }
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }
    Ok(())
}
