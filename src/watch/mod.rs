//! File watcher: re-ingest the corpus directory when its PDFs change.
//!
//! A notify thread debounces raw events and forwards settled paths; the async
//! loop drains whatever has queued up and runs one incremental ingestion for
//! the whole batch, so unchanged files are reused from the cache.

mod watcher;

pub use watcher::is_relevant;

use std::path::PathBuf;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use tokio::sync::Mutex as AsyncMutex;

use crate::engine::RetrievalEngine;
use crate::error::{Result, StatuteRagError};

/// Drain everything already queued behind `first`, deduplicated.
fn coalesce(first: PathBuf, rx: &mpsc::Receiver<PathBuf>) -> Vec<PathBuf> {
    let mut batch = vec![first];
    while let Ok(p) = rx.try_recv() {
        if !batch.contains(&p) {
            batch.push(p);
        }
    }
    batch
}

/// Watch the engine's corpus directory until the watcher thread exits.
///
/// The engine sits behind an async mutex so other tasks can keep searching
/// between ingestion passes.
pub async fn run_watcher(engine: Arc<AsyncMutex<RetrievalEngine>>, debounce_ms: u64) -> Result<()> {
    let (root, cache_file_name) = {
        let engine = engine.lock().await;
        let config = engine.config();
        (config.corpus_dir().to_path_buf(), config.corpus.cache_file_name.clone())
    };
    std::fs::create_dir_all(&root)?;

    let (tx, rx) = mpsc::channel();
    let rx = Arc::new(Mutex::new(rx));

    let thread_root = root.clone();
    std::thread::spawn(move || {
        if let Err(e) = watcher::run_watcher_thread(&thread_root, &cache_file_name, debounce_ms, tx) {
            log::error!("watcher thread error: {}", e);
        }
    });

    loop {
        let rx_clone = rx.clone();
        let batch = tokio::task::spawn_blocking(move || {
            let rx = rx_clone.lock().unwrap_or_else(|p| p.into_inner());
            rx.recv().map(|first| coalesce(first, &rx))
        })
        .await
        .map_err(|e| StatuteRagError::Config(format!("watcher task join: {}", e)))?;

        let batch = match batch {
            Ok(b) => b,
            Err(_) => break,
        };
        for p in &batch {
            log::info!("watch: change in {}", p.display());
        }

        let mut engine = engine.lock().await;
        match engine.ingest(&root).await {
            Ok(summary) => {
                let d = summary.diagnostics;
                log::info!(
                    "watch: re-indexed {} (processed={}, reused={}, deleted={}, pages={})",
                    root.display(),
                    d.processed_files,
                    d.reused_files,
                    d.deleted_files,
                    d.total_pages
                );
            }
            Err(e) => log::error!("watch: ingestion of {} failed: {}", root.display(), e),
        }
    }
    Ok(())
}
