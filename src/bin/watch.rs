//! Watch the corpus directory for PDF changes and re-ingest automatically.

use clap::Parser;
use statute_rag::watch::run_watcher;
use statute_rag::{Config, RetrievalEngine};
use std::sync::Arc;
use tokio::sync::Mutex;
use anyhow::Result;

#[derive(Parser, Debug)]
#[command(name = "watch")]
#[command(about = "Watch the corpus directory and re-ingest when PDFs change")]
struct Args {
    /// Debounce delay in milliseconds before processing a file change
    #[arg(long, default_value = "500")]
    debounce_ms: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().filter_or("RUST_LOG", "info"),
    )
    .init();

    let args = Args::parse();

    log::info!("Starting Statute RAG file watcher");
    let config = Config::load()?;
    log::info!("Corpus: {}", config.corpus_dir().display());
    log::info!("Debounce: {} ms", args.debounce_ms);

    let mut engine = RetrievalEngine::from_config(config);
    let summary = engine.ingest_default().await?;
    log::info!(
        "Initial index: {} pages ({} processed, {} reused)",
        summary.diagnostics.total_pages,
        summary.diagnostics.processed_files,
        summary.diagnostics.reused_files
    );

    log::info!("Watching for changes (Ctrl+C to stop)");
    run_watcher(Arc::new(Mutex::new(engine)), args.debounce_ms).await?;
    Ok(())
}
