use clap::Parser;
use statute_rag::{Config, RetrievalEngine};
use std::path::PathBuf;
use std::time::Instant;
use anyhow::Result;

#[derive(Parser, Debug)]
#[command(name = "ingest")]
#[command(about = "Incrementally index the statute PDFs in a directory")]
struct Args {
    /// Directory to ingest (defaults to the configured corpus directory)
    dir: Option<PathBuf>,

    /// Print the ingestion diagnostics as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    let args = Args::parse();

    let config = Config::load()?;
    let dir = args.dir.unwrap_or_else(|| config.corpus_dir().to_path_buf());
    log::info!("Ingesting {}", dir.display());

    let mut engine = RetrievalEngine::from_config(config);
    let start = Instant::now();
    let summary = engine.ingest(&dir).await?;
    let d = summary.diagnostics;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&d)?);
    }

    log::info!("=== Ingestion Complete ===");
    log::info!("Processed: {}", d.processed_files);
    log::info!("Reused (unchanged): {}", d.reused_files);
    log::info!("Deleted: {}", d.deleted_files);
    log::info!("Pages indexed: {}", d.total_pages);
    if summary.embedded_pages > 0 {
        log::info!("Pages embedded: {}", summary.embedded_pages);
    }
    log::info!("Time: {:?}", start.elapsed());

    if !summary.skipped.is_empty() {
        for skipped in &summary.skipped {
            log::warn!("✗ {}: {:?}", skipped.path.display(), skipped.reason);
        }
        log::warn!("{} file(s) skipped. They will be retried on the next run.", summary.skipped.len());
    }
    if !summary.cache_saved {
        log::warn!("Cache was not written; the next run will re-extract everything.");
    }

    Ok(())
}
