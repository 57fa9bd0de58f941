//! Summarize the persisted ingestion cache of a corpus directory without
//! ingesting anything.

use clap::Parser;
use statute_rag::ingest::{cache_path, CacheLoad, IngestionCache};
use statute_rag::Config;
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "stats")]
#[command(about = "Show what the ingestion cache of a corpus directory holds")]
struct Args {
    /// Corpus directory (defaults to the configured one)
    dir: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = Config::load()?;
    let dir = args.dir.unwrap_or_else(|| config.corpus_dir().to_path_buf());
    let path = cache_path(&dir, &config.corpus.cache_file_name);

    let (cache, load) = IngestionCache::load(&path);

    println!("\n=== Statute RAG Cache: {} ===\n", path.display());
    match load {
        CacheLoad::Missing => {
            println!("No cache yet. Run `ingest` first.");
            return Ok(());
        }
        CacheLoad::Malformed(reason) => {
            println!("Cache is unreadable ({}); the next ingestion rebuilds it.", reason);
            return Ok(());
        }
        CacheLoad::Loaded { dropped_entries } if dropped_entries > 0 => {
            println!("Warning: {} malformed entries ignored.\n", dropped_entries);
        }
        CacheLoad::Loaded { .. } => {}
    }

    println!("{:-<80}", "");
    println!("{:<50} {:>8} {:>18}", "File", "Pages", "Digest");
    println!("{:-<80}", "");
    for (file, entry) in &cache.files {
        let name = Path::new(file)
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| file.clone());
        let exists = if Path::new(file).exists() { "" } else { " (missing)" };
        println!(
            "{:<50} {:>8} {:>18}",
            format!("{}{}", name, exists),
            entry.pages.len(),
            &entry.content_digest[..entry.content_digest.len().min(16)]
        );
    }
    println!("{:-<80}", "");
    println!("Files: {}", cache.len());
    println!("Pages: {}", cache.total_pages());
    println!();

    Ok(())
}
