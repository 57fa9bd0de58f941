use anyhow::Result;
use statute_rag::{Config, IndexDiagnostics, RetrievalEngine};
use std::path::Path;
use tokio::io::{AsyncBufReadExt, BufReader};

const HELP: &str = "\
Type a question to search the corpus. Commands:
  :stats        diagnostics of the last ingestion
  :reindex      re-ingest the corpus directory
  :add <path>   re-ingest the directory holding a newly copied PDF
  :clear        drop the in-memory index
  :help         this text
  :quit         exit";

fn print_diagnostics(d: &IndexDiagnostics) {
    println!(
        "processed={} reused={} deleted={} pages={}",
        d.processed_files, d.reused_files, d.deleted_files, d.total_pages
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so answers on stdout stay clean
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "info")
    ).init();

    log::info!("Starting Statute RAG v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;
    let top_k = config.search.default_k;
    log::info!("Corpus: {}", config.corpus_dir().display());
    log::info!(
        "Semantic search: {}",
        if config.embeddings.enabled { config.embeddings.model.as_str() } else { "off" }
    );

    let mut engine = RetrievalEngine::from_config(config);
    match engine.ingest_default().await {
        Ok(summary) => {
            for skipped in &summary.skipped {
                log::warn!("Skipped {}: {:?}", skipped.path.display(), skipped.reason);
            }
            print_diagnostics(&summary.diagnostics);
        }
        Err(e) => log::error!("Initial ingestion failed: {}", e),
    }

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        match line {
            "" => continue,
            ":quit" | ":q" => break,
            ":help" => println!("{}", HELP),
            ":stats" => print_diagnostics(&engine.diagnostics()),
            ":clear" => {
                engine.clear_index();
                println!("Index cleared.");
            }
            ":reindex" => match engine.ingest_default().await {
                Ok(summary) => print_diagnostics(&summary.diagnostics),
                Err(e) => println!("Ingestion failed: {}", e),
            },
            _ if line.starts_with(":add ") => {
                let path = Path::new(line[":add ".len()..].trim());
                match engine.add_pdf(path).await {
                    Ok(summary) => print_diagnostics(&summary.diagnostics),
                    Err(e) => println!("Ingestion failed: {}", e),
                }
            }
            query => match engine.search(query, top_k).await {
                Some(answer) => println!("{}", answer),
                None => println!("No grounded evidence found."),
            },
        }
    }

    Ok(())
}
