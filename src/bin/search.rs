use clap::Parser;
use statute_rag::{Config, RetrievalEngine};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "search")]
#[command(about = "Answer a question with grounded snippets from the statute corpus")]
struct Args {
    /// Free-text question
    query: String,

    /// Number of results (defaults to search.default_k)
    #[arg(short = 'k', long)]
    top_k: Option<usize>,

    /// Corpus directory (defaults to the configured one)
    #[arg(long)]
    dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", "warn")
    ).init();

    let args = Args::parse();
    if args.query.trim().is_empty() {
        anyhow::bail!("Query cannot be empty");
    }

    let mut config = Config::load()?;
    if let Some(dir) = args.dir {
        config.corpus.dir = dir;
    }
    let top_k = args.top_k.unwrap_or(config.search.default_k);

    let mut engine = RetrievalEngine::from_config(config);

    let start = Instant::now();
    let answer = engine.search(&args.query, top_k).await;
    log::info!("Search took {:?}", start.elapsed());

    match answer {
        Some(answer) => println!("{}", answer),
        None => println!("No grounded evidence found for \"{}\".", args.query.trim()),
    }

    Ok(())
}
