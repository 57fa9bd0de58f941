//! The retrieval engine: owns the page index, the embedding index, the last
//! ingestion diagnostics and the ordered list of search tiers.
//!
//! All mutation goes through `&mut self`, so a caller sharing one engine across
//! tasks wraps it in a `tokio::sync::Mutex` (see the watch loop).

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::embeddings::{build_embedding_index, EmbeddingRecord, ModelHandle};
use crate::error::{Result, StatuteRagError};
use crate::index::{IndexDiagnostics, PageIndex};
use crate::ingest::{run_ingestion_pass, LopdfExtractor, PageExtractor, SkippedFile};
use crate::search::{
    render, EmbeddingTier, LexicalTier, RemoteEngineTier, SearchContext, SearchResults, SearchTier,
};

/// What an ingestion call reports back to its caller.
#[derive(Debug, Clone)]
pub struct IngestionSummary {
    pub directory: PathBuf,
    pub diagnostics: IndexDiagnostics,
    pub skipped: Vec<SkippedFile>,
    pub cache_saved: bool,
    /// Pages that also received a vector.
    pub embedded_pages: usize,
}

pub struct RetrievalEngine {
    config: Config,
    extractor: Box<dyn PageExtractor>,
    model: Option<Arc<ModelHandle>>,
    tiers: Vec<Box<dyn SearchTier>>,
    pages: PageIndex,
    embeddings: Vec<EmbeddingRecord>,
    diagnostics: IndexDiagnostics,
    index_built: bool,
}

/// Builder for [`RetrievalEngine`]; anything not set comes from the config.
pub struct RetrievalEngineBuilder {
    config: Config,
    extractor: Option<Box<dyn PageExtractor>>,
    model: Option<Arc<ModelHandle>>,
    tiers: Option<Vec<Box<dyn SearchTier>>>,
}

impl RetrievalEngineBuilder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            extractor: None,
            model: None,
            tiers: None,
        }
    }

    pub fn with_extractor(mut self, extractor: Box<dyn PageExtractor>) -> Self {
        self.extractor = Some(extractor);
        self
    }

    /// Use this model for the embedding tier, regardless of `embeddings.enabled`.
    pub fn with_model_handle(mut self, model: Arc<ModelHandle>) -> Self {
        self.model = Some(model);
        self
    }

    /// Replace the configured tier list entirely, in priority order.
    pub fn with_tiers(mut self, tiers: Vec<Box<dyn SearchTier>>) -> Self {
        self.tiers = Some(tiers);
        self
    }

    pub fn build(self) -> RetrievalEngine {
        let config = self.config;

        let model = self.model.or_else(|| {
            config
                .embeddings
                .enabled
                .then(|| Arc::new(ModelHandle::from_config(&config.embeddings)))
        });

        let tiers = match self.tiers {
            Some(tiers) => tiers,
            None => default_tiers(&config, model.as_ref()),
        };
        log::debug!(
            "Search tiers: {}",
            tiers.iter().map(|t| t.kind().as_str()).collect::<Vec<_>>().join(" -> ")
        );

        RetrievalEngine {
            extractor: self.extractor.unwrap_or_else(|| Box::new(LopdfExtractor::new())),
            config,
            model,
            tiers,
            pages: PageIndex::default(),
            embeddings: Vec::new(),
            diagnostics: IndexDiagnostics::default(),
            index_built: false,
        }
    }
}

/// Remote engine (when configured), embedding tier (when a model exists),
/// lexical tier always.
fn default_tiers(config: &Config, model: Option<&Arc<ModelHandle>>) -> Vec<Box<dyn SearchTier>> {
    let mut tiers: Vec<Box<dyn SearchTier>> = Vec::new();

    if let Some(url) = config.remote_engine_url() {
        match RemoteEngineTier::from_config(url, &config.engine) {
            Ok(tier) => tiers.push(Box::new(tier)),
            Err(e) => log::warn!("External embedding engine disabled: {}", e),
        }
    }
    if let Some(model) = model {
        tiers.push(Box::new(EmbeddingTier::new(model.clone())));
    }
    tiers.push(Box::new(LexicalTier));
    tiers
}

impl RetrievalEngine {
    pub fn builder(config: Config) -> RetrievalEngineBuilder {
        RetrievalEngineBuilder::new(config)
    }

    pub fn from_config(config: Config) -> Self {
        RetrievalEngineBuilder::new(config).build()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn diagnostics(&self) -> IndexDiagnostics {
        self.diagnostics
    }

    pub fn page_index(&self) -> &PageIndex {
        &self.pages
    }

    pub fn embedding_index(&self) -> &[EmbeddingRecord] {
        &self.embeddings
    }

    /// Incrementally ingest `dir` and swap in the rebuilt indexes.
    ///
    /// On error (directory unusable, PDF capability missing) the previous
    /// index, embeddings and diagnostics stay as they were.
    pub async fn ingest(&mut self, dir: &Path) -> Result<IngestionSummary> {
        let report = run_ingestion_pass(
            dir,
            &self.config.corpus.cache_file_name,
            self.extractor.as_ref(),
        )?;

        let embeddings = self.build_embeddings(&report.index).await;

        self.pages = report.index;
        self.embeddings = embeddings;
        self.diagnostics = report.diagnostics;
        self.index_built = true;

        Ok(IngestionSummary {
            directory: report.directory,
            diagnostics: report.diagnostics,
            skipped: report.skipped,
            cache_saved: report.cache_saved,
            embedded_pages: self.embeddings.len(),
        })
    }

    /// Ingest the configured corpus directory.
    pub async fn ingest_default(&mut self) -> Result<IngestionSummary> {
        let dir = self.config.corpus_dir().to_path_buf();
        self.ingest(&dir).await
    }

    /// Re-ingest the directory holding `path`, which must already be on disk.
    pub async fn add_pdf(&mut self, path: &Path) -> Result<IngestionSummary> {
        if !path.is_file() {
            return Err(StatuteRagError::InvalidInput(format!(
                "{} is not a file",
                path.display()
            )));
        }
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => self.config.corpus_dir().to_path_buf(),
        };
        self.ingest(&dir).await
    }

    /// Drop the in-memory indexes. The persisted cache is left alone and no
    /// implicit ingestion follows.
    pub fn clear_index(&mut self) {
        self.pages = PageIndex::default();
        self.embeddings.clear();
        self.diagnostics = IndexDiagnostics::default();
        self.index_built = true;
    }

    async fn build_embeddings(&self, index: &PageIndex) -> Vec<EmbeddingRecord> {
        let Some(model) = &self.model else {
            return Vec::new();
        };
        if index.is_empty() {
            return Vec::new();
        }
        let Some(embedder) = model.get() else {
            return Vec::new();
        };
        match build_embedding_index(embedder.as_ref(), index).await {
            Ok(records) => records,
            Err(e) => {
                log::warn!("Embedding index not built, falling back to lexical search: {}", e);
                Vec::new()
            }
        }
    }

    /// Run the tiers in order and return the first non-empty answer.
    ///
    /// `None` for an empty query, `top_k == 0`, or when no tier found anything.
    /// Tier errors are logged and the next tier is tried.
    pub async fn search_hits(&mut self, query: &str, top_k: usize) -> Option<SearchResults> {
        let query = query.trim();
        if query.is_empty() || top_k == 0 {
            return None;
        }

        for i in 0..self.tiers.len() {
            if self.tiers[i].needs_page_index() && !self.index_built {
                if let Err(e) = self.ingest_default().await {
                    log::warn!("Implicit ingestion of {} failed: {}", self.config.corpus_dir().display(), e);
                }
            }

            let tier = &self.tiers[i];
            let ctx = SearchContext {
                pages: &self.pages,
                embeddings: &self.embeddings,
            };
            if !tier.is_available(&ctx) {
                log::debug!("Tier {} unavailable", tier.kind().as_str());
                continue;
            }

            let start = std::time::Instant::now();
            match tier.search(&ctx, query, top_k).await {
                Ok(hits) if !hits.is_empty() => {
                    log::debug!(
                        "Tier {} answered with {} hits in {:?}",
                        tier.kind().as_str(),
                        hits.len(),
                        start.elapsed()
                    );
                    return Some(SearchResults {
                        tier: tier.kind(),
                        hits,
                    });
                }
                Ok(_) => log::debug!("Tier {} found nothing", tier.kind().as_str()),
                Err(e) => log::warn!("Tier {} failed: {}", tier.kind().as_str(), e),
            }
        }
        None
    }

    /// Rendered answer block, or `None` when there is no evidence to show.
    pub async fn search(&mut self, query: &str, top_k: usize) -> Option<String> {
        self.search_hits(query, top_k).await.map(|r| render(&r))
    }
}
