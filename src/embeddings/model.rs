//! Lazily-initialized embedding model handle.
//!
//! Loading a model (or building its client) happens at most once per handle;
//! every ingestion and search afterwards reuses the same instance. Binaries
//! create one handle and share it via `Arc`; tests inject a preloaded fake.

use std::sync::{Arc, OnceLock};

use crate::config::EmbeddingsConfig;
use crate::embeddings::{Embedder, OpenAIEmbedder};
use crate::error::Result;

type Loader = Box<dyn Fn() -> Result<Arc<dyn Embedder>> + Send + Sync>;

pub struct ModelHandle {
    loader: Loader,
    /// `Some(None)` records a failed load so it isn't retried.
    slot: OnceLock<Option<Arc<dyn Embedder>>>,
}

impl ModelHandle {
    /// Handle that runs `loader` on first use.
    pub fn new<F>(loader: F) -> Self
    where
        F: Fn() -> Result<Arc<dyn Embedder>> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            slot: OnceLock::new(),
        }
    }

    /// Handle around an already-built embedder.
    pub fn preloaded(embedder: Arc<dyn Embedder>) -> Self {
        let slot = OnceLock::new();
        let _ = slot.set(Some(embedder));
        Self {
            loader: Box::new(|| {
                Err(crate::error::StatuteRagError::CapabilityMissing(
                    "preloaded handle has no loader".to_string(),
                ))
            }),
            slot,
        }
    }

    /// Handle for the configured OpenAI-compatible endpoint.
    pub fn from_config(config: &EmbeddingsConfig) -> Self {
        let config = config.clone();
        Self::new(move || {
            let embedder = OpenAIEmbedder::from_config(&config)?;
            log::info!("Embedding model ready: {} at {}", config.model, config.base_url);
            Ok(Arc::new(embedder) as Arc<dyn Embedder>)
        })
    }

    /// The model, loading it on first call. The first caller wins; later
    /// callers get the same instance, or `None` if loading failed.
    pub fn get(&self) -> Option<Arc<dyn Embedder>> {
        self.slot
            .get_or_init(|| match (self.loader)() {
                Ok(embedder) => Some(embedder),
                Err(e) => {
                    log::warn!("Embedding model unavailable, semantic search disabled: {}", e);
                    None
                }
            })
            .clone()
    }

    /// Whether a load has been attempted and succeeded, without triggering one.
    pub fn is_loaded(&self) -> bool {
        matches!(self.slot.get(), Some(Some(_)))
    }
}
