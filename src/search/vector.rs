use std::sync::Arc;

use async_trait::async_trait;

use crate::embeddings::{cosine_similarity, EmbeddingRecord, ModelHandle};
use crate::error::{Result, StatuteRagError};
use crate::search::{preview, Citation, SearchContext, SearchHit, SearchTier, TierKind, SNIPPET_CHARS};

/// Rank embedded pages by cosine similarity to `query_vec`.
///
/// Records whose dimension differs from the query are ignored, as are pages
/// with non-positive similarity (no evidence). Ties keep index order.
pub fn rank_by_similarity(
    records: &[EmbeddingRecord],
    query_vec: &[f32],
    top_k: usize,
) -> Vec<SearchHit> {
    let mut scored: Vec<(f32, &EmbeddingRecord)> = records
        .iter()
        .filter(|r| r.vector.len() == query_vec.len())
        .map(|r| (cosine_similarity(query_vec, &r.vector), r))
        .filter(|(sim, _)| *sim > 0.0)
        .collect();

    scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    scored
        .into_iter()
        .take(top_k)
        .map(|(sim, r)| SearchHit {
            source_file: r.source_file.clone(),
            page_number: r.page_number,
            snippet: preview(&r.text, SNIPPET_CHARS),
            citation: Citation::Score(sim),
        })
        .collect()
}

/// Internal semantic tier over the engine's embedding index.
pub struct EmbeddingTier {
    model: Arc<ModelHandle>,
}

impl EmbeddingTier {
    pub fn new(model: Arc<ModelHandle>) -> Self {
        Self { model }
    }
}

#[async_trait]
impl SearchTier for EmbeddingTier {
    fn kind(&self) -> TierKind {
        TierKind::Embedding
    }

    fn is_available(&self, ctx: &SearchContext<'_>) -> bool {
        self.model.is_loaded() && !ctx.embeddings.is_empty()
    }

    async fn search(&self, ctx: &SearchContext<'_>, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let embedder = self
            .model
            .get()
            .ok_or_else(|| StatuteRagError::CapabilityMissing("embedding model".to_string()))?;

        let start = std::time::Instant::now();
        let query_vec = embedder.embed_query(query).await?;
        log::debug!("Vector search: query embedding took {:?}", start.elapsed());

        Ok(rank_by_similarity(ctx.embeddings, &query_vec, top_k))
    }
}
