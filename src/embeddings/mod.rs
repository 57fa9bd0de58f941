pub mod model;
pub mod openai;
pub mod query_cache;

pub use model::ModelHandle;
pub use openai::OpenAIEmbedder;
pub use query_cache::QueryEmbeddingCache;

use async_trait::async_trait;

use crate::error::{Result, StatuteRagError};
use crate::index::PageIndex;

/// Guards cosine similarity against zero-length vectors.
pub const COSINE_EPSILON: f32 = 1e-9;

/// Trait for embedding models
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Model name used in logs
    fn name(&self) -> &str;

    /// Encode texts into vectors, one per input, in input order.
    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>>;

    /// Encode a single query.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        self.embed_batch(vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| StatuteRagError::Embedding("Empty embedding response".to_string()))
    }
}

/// A page paired with its vector.
#[derive(Debug, Clone)]
pub struct EmbeddingRecord {
    pub source_file: String,
    pub page_number: u32,
    pub text: String,
    pub vector: Vec<f32>,
}

/// `dot(a, b) / (|a| * |b| + ε)`.
///
/// Zero vectors score 0 instead of dividing by zero. Mismatched lengths only
/// use the common prefix; callers check dimensions first.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    dot / (mag_a * mag_b + COSINE_EPSILON)
}

/// Encode every page of `index`.
///
/// All vectors must come back and share one dimension, otherwise the whole
/// build fails and the caller runs without the semantic tier.
pub async fn build_embedding_index(
    embedder: &dyn Embedder,
    index: &PageIndex,
) -> Result<Vec<EmbeddingRecord>> {
    if index.is_empty() {
        return Ok(Vec::new());
    }

    let start = std::time::Instant::now();
    let texts: Vec<String> = index.iter().map(|p| p.text.clone()).collect();
    let vectors = embedder.embed_batch(texts).await?;

    if vectors.len() != index.len() {
        return Err(StatuteRagError::Embedding(format!(
            "{} returned {} vectors for {} pages",
            embedder.name(),
            vectors.len(),
            index.len()
        )));
    }
    let dim = vectors[0].len();
    if dim == 0 || vectors.iter().any(|v| v.len() != dim) {
        return Err(StatuteRagError::Embedding(format!(
            "{} returned inconsistent vector dimensions",
            embedder.name()
        )));
    }

    let records: Vec<EmbeddingRecord> = index
        .iter()
        .zip(vectors)
        .map(|(page, vector)| EmbeddingRecord {
            source_file: page.source_file.clone(),
            page_number: page.page_number,
            text: page.text.clone(),
            vector,
        })
        .collect();

    log::info!(
        "Embedded {} pages ({}-dim) with {} in {:?}",
        records.len(),
        dim,
        embedder.name(),
        start.elapsed()
    );
    Ok(records)
}
