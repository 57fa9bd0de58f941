use crate::config::EmbeddingsConfig;
use crate::embeddings::{Embedder, QueryEmbeddingCache};
use crate::error::{Result, StatuteRagError};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Request structure for OpenAI-compatible embeddings APIs
#[derive(Serialize)]
struct EmbeddingRequest {
    model: String,
    input: Vec<String>,
}

/// Response structure from OpenAI-compatible embeddings APIs
#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

/// Individual embedding data in API response
#[derive(Deserialize)]
struct EmbeddingData {
    #[serde(default)]
    index: Option<usize>,
    embedding: Vec<f32>,
}

/// Client for any `/embeddings` endpoint speaking the OpenAI wire format
/// (OpenAI itself, Ollama, llama.cpp server, LM Studio, ...).
///
/// The API key is optional; local servers usually don't want one.
pub struct OpenAIEmbedder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    batch_size: usize,
    cache: Option<Arc<QueryEmbeddingCache>>,
}

impl OpenAIEmbedder {
    /// Create an embedder.
    ///
    /// * `base_url` - API root, e.g. `https://api.openai.com/v1`
    /// * `batch_size` - texts per request, capped at 2048
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: String,
        batch_size: usize,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StatuteRagError::Embedding(format!("HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/embeddings", base_url.trim_end_matches('/')),
            api_key,
            model,
            batch_size: batch_size.clamp(1, 2048),
            cache: None,
        })
    }

    /// Build from configuration, reading the API key from the configured
    /// environment variable when it is set.
    pub fn from_config(config: &EmbeddingsConfig) -> Result<Self> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|k| !k.trim().is_empty());
        let mut embedder = Self::new(
            &config.base_url,
            api_key,
            config.model.clone(),
            config.batch_size,
            Duration::from_secs(config.timeout_secs),
        )?;
        if config.cache_capacity > 0 {
            embedder.cache = Some(Arc::new(QueryEmbeddingCache::new(config.cache_capacity)));
        }
        Ok(embedder)
    }

    pub fn with_cache(mut self, cache: Arc<QueryEmbeddingCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Single API request for at most `batch_size` texts.
    async fn request(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        let expected = texts.len();
        let request = EmbeddingRequest {
            model: self.model.clone(),
            input: texts,
        };

        let mut builder = self.client.post(&self.endpoint).json(&request);
        if let Some(key) = &self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| StatuteRagError::Embedding(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(StatuteRagError::Embedding(format!(
                "Embeddings API error {}: {}",
                status, body
            )));
        }

        let result: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| StatuteRagError::Embedding(format!("Failed to parse response: {}", e)))?;

        let mut data = result.data;
        if data.len() != expected {
            return Err(StatuteRagError::Embedding(format!(
                "Expected {} embeddings, got {}",
                expected,
                data.len()
            )));
        }
        if data.iter().all(|d| d.index.is_some()) {
            data.sort_by_key(|d| d.index);
        }
        Ok(data.into_iter().map(|d| d.embedding).collect())
    }
}

#[async_trait]
impl Embedder for OpenAIEmbedder {
    fn name(&self) -> &str {
        &self.model
    }

    async fn embed_batch(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut all_embeddings = Vec::with_capacity(texts.len());
        for chunk in texts.chunks(self.batch_size) {
            let embeddings = self.request(chunk.to_vec()).await?;
            all_embeddings.extend(embeddings);
        }
        log::debug!("Embedded {} texts with {}", all_embeddings.len(), self.model);
        Ok(all_embeddings)
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>> {
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(text) {
                log::debug!("Cache hit for query: {}", text);
                return Ok(cached);
            }
        }

        let embedding = self
            .request(vec![text.to_string()])
            .await?
            .pop()
            .ok_or_else(|| StatuteRagError::Embedding("Empty response".to_string()))?;

        if let Some(cache) = &self.cache {
            cache.put(text.to_string(), embedding.clone());
        }
        Ok(embedding)
    }
}
