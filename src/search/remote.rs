//! External embedding engine: a separate service that owns its own index and
//! answers whole queries over HTTP.
//!
//! Wire format: `POST <url>` with `{"query": "...", "top_k": N}`, answered by
//! `{"results": [{"file": "...", "page": N, "score": F, "text": "..."}]}`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;
use crate::error::{Result, StatuteRagError};
use crate::search::{preview, Citation, SearchContext, SearchHit, SearchTier, TierKind, SNIPPET_CHARS};

#[derive(Serialize)]
struct EngineRequest<'a> {
    query: &'a str,
    top_k: usize,
}

#[derive(Deserialize)]
struct EngineResponse {
    #[serde(default)]
    results: Vec<EngineHit>,
}

#[derive(Deserialize)]
struct EngineHit {
    file: String,
    page: u32,
    score: f32,
    text: String,
}

pub struct RemoteEngineTier {
    client: Client,
    url: String,
}

impl RemoteEngineTier {
    pub fn new(url: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StatuteRagError::RemoteEngine(format!("HTTP client: {}", e)))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn from_config(url: &str, config: &EngineConfig) -> Result<Self> {
        Self::new(url, Duration::from_secs(config.timeout_secs))
    }
}

fn into_hits(response: EngineResponse, top_k: usize) -> Vec<SearchHit> {
    response
        .results
        .into_iter()
        .filter(|h| !h.text.trim().is_empty())
        .take(top_k)
        .map(|h| SearchHit {
            source_file: h.file,
            page_number: h.page,
            snippet: preview(h.text.trim(), SNIPPET_CHARS),
            citation: Citation::Score(h.score),
        })
        .collect()
}

#[async_trait]
impl SearchTier for RemoteEngineTier {
    fn kind(&self) -> TierKind {
        TierKind::RemoteEngine
    }

    fn is_available(&self, _ctx: &SearchContext<'_>) -> bool {
        true
    }

    async fn search(&self, _ctx: &SearchContext<'_>, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        let response = self
            .client
            .post(&self.url)
            .json(&EngineRequest { query, top_k })
            .send()
            .await
            .map_err(|e| StatuteRagError::RemoteEngine(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StatuteRagError::RemoteEngine(format!("HTTP {}", status)));
        }

        let body: EngineResponse = response
            .json()
            .await
            .map_err(|e| StatuteRagError::RemoteEngine(format!("Failed to parse response: {}", e)))?;

        Ok(into_hits(body, top_k))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::PageIndex;

    #[test]
    fn test_into_hits() {
        let body: EngineResponse = serde_json::from_str(
            r#"{"results": [
                {"file": "ipc.pdf", "page": 12, "score": 0.81, "text": "Section 420.\nCheating"},
                {"file": "ipc.pdf", "page": 13, "score": 0.40, "text": "   "},
                {"file": "bns.pdf", "page": 2, "score": 0.33, "text": "Section 318"}
            ]}"#,
        )
        .unwrap();
        let hits = into_hits(body, 5);
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].snippet, "Section 420. Cheating");
        assert_eq!(hits[0].citation, Citation::Score(0.81));
        assert_eq!(hits[1].source_file, "bns.pdf");
    }

    #[test]
    fn test_missing_results_is_empty() {
        let body: EngineResponse = serde_json::from_str("{}").unwrap();
        assert!(into_hits(body, 3).is_empty());
    }

    #[tokio::test]
    async fn test_unreachable_engine_is_error() {
        let tier = RemoteEngineTier::new("http://127.0.0.1:9/search", Duration::from_secs(2)).unwrap();
        let pages = PageIndex::default();
        let ctx = SearchContext { pages: &pages, embeddings: &[] };
        let err = tier.search(&ctx, "cheating", 3).await.unwrap_err();
        assert!(matches!(err, StatuteRagError::RemoteEngine(_)));
    }
}
