//! Tiered search over the page index.
//!
//! Tiers are tried in a fixed priority order; the first available tier that
//! returns at least one hit answers the query.

pub mod format;
pub mod lexical;
pub mod remote;
pub mod vector;

pub use format::render;
pub use lexical::{tokenize_query, LexicalTier};
pub use remote::RemoteEngineTier;
pub use vector::EmbeddingTier;

use async_trait::async_trait;

use crate::embeddings::EmbeddingRecord;
use crate::error::Result;
use crate::index::PageIndex;

/// Snippet length (in characters) shown for a hit.
pub const SNIPPET_CHARS: usize = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierKind {
    RemoteEngine,
    Embedding,
    Lexical,
}

impl TierKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TierKind::RemoteEngine => "remote_engine",
            TierKind::Embedding => "embedding",
            TierKind::Lexical => "lexical",
        }
    }
}

/// What makes a hit verifiable against its source.
#[derive(Debug, Clone, PartialEq)]
pub enum Citation {
    /// Cosine similarity from a semantic tier.
    Score(f32),
    /// Character offsets into the page text; `text[start..end]` is the
    /// snippet before newlines were replaced.
    Offsets { start: usize, end: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchHit {
    pub source_file: String,
    pub page_number: u32,
    /// Single-line snippet.
    pub snippet: String,
    pub citation: Citation,
}

/// Hits from the tier that answered.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResults {
    pub tier: TierKind,
    pub hits: Vec<SearchHit>,
}

/// Read-only view of the engine's indexes handed to each tier.
pub struct SearchContext<'a> {
    pub pages: &'a PageIndex,
    pub embeddings: &'a [EmbeddingRecord],
}

/// One search strategy.
#[async_trait]
pub trait SearchTier: Send + Sync {
    fn kind(&self) -> TierKind;

    /// Tiers that read the page index trigger the implicit first ingestion.
    fn needs_page_index(&self) -> bool {
        false
    }

    /// Checked before `search`; an unavailable tier is skipped silently.
    fn is_available(&self, ctx: &SearchContext<'_>) -> bool;

    /// Up to `top_k` hits, best first. An empty vector means "nothing found".
    async fn search(&self, ctx: &SearchContext<'_>, query: &str, top_k: usize) -> Result<Vec<SearchHit>>;
}

/// First `max_chars` characters of `text` with newlines flattened.
pub(crate) fn preview(text: &str, max_chars: usize) -> String {
    text.chars()
        .take(max_chars)
        .map(|c| if c == '\n' { ' ' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_flattens_and_truncates() {
        assert_eq!(preview("a\nb\nc", 10), "a b c");
        assert_eq!(preview("§420 text", 4), "§420");
    }
}
