//! Lexical fallback: literal token occurrence counting over page text.
//!
//! Always available once pages are indexed. Hits carry character offsets so a
//! reader can check the snippet against the page it came from.

use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;

use crate::error::Result;
use crate::index::{PageIndex, PageRecord};
use crate::search::{Citation, SearchContext, SearchHit, SearchTier, TierKind, SNIPPET_CHARS};

/// Window used when no token position can be located in a scoring page.
const FALLBACK_SNIPPET_CHARS: usize = 200;

fn token_pattern() -> &'static Regex {
    static TOKEN: OnceLock<Regex> = OnceLock::new();
    TOKEN.get_or_init(|| Regex::new(r"[a-z0-9]+").expect("Invalid regex pattern"))
}

/// Lowercase alphanumeric runs of `query`; punctuation-only fragments vanish.
///
/// Repeated tokens are kept, so "420 420" weighs section 420 twice.
pub fn tokenize_query(query: &str) -> Vec<String> {
    let lowered = query.to_ascii_lowercase();
    token_pattern()
        .find_iter(&lowered)
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Sum of non-overlapping occurrences of each token in the lowercased text.
pub fn score_text(lowered: &str, tokens: &[String]) -> usize {
    tokens.iter().map(|t| lowered.matches(t.as_str()).count()).sum()
}

/// Byte offset of the `char_idx`-th character (or the end of the text).
fn byte_at_char(text: &str, char_idx: usize) -> usize {
    text.char_indices()
        .nth(char_idx)
        .map(|(b, _)| b)
        .unwrap_or(text.len())
}

/// Snippet window for a page as `(start, end)` character offsets.
///
/// Starts at the earliest position any token occurs and spans up to 300
/// characters; without a position it is the first 200 characters.
pub fn snippet_window(text: &str, lowered: &str, tokens: &[String]) -> (usize, usize) {
    // ASCII lowercasing keeps byte positions identical between the two strings.
    let first_byte = tokens.iter().filter_map(|t| lowered.find(t.as_str())).min();
    let total_chars = text.chars().count();

    match first_byte {
        Some(byte) => {
            let start = text[..byte].chars().count();
            (start, total_chars.min(start + SNIPPET_CHARS))
        }
        None => (0, total_chars.min(FALLBACK_SNIPPET_CHARS)),
    }
}

/// Text between two character offsets.
pub fn slice_chars(text: &str, start: usize, end: usize) -> &str {
    &text[byte_at_char(text, start)..byte_at_char(text, end)]
}

struct Scored<'a> {
    page: &'a PageRecord,
    score: usize,
    start: usize,
    end: usize,
}

/// Score every page, drop zeros, and return the best `top_k` (ties keep index order).
pub fn search_lexical(pages: &PageIndex, query: &str, top_k: usize) -> Vec<SearchHit> {
    let tokens = tokenize_query(query.trim());
    if tokens.is_empty() || top_k == 0 {
        return Vec::new();
    }

    let mut scored: Vec<Scored<'_>> = pages
        .iter()
        .filter_map(|page| {
            let lowered = page.text.to_ascii_lowercase();
            let score = score_text(&lowered, &tokens);
            if score == 0 {
                return None;
            }
            let (start, end) = snippet_window(&page.text, &lowered, &tokens);
            Some(Scored { page, score, start, end })
        })
        .collect();

    // sort_by is stable: equal scores stay in insertion order.
    scored.sort_by(|a, b| b.score.cmp(&a.score));

    scored
        .into_iter()
        .take(top_k)
        .map(|s| SearchHit {
            source_file: s.page.source_file.clone(),
            page_number: s.page.page_number,
            snippet: slice_chars(&s.page.text, s.start, s.end).replace('\n', " "),
            citation: Citation::Offsets {
                start: s.start,
                end: s.end,
            },
        })
        .collect()
}

/// Tier wrapper around [`search_lexical`].
#[derive(Debug, Default)]
pub struct LexicalTier;

#[async_trait]
impl SearchTier for LexicalTier {
    fn kind(&self) -> TierKind {
        TierKind::Lexical
    }

    fn needs_page_index(&self) -> bool {
        true
    }

    fn is_available(&self, ctx: &SearchContext<'_>) -> bool {
        !ctx.pages.is_empty()
    }

    async fn search(&self, ctx: &SearchContext<'_>, query: &str, top_k: usize) -> Result<Vec<SearchHit>> {
        Ok(search_lexical(ctx.pages, query, top_k))
    }
}
