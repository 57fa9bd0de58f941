//! Human-readable, citation-bearing rendering of search results.

use crate::search::{Citation, SearchResults, TierKind};

fn header(tier: TierKind) -> &'static str {
    match tier {
        TierKind::RemoteEngine => "> **Answer (embedding engine, grounded):**\n",
        TierKind::Embedding => "> **Answer (embedding search, grounded):**\n",
        TierKind::Lexical => "> **Answer (grounded snippets):**\n",
    }
}

/// Render results as a markdown quote block, one citation per hit:
///
/// ```text
/// > - **Source:** ipc.pdf | **Page:** 12 | **Offsets:** 40-340
/// >   > _Section 420. Cheating and dishonestly inducing..._
/// ```
///
/// Semantic tiers show `**Score:** 0.812` in place of offsets.
pub fn render(results: &SearchResults) -> String {
    let mut lines = vec![header(results.tier).to_string()];
    for hit in &results.hits {
        let citation = match hit.citation {
            Citation::Score(score) => format!("**Score:** {:.3}", score),
            Citation::Offsets { start, end } => format!("**Offsets:** {}-{}", start, end),
        };
        lines.push(format!(
            "> - **Source:** {} | **Page:** {} | {}\n>   > _{}_\n",
            hit.source_file,
            hit.page_number,
            citation,
            hit.snippet.trim()
        ));
    }
    lines.join("\n")
}
