//! Per-page text extraction from PDF files.

use std::path::Path;

use crate::error::{Result, StatuteRagError};
use crate::index::PageRecord;
use crate::ingest::metadata::source_file_name;

/// Raw text of one page, before trimming.
#[derive(Debug, Clone)]
pub struct RawPage {
    pub page_number: u32,
    pub text: String,
}

/// Trait for page text extractors
pub trait PageExtractor: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Whether the parsing capability is present at all. When false, an
    /// ingestion pass is refused before anything is read or written.
    fn is_available(&self) -> bool;

    /// Extract every page of `path` in page order.
    ///
    /// Any failure (corrupt file, encryption, unsupported content) is returned
    /// as `StatuteRagError::Extraction` and applies to this file only.
    fn extract_pages(&self, path: &Path) -> Result<Vec<RawPage>>;
}

/// Extract a file and turn its pages into records, dropping pages that are
/// blank after trimming.
pub fn extract_page_records(extractor: &dyn PageExtractor, path: &Path) -> Result<Vec<PageRecord>> {
    let file_name = source_file_name(path);
    let pages = extractor.extract_pages(path)?;
    Ok(pages
        .iter()
        .filter_map(|p| PageRecord::from_raw(&file_name, p.page_number, &p.text))
        .collect())
}

/// PDF extractor backed by `lopdf`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfExtractor;

impl LopdfExtractor {
    pub fn new() -> Self {
        Self
    }
}

#[cfg(feature = "pdf")]
impl PageExtractor for LopdfExtractor {
    fn name(&self) -> &str {
        "lopdf"
    }

    fn is_available(&self) -> bool {
        true
    }

    fn extract_pages(&self, path: &Path) -> Result<Vec<RawPage>> {
        let failed = |reason: String| StatuteRagError::Extraction {
            path: path.to_path_buf(),
            reason,
        };

        let doc = lopdf::Document::load(path).map_err(|e| failed(e.to_string()))?;
        if doc.is_encrypted() {
            return Err(failed("document is encrypted".to_string()));
        }

        let mut pages = Vec::new();
        for page_number in doc.get_pages().keys().copied() {
            let text = doc
                .extract_text(&[page_number])
                .map_err(|e| failed(format!("page {}: {}", page_number, e)))?;
            pages.push(RawPage { page_number, text });
        }
        Ok(pages)
    }
}

#[cfg(not(feature = "pdf"))]
impl PageExtractor for LopdfExtractor {
    fn name(&self) -> &str {
        "lopdf (disabled)"
    }

    fn is_available(&self) -> bool {
        false
    }

    fn extract_pages(&self, _path: &Path) -> Result<Vec<RawPage>> {
        Err(StatuteRagError::CapabilityMissing(
            "PDF support not compiled in (enable the `pdf` feature)".to_string(),
        ))
    }
}
