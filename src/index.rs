//! Page-level index types shared by ingestion and search.

use serde::{Deserialize, Serialize};

/// One page of extracted statute text.
///
/// Serialized field names match the on-disk cache layout (`file`, `page`, `text`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRecord {
    /// File name only, never the full path.
    #[serde(rename = "file")]
    pub source_file: String,
    /// 1-based page number.
    #[serde(rename = "page")]
    pub page_number: u32,
    /// Trimmed, non-empty page text.
    pub text: String,
}

impl PageRecord {
    /// Build a record from raw extracted text; pages that are blank after
    /// trimming produce `None`.
    pub fn from_raw(source_file: &str, page_number: u32, raw: &str) -> Option<Self> {
        let text = raw.trim();
        if text.is_empty() {
            return None;
        }
        Some(Self {
            source_file: source_file.to_string(),
            page_number,
            text: text.to_string(),
        })
    }
}

/// Ordered page records across all ingested files, in file-sorted order.
///
/// Rebuilt in full on every ingestion pass, never patched in place.
#[derive(Debug, Clone, Default)]
pub struct PageIndex {
    pages: Vec<PageRecord>,
}

impl PageIndex {
    pub fn new(pages: Vec<PageRecord>) -> Self {
        Self { pages }
    }

    pub fn pages(&self) -> &[PageRecord] {
        &self.pages
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PageRecord> {
        self.pages.iter()
    }
}

/// Counts from the most recent ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IndexDiagnostics {
    pub processed_files: usize,
    pub reused_files: usize,
    pub deleted_files: usize,
    pub total_pages: usize,
}
