use walkdir::WalkDir;
use std::path::{Path, PathBuf};
use crate::error::Result;
use crate::ingest::metadata::source_file_name;

/// Metadata for a discovered PDF
#[derive(Debug, Clone)]
pub struct FileMetadata {
    /// File name only; becomes `PageRecord::source_file`.
    pub file_name: String,
    /// Absolute path; the file's identity in the ingestion cache.
    pub absolute_path: PathBuf,
}

/// True for paths with a `.pdf` extension (case-insensitive), excluding
/// dot-prefixed names such as office lock files (`.~lock.ipc.pdf#`).
pub fn is_pdf(path: &Path) -> bool {
    let hidden = path
        .file_name()
        .map(|n| n.to_string_lossy().starts_with('.'))
        .unwrap_or(true);
    if hidden {
        return false;
    }
    path.extension()
        .and_then(|s| s.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
        .unwrap_or(false)
}

/// Discover the PDF files directly inside `root`, sorted by file name.
///
/// Only the top level is scanned; sub-directories are separate corpora with
/// their own caches. Entries that vanish mid-walk are skipped rather than
/// failing the listing.
pub fn discover_pdfs(root: &Path) -> Result<Vec<FileMetadata>> {
    let root = root.canonicalize()?;
    let mut files = Vec::new();

    for entry in WalkDir::new(&root)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();

        if !path.is_file() || !is_pdf(path) {
            continue;
        }

        files.push(FileMetadata {
            file_name: source_file_name(path),
            absolute_path: path.to_path_buf(),
        });
    }

    log::info!("Discovered {} PDF files in {}", files.len(), root.display());
    Ok(files)
}
