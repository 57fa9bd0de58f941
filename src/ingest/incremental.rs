//! Incremental ingestion: skip unchanged PDFs by comparing content digests with
//! the directory's ingestion cache.
//!
//! A pass lists the PDFs, reuses cache entries whose digest still matches,
//! extracts the rest, drops entries for files that are gone, persists the new
//! cache once, and rebuilds the page index from scratch.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::error::{Result, StatuteRagError};
use crate::index::{IndexDiagnostics, PageIndex};
use crate::ingest::cache::{cache_path, CacheEntry, CacheLoad, IngestionCache};
use crate::ingest::extractor::{extract_page_records, PageExtractor};
use crate::ingest::{compute_file_hash, discover_pdfs, FileMetadata};

/// Where a discovered file stands relative to the cache.
#[derive(Debug)]
pub enum FileClassification {
    /// Cached with the same digest; its pages can be reused as-is.
    Unchanged(CacheEntry),
    /// New or modified; must be extracted. Carries the current digest.
    Changed { digest: String },
    /// The digest could not be computed.
    Unreadable(StatuteRagError),
}

/// Why a file was left out of this pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    Unreadable(String),
    ExtractionFailed(String),
}

#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Everything one ingestion pass produced.
#[derive(Debug)]
pub struct IngestionReport {
    pub directory: PathBuf,
    pub index: PageIndex,
    pub diagnostics: IndexDiagnostics,
    pub skipped: Vec<SkippedFile>,
    pub cache_load: CacheLoad,
    /// False when the new cache could not be written; the index is still valid.
    pub cache_saved: bool,
}

/// Classify a file against the cached entries.
pub fn classify_file(file: &FileMetadata, cached: &IngestionCache) -> FileClassification {
    let digest = match compute_file_hash(&file.absolute_path) {
        Ok(d) => d,
        Err(e) => return FileClassification::Unreadable(e),
    };

    match cached.files.get(&cache_key(&file.absolute_path)) {
        Some(entry) if entry.content_digest == digest => {
            FileClassification::Unchanged(entry.clone())
        }
        _ => FileClassification::Changed { digest },
    }
}

fn cache_key(path: &Path) -> String {
    path.to_string_lossy().to_string()
}

/// Cached paths that did not make it into the new cache.
pub fn find_deleted_entries(previous: &IngestionCache, current: &IngestionCache) -> Vec<String> {
    let kept: HashSet<&String> = current.files.keys().collect();
    previous
        .files
        .keys()
        .filter(|p| !kept.contains(p))
        .cloned()
        .collect()
}

/// Run one ingestion pass over `dir`.
///
/// Fails only when the directory can't be created or listed, or when the
/// extractor reports the PDF capability missing; in the latter case nothing on
/// disk is touched. Per-file problems are collected in `skipped`.
pub fn run_ingestion_pass(
    dir: &Path,
    cache_file_name: &str,
    extractor: &dyn PageExtractor,
) -> Result<IngestionReport> {
    std::fs::create_dir_all(dir)?;

    if !extractor.is_available() {
        return Err(StatuteRagError::CapabilityMissing(format!(
            "PDF extractor `{}` is not available",
            extractor.name()
        )));
    }

    let files = discover_pdfs(dir)?;
    let path = cache_path(dir, cache_file_name);
    let (previous, cache_load) = IngestionCache::load(&path);
    log::debug!("Cache {}: {:?} ({} entries)", path.display(), cache_load, previous.len());

    let mut next = IngestionCache::default();
    let mut ordered_keys = Vec::with_capacity(files.len());
    let mut skipped = Vec::new();
    let mut processed_files = 0;
    let mut reused_files = 0;

    for file in &files {
        let key = cache_key(&file.absolute_path);
        match classify_file(file, &previous) {
            FileClassification::Unchanged(entry) => {
                log::debug!("Reusing {} ({} pages)", file.file_name, entry.pages.len());
                reused_files += 1;
                next.files.insert(key.clone(), entry);
                ordered_keys.push(key);
            }
            FileClassification::Changed { digest } => {
                match extract_page_records(extractor, &file.absolute_path) {
                    Ok(pages) => {
                        log::info!("Extracted {} ({} pages)", file.file_name, pages.len());
                        processed_files += 1;
                        next.files.insert(
                            key.clone(),
                            CacheEntry {
                                content_digest: digest,
                                pages,
                            },
                        );
                        ordered_keys.push(key);
                    }
                    Err(e) => {
                        log::warn!("Skipping {}: {}", file.file_name, e);
                        skipped.push(SkippedFile {
                            path: file.absolute_path.clone(),
                            reason: SkipReason::ExtractionFailed(e.to_string()),
                        });
                    }
                }
            }
            FileClassification::Unreadable(e) => {
                log::warn!("Skipping unreadable {}: {}", file.file_name, e);
                skipped.push(SkippedFile {
                    path: file.absolute_path.clone(),
                    reason: SkipReason::Unreadable(e.to_string()),
                });
            }
        }
    }

    let deleted_files = find_deleted_entries(&previous, &next).len();

    let cache_saved = match next.save(&path) {
        Ok(()) => true,
        Err(e) => {
            log::warn!("Could not write cache {}: {}", path.display(), e);
            false
        }
    };

    // Walker order, not map order.
    let pages = ordered_keys
        .iter()
        .filter_map(|k| next.files.get(k))
        .flat_map(|entry| entry.pages.iter().cloned())
        .collect::<Vec<_>>();
    let index = PageIndex::new(pages);

    let diagnostics = IndexDiagnostics {
        processed_files,
        reused_files,
        deleted_files,
        total_pages: index.len(),
    };
    log::info!(
        "Ingested {}: processed={}, reused={}, deleted={}, skipped={}, pages={}",
        dir.display(),
        diagnostics.processed_files,
        diagnostics.reused_files,
        diagnostics.deleted_files,
        skipped.len(),
        diagnostics.total_pages
    );

    Ok(IngestionReport {
        directory: dir.to_path_buf(),
        index,
        diagnostics,
        skipped,
        cache_load,
        cache_saved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::extractor::RawPage;
    use std::fs;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const CACHE: &str = ".rag_index_cache.json";

    /// Treats each file's bytes as UTF-8 with pages separated by form feeds.
    /// Files starting with `CORRUPT` fail; every call is recorded.
    #[derive(Default)]
    struct TextPages {
        calls: Mutex<Vec<String>>,
    }

    impl TextPages {
        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl PageExtractor for TextPages {
        fn name(&self) -> &str {
            "text"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn extract_pages(&self, path: &Path) -> Result<Vec<RawPage>> {
            self.calls
                .lock()
                .unwrap()
                .push(path.file_name().unwrap().to_string_lossy().to_string());
            let body = fs::read_to_string(path)?;
            if body.starts_with("CORRUPT") {
                return Err(StatuteRagError::Extraction {
                    path: path.to_path_buf(),
                    reason: "corrupt".into(),
                });
            }
            Ok(body
                .split('\x0c')
                .enumerate()
                .map(|(i, t)| RawPage {
                    page_number: i as u32 + 1,
                    text: t.to_string(),
                })
                .collect())
        }
    }

    struct Missing;

    impl PageExtractor for Missing {
        fn name(&self) -> &str {
            "missing"
        }
        fn is_available(&self) -> bool {
            false
        }
        fn extract_pages(&self, _path: &Path) -> Result<Vec<RawPage>> {
            unreachable!("never called when unavailable")
        }
    }

    #[test]
    fn test_second_pass_reuses_everything() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), "alpha one\x0calpha two").unwrap();
        fs::write(dir.path().join("b.pdf"), "beta").unwrap();
        let extractor = TextPages::default();

        let first = run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();
        assert_eq!(first.diagnostics.processed_files, 2);
        assert_eq!(first.diagnostics.reused_files, 0);
        assert_eq!(first.diagnostics.total_pages, 3);
        assert_eq!(first.cache_load, CacheLoad::Missing);
        assert!(first.cache_saved);

        let second = run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();
        assert_eq!(
            second.diagnostics,
            IndexDiagnostics {
                processed_files: 0,
                reused_files: 2,
                deleted_files: 0,
                total_pages: 3
            }
        );
        assert_eq!(extractor.calls().len(), 2);
        assert_eq!(
            first.index.pages(),
            second.index.pages(),
            "reused pages must match freshly extracted ones"
        );
    }

    #[test]
    fn test_one_byte_change_reprocesses_only_that_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), "alpha").unwrap();
        fs::write(dir.path().join("b.pdf"), "beta").unwrap();
        let extractor = TextPages::default();
        run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();

        fs::write(dir.path().join("b.pdf"), "betA").unwrap();
        let report = run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();

        assert_eq!(report.diagnostics.processed_files, 1);
        assert_eq!(report.diagnostics.reused_files, 1);
        assert_eq!(extractor.calls(), vec!["a.pdf", "b.pdf", "b.pdf"]);
        assert_eq!(report.index.pages()[1].text, "betA");
    }

    #[test]
    fn test_deleted_file_counted_and_gone() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), "alpha").unwrap();
        fs::write(dir.path().join("b.pdf"), "beta").unwrap();
        let extractor = TextPages::default();
        run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();

        fs::remove_file(dir.path().join("a.pdf")).unwrap();
        let report = run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();

        assert_eq!(report.diagnostics.deleted_files, 1);
        assert_eq!(report.diagnostics.reused_files, 1);
        assert!(report.index.iter().all(|p| p.source_file != "a.pdf"));

        let (cache, _) = IngestionCache::load(&dir.path().join(CACHE));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_rename_is_delete_plus_add() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("old.pdf"), "alpha").unwrap();
        let extractor = TextPages::default();
        run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();

        fs::rename(dir.path().join("old.pdf"), dir.path().join("new.pdf")).unwrap();
        let report = run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();

        assert_eq!(report.diagnostics.deleted_files, 1);
        assert_eq!(report.diagnostics.processed_files, 1);
        assert_eq!(report.index.pages()[0].source_file, "new.pdf");
    }

    #[test]
    fn test_empty_directory_clears_cache() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), "alpha").unwrap();
        fs::write(dir.path().join("b.pdf"), "beta").unwrap();
        let extractor = TextPages::default();
        run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();

        fs::remove_file(dir.path().join("a.pdf")).unwrap();
        fs::remove_file(dir.path().join("b.pdf")).unwrap();
        let report = run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();

        assert!(report.index.is_empty());
        assert_eq!(report.diagnostics.deleted_files, 2);
        assert_eq!(report.diagnostics.total_pages, 0);
        let (cache, how) = IngestionCache::load(&dir.path().join(CACHE));
        assert!(cache.is_empty());
        assert_eq!(how, CacheLoad::Loaded { dropped_entries: 0 });
    }

    #[test]
    fn test_missing_directory_is_created() {
        let parent = TempDir::new().unwrap();
        let dir = parent.path().join("law_pdfs");
        let report = run_ingestion_pass(&dir, CACHE, &TextPages::default()).unwrap();
        assert!(dir.is_dir());
        assert!(report.index.is_empty());
        assert_eq!(report.diagnostics, IndexDiagnostics::default());
    }

    #[test]
    fn test_corrupt_file_skipped_and_not_cached() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), "alpha").unwrap();
        fs::write(dir.path().join("bad.pdf"), "CORRUPT").unwrap();
        let extractor = TextPages::default();

        let report = run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();
        assert_eq!(report.diagnostics.processed_files, 1);
        assert_eq!(report.diagnostics.reused_files, 0);
        assert_eq!(report.skipped.len(), 1);
        assert!(matches!(report.skipped[0].reason, SkipReason::ExtractionFailed(_)));

        // retried on every pass until it becomes readable
        let again = run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();
        assert_eq!(again.skipped.len(), 1);
        assert_eq!(extractor.calls().iter().filter(|c| *c == "bad.pdf").count(), 2);
    }

    #[test]
    fn test_previously_cached_file_turning_corrupt_drops_out() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), "alpha").unwrap();
        let extractor = TextPages::default();
        run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();

        fs::write(dir.path().join("a.pdf"), "CORRUPT now").unwrap();
        let report = run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();
        assert_eq!(report.diagnostics.processed_files, 0);
        assert_eq!(report.diagnostics.deleted_files, 1);
        assert!(report.index.is_empty());
    }

    #[test]
    fn test_capability_missing_leaves_cache_untouched() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), "alpha").unwrap();
        run_ingestion_pass(dir.path(), CACHE, &TextPages::default()).unwrap();
        let before = fs::read_to_string(dir.path().join(CACHE)).unwrap();

        fs::remove_file(dir.path().join("a.pdf")).unwrap();
        let err = run_ingestion_pass(dir.path(), CACHE, &Missing).unwrap_err();
        assert!(err.is_capability_missing());
        assert_eq!(fs::read_to_string(dir.path().join(CACHE)).unwrap(), before);
    }

    #[test]
    fn test_malformed_cache_reprocesses() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), "alpha").unwrap();
        fs::write(dir.path().join(CACHE), "garbage").unwrap();

        let report = run_ingestion_pass(dir.path(), CACHE, &TextPages::default()).unwrap();
        assert!(matches!(report.cache_load, CacheLoad::Malformed(_)));
        assert_eq!(report.diagnostics.processed_files, 1);
        assert_eq!(report.diagnostics.deleted_files, 0);
    }

    #[test]
    fn test_blank_pages_dropped() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), "first\x0c   \x0cthird").unwrap();
        let report = run_ingestion_pass(dir.path(), CACHE, &TextPages::default()).unwrap();
        let numbers: Vec<u32> = report.index.iter().map(|p| p.page_number).collect();
        assert_eq!(numbers, vec![1, 3]);
    }

    #[test]
    fn test_index_follows_file_name_order() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.pdf"), "beta").unwrap();
        fs::write(dir.path().join("a.pdf"), "alpha").unwrap();
        fs::write(dir.path().join("c.pdf"), "gamma").unwrap();
        let report = run_ingestion_pass(dir.path(), CACHE, &TextPages::default()).unwrap();
        let files: Vec<&str> = report.index.iter().map(|p| p.source_file.as_str()).collect();
        assert_eq!(files, vec!["a.pdf", "b.pdf", "c.pdf"]);
    }

    #[test]
    fn test_find_deleted_entries() {
        let mut previous = IngestionCache::default();
        let entry = CacheEntry {
            content_digest: "h".into(),
            pages: vec![],
        };
        previous.files.insert("/c/a.pdf".into(), entry.clone());
        previous.files.insert("/c/b.pdf".into(), entry.clone());
        let mut current = IngestionCache::default();
        current.files.insert("/c/b.pdf".into(), entry.clone());
        current.files.insert("/c/c.pdf".into(), entry);

        assert_eq!(find_deleted_entries(&previous, &current), vec!["/c/a.pdf".to_string()]);
    }

    /// Deletes `victim` while extracting any other file, so a file listed by
    /// discovery is gone by the time its digest is computed.
    struct RemovesDuringExtraction {
        inner: TextPages,
        victim: PathBuf,
    }

    impl PageExtractor for RemovesDuringExtraction {
        fn name(&self) -> &str {
            "removes"
        }
        fn is_available(&self) -> bool {
            true
        }
        fn extract_pages(&self, path: &Path) -> Result<Vec<RawPage>> {
            let _ = fs::remove_file(&self.victim);
            self.inner.extract_pages(path)
        }
    }

    #[test]
    fn test_classify_vanished_file_is_unreadable() {
        let dir = TempDir::new().unwrap();
        let file = FileMetadata {
            file_name: "gone.pdf".into(),
            absolute_path: dir.path().join("gone.pdf"),
        };
        let classification = classify_file(&file, &IngestionCache::default());
        assert!(matches!(
            classification,
            FileClassification::Unreadable(StatuteRagError::Io(_))
        ));
    }

    #[test]
    fn test_cached_file_with_unhashable_content_drops_out() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.pdf"), "alpha").unwrap();
        fs::write(dir.path().join("b.pdf"), "beta").unwrap();
        run_ingestion_pass(dir.path(), CACHE, &TextPages::default()).unwrap();

        // a.pdf changes so it is extracted, and extraction removes b.pdf
        // after discovery listed it but before its digest is taken.
        fs::write(dir.path().join("a.pdf"), "alpha revised").unwrap();
        let extractor = RemovesDuringExtraction {
            inner: TextPages::default(),
            victim: dir.path().join("b.pdf"),
        };
        let report = run_ingestion_pass(dir.path(), CACHE, &extractor).unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].path.ends_with("b.pdf"));
        assert!(matches!(report.skipped[0].reason, SkipReason::Unreadable(_)));
        assert_eq!(
            report.diagnostics,
            IndexDiagnostics {
                processed_files: 1,
                reused_files: 0,
                deleted_files: 1,
                total_pages: 1,
            }
        );
        assert_eq!(extractor.inner.calls(), vec!["a.pdf".to_string()]);

        let (reloaded, _) = IngestionCache::load(&cache_path(dir.path(), CACHE));
        assert_eq!(reloaded.len(), 1);
        assert!(reloaded.files.keys().all(|k| k.ends_with("a.pdf")));
    }
}
