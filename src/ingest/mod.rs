pub mod walker;
pub mod metadata;
pub mod extractor;
pub mod cache;
pub mod incremental;

pub use walker::{FileMetadata, discover_pdfs, is_pdf};
pub use metadata::{compute_file_hash, source_file_name};
pub use extractor::{LopdfExtractor, PageExtractor, RawPage, extract_page_records};
pub use cache::{CacheEntry, CacheLoad, IngestionCache, cache_path};
pub use incremental::{
    FileClassification, IngestionReport, SkipReason, SkippedFile, classify_file,
    find_deleted_entries, run_ingestion_pass,
};
