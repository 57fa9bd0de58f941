//! Directory-scoped ingestion cache.
//!
//! One JSON file per ingested directory maps each PDF's absolute path to the
//! digest of its bytes and the page records extracted from it. Unchanged files
//! are served from here instead of being parsed again.

use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Result, StatuteRagError};
use crate::index::PageRecord;

/// Cached extraction result for one file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheEntry {
    /// SHA-256 hex digest of the bytes the pages were extracted from.
    #[serde(rename = "hash")]
    pub content_digest: String,
    #[serde(rename = "docs")]
    pub pages: Vec<PageRecord>,
}

/// Mapping from absolute file path to its cache entry.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IngestionCache {
    pub files: BTreeMap<String, CacheEntry>,
}

/// How the persisted cache was found when loading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheLoad {
    /// No cache file yet.
    Missing,
    /// File existed but could not be used; treated as empty.
    Malformed(String),
    /// Loaded; `dropped_entries` counts individual entries that were unusable.
    Loaded { dropped_entries: usize },
}

/// Location of the cache file for `dir`.
pub fn cache_path(dir: &Path, file_name: &str) -> PathBuf {
    dir.join(file_name)
}

impl IngestionCache {
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_pages(&self) -> usize {
        self.files.values().map(|e| e.pages.len()).sum()
    }

    /// Load the cache at `path`. Never fails: a missing or malformed file
    /// yields an empty cache, and the returned `CacheLoad` says which.
    pub fn load(path: &Path) -> (Self, CacheLoad) {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return (Self::default(), CacheLoad::Missing);
            }
            Err(e) => {
                log::warn!("Ignoring unreadable cache {}: {}", path.display(), e);
                return (Self::default(), CacheLoad::Malformed(e.to_string()));
            }
        };

        match Self::parse(&raw) {
            Ok((cache, dropped_entries)) => {
                if dropped_entries > 0 {
                    log::warn!(
                        "Dropped {} unusable entries from cache {}",
                        dropped_entries,
                        path.display()
                    );
                }
                (cache, CacheLoad::Loaded { dropped_entries })
            }
            Err(e) => {
                log::warn!("Ignoring malformed cache {}: {}", path.display(), e);
                (Self::default(), CacheLoad::Malformed(e.to_string()))
            }
        }
    }

    /// Parse cache JSON. The top level must be an object with a `files`
    /// object; entries inside it that don't match `CacheEntry` are skipped
    /// individually and counted. Unknown fields are ignored.
    fn parse(raw: &str) -> Result<(Self, usize)> {
        let value: Value = serde_json::from_str(raw)?;
        let files = value
            .get("files")
            .and_then(Value::as_object)
            .ok_or_else(|| StatuteRagError::MalformedCache("missing `files` object".to_string()))?;

        let mut cache = Self::default();
        let mut dropped = 0;
        for (path, entry) in files {
            match serde_json::from_value::<CacheEntry>(entry.clone()) {
                Ok(entry) => {
                    cache.files.insert(path.clone(), entry);
                }
                Err(e) => {
                    log::debug!("Cache entry {} unusable: {}", path, e);
                    dropped += 1;
                }
            }
        }
        Ok((cache, dropped))
    }

    /// Replace the cache file at `path` with this state.
    ///
    /// Written to a temporary file in the same directory and renamed over the
    /// target, so a reader sees either the previous cache or the new one.
    pub fn save(&self, path: &Path) -> Result<()> {
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        serde_json::to_writer(&mut tmp, self)?;
        tmp.flush()?;
        tmp.persist(path).map_err(|e| StatuteRagError::Io(e.error))?;
        Ok(())
    }
}
