use std::path::PathBuf;
use thiserror::Error;

/// Main error type for Statute RAG
#[derive(Error, Debug)]
pub enum StatuteRagError {
    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A library, model, or service the operation depends on is not available
    #[error("Capability missing: {0}")]
    CapabilityMissing(String),

    /// Text extraction failed for a single source file
    #[error("Extraction failed for {}: {reason}", path.display())]
    Extraction { path: PathBuf, reason: String },

    /// The persisted ingestion cache could not be understood
    #[error("Malformed cache: {0}")]
    MalformedCache(String),

    /// Embedding model errors
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// External embedding engine errors
    #[error("Remote engine error: {0}")]
    RemoteEngine(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl StatuteRagError {
    /// True when the error means "this tier/capability is absent", as opposed
    /// to a failure while using something that is present.
    pub fn is_capability_missing(&self) -> bool {
        matches!(self, StatuteRagError::CapabilityMissing(_))
    }
}

/// Convenient Result type using StatuteRagError
pub type Result<T> = std::result::Result<T, StatuteRagError>;
