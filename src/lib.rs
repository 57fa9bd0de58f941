pub mod config;
pub mod error;
pub mod index;
pub mod ingest;
pub mod embeddings;
pub mod search;
pub mod engine;
pub mod watch;

#[cfg(all(test, feature = "pdf"))]
pub(crate) mod test_support;

pub use config::Config;
pub use engine::{IngestionSummary, RetrievalEngine, RetrievalEngineBuilder};
pub use error::{Result, StatuteRagError};
pub use index::{IndexDiagnostics, PageIndex, PageRecord};
