use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
///
/// Every section is optional: with no file and no environment variables the
/// engine runs with lexical search only against `./law_pdfs`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub corpus: CorpusConfig,
    #[serde(default)]
    pub embeddings: EmbeddingsConfig,
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub search: SearchConfig,
}

/// Where the statute PDFs live and how the per-directory cache is named
#[derive(Debug, Clone, Deserialize)]
pub struct CorpusConfig {
    /// Default directory ingested at startup and by implicit first-search ingestion.
    #[serde(default = "default_corpus_dir")]
    pub dir: PathBuf,
    /// Cache file written inside each ingested directory.
    #[serde(default = "default_cache_file_name")]
    pub cache_file_name: String,
}

/// Internal embedding tier (OpenAI-compatible `/embeddings` endpoint)
#[derive(Debug, Clone, Deserialize)]
pub struct EmbeddingsConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_embeddings_base_url")]
    pub base_url: String,
    #[serde(default = "default_embeddings_model")]
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// External embedding engine that answers whole queries
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Search configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_k")]
    pub default_k: usize,
}

fn default_corpus_dir() -> PathBuf {
    PathBuf::from("law_pdfs")
}

fn default_cache_file_name() -> String {
    ".rag_index_cache.json".to_string()
}

fn default_embeddings_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_embeddings_model() -> String {
    "text-embedding-3-small".to_string()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_batch_size() -> usize {
    100
}

fn default_cache_capacity() -> usize {
    1000
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_k() -> usize {
    3
}

impl Default for CorpusConfig {
    fn default() -> Self {
        Self {
            dir: default_corpus_dir(),
            cache_file_name: default_cache_file_name(),
        }
    }
}

impl Default for EmbeddingsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_embeddings_base_url(),
            model: default_embeddings_model(),
            api_key_env: default_api_key_env(),
            batch_size: default_batch_size(),
            cache_capacity: default_cache_capacity(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self { default_k: default_k() }
    }
}

impl Config {
    /// Load configuration
    ///
    /// Loads environment variables from .env file (if present) first.
    /// Looks for a config file in this order:
    /// 1. Path specified in STATUTE_RAG_CONFIG environment variable
    /// 2. ./statute-rag.toml in current directory
    ///
    /// A missing file is not an error (defaults are used); capability flags
    /// from the environment are applied on top either way.
    pub fn load() -> Result<Self> {
        let _ = dotenv::dotenv();

        let config_path = std::env::var("STATUTE_RAG_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("statute-rag.toml"));

        let mut config = if config_path.exists() {
            let config_str = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;
            Self::from_toml_str(&config_str)
                .with_context(|| format!("Failed to parse {}", config_path.display()))?
        } else {
            log::debug!("No config file at {}, using defaults", config_path.display());
            Config::default()
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Parse configuration from TOML text without touching the environment.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Config = toml::from_str(s).context("Invalid configuration TOML")?;
        Ok(config)
    }

    /// Apply the `LTA_*` capability flags. `get` looks a variable up by name.
    pub fn apply_overrides(&mut self, get: impl Fn(&str) -> Option<String>) {
        if let Some(flag) = get("LTA_USE_EMBEDDINGS") {
            self.embeddings.enabled = flag.trim() == "1";
        }
        if let Some(url) = get("LTA_EMBEDDINGS_ENGINE_URL").filter(|u| !u.trim().is_empty()) {
            self.engine.url = Some(url.trim().to_string());
        }
        if let Some(url) = get("LTA_EMBEDDINGS_URL").filter(|u| !u.trim().is_empty()) {
            self.embeddings.base_url = url.trim().to_string();
        }
        if let Some(model) = get("LTA_EMBEDDINGS_MODEL").filter(|m| !m.trim().is_empty()) {
            self.embeddings.model = model.trim().to_string();
        }
        if let Some(key_env) = get("LTA_EMBEDDINGS_API_KEY_ENV").filter(|k| !k.trim().is_empty()) {
            self.embeddings.api_key_env = key_env.trim().to_string();
        }
        if let Some(dir) = get("LTA_CORPUS_DIR").filter(|d| !d.trim().is_empty()) {
            self.corpus.dir = PathBuf::from(dir.trim());
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.search.default_k == 0 {
            anyhow::bail!("search.default_k must be greater than 0");
        }

        if self.embeddings.batch_size == 0 {
            anyhow::bail!("embeddings.batch_size must be greater than 0");
        }

        if self.corpus.cache_file_name.trim().is_empty() {
            anyhow::bail!("corpus.cache_file_name must not be empty");
        }

        Ok(())
    }

    /// Default corpus directory
    pub fn corpus_dir(&self) -> &Path {
        &self.corpus.dir
    }

    /// The external engine is consulted only when semantic search is switched on.
    pub fn remote_engine_url(&self) -> Option<&str> {
        if self.embeddings.enabled {
            self.engine.url.as_deref()
        } else {
            None
        }
    }
}
