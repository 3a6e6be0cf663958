//! Configuration file support for ragchat
//!
//! Loads config from ~/.ragchat/config.toml. Every key is optional; missing
//! keys fall back to the local defaults (Ollama on 11434, Qdrant on 6334).

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::tools::web::SearchEngine;

pub const DEFAULT_LLM_URL: &str = "http://localhost:11434/v1";
pub const DEFAULT_LLM_MODEL: &str = "gemma2:2b";
/// Ollama ignores the key but its OpenAI-compatible endpoint expects the header
pub const DEFAULT_LLM_API_KEY: &str = "ollama";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_COLLECTION: &str = "music_chatbot";
pub const DEFAULT_EMBEDDING_DIM: usize = 1536;
pub const DEFAULT_SEARCH_LIMIT: u64 = 5;
pub const DEFAULT_WEB_RESULTS: usize = 3;
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Configuration for ragchat
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Base URL of the OpenAI-compatible API (chat completions, embeddings)
    pub llm_url: String,
    pub llm_model: String,
    /// Sent verbatim as the `Authorization` header
    pub llm_api_key: String,
    pub temperature: Option<f32>,

    /// Embedding model served by `embedding_url` (defaults to `llm_url`).
    /// Without one, questions are vectorized as zero vectors.
    pub embedding_model: Option<String>,
    pub embedding_url: Option<String>,
    pub embedding_dim: usize,

    /// Use the Qdrant knowledge base at all
    pub vector_store: bool,
    pub qdrant_url: String,
    pub collection: String,
    pub search_limit: u64,

    pub web_search: SearchEngine,
    pub web_results: usize,

    /// Inline knowledge text added to every prompt
    pub knowledge: Option<String>,
    /// Plain-text file read once at startup; takes precedence over `knowledge`
    pub knowledge_file: Option<PathBuf>,
    /// Replaces the built-in system prompt; may use `{knowledge}` and `{web}`
    pub system_prompt: Option<String>,

    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm_url: DEFAULT_LLM_URL.to_string(),
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            llm_api_key: DEFAULT_LLM_API_KEY.to_string(),
            temperature: None,
            embedding_model: None,
            embedding_url: None,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            vector_store: true,
            qdrant_url: DEFAULT_QDRANT_URL.to_string(),
            collection: DEFAULT_COLLECTION.to_string(),
            search_limit: DEFAULT_SEARCH_LIMIT,
            web_search: SearchEngine::Google,
            web_results: DEFAULT_WEB_RESULTS,
            knowledge: None,
            knowledge_file: None,
            system_prompt: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load config from ~/.ragchat/config.toml
    pub fn load() -> Self {
        Self::load_from(&config_path())
    }

    /// Load from an explicit path. A missing or unreadable file yields defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    warn!("Failed to parse {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read {}: {}", path.display(), e);
                Self::default()
            }
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }

    pub fn embedding_base_url(&self) -> &str {
        self.embedding_url.as_deref().unwrap_or(&self.llm_url)
    }
}

/// Directory holding config, .env and REPL history
pub fn config_dir() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".ragchat")
}

/// Get the config file path
pub fn config_path() -> PathBuf {
    config_dir().join("config.toml")
}
