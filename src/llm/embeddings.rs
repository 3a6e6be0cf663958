// src/llm/embeddings.rs
// Text vectorization through an OpenAI-compatible /embeddings endpoint

use async_trait::async_trait;
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

use crate::config::Config;

const EMBED_RETRY_ATTEMPTS: u32 = 2;
const RETRY_DELAY: Duration = Duration::from_millis(500);

#[derive(Debug, thiserror::Error)]
pub enum EmbedError {
    #[error("Request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Embedding API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("Invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("Expected {expected}-dimensional embedding, got {actual}")]
    Dimension { expected: usize, actual: usize },
}

impl EmbedError {
    /// Client errors (bad model, bad key) won't improve on retry
    fn is_permanent(&self) -> bool {
        match self {
            EmbedError::Api { status, .. } => (400..500).contains(status) && *status != 429,
            EmbedError::Dimension { .. } => true,
            _ => false,
        }
    }
}

/// Turns text into a fixed-size vector
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;

    fn dimension(&self) -> usize;
}

/// Stand-in used when no embedding model is configured: every text maps to
/// the zero vector, so searches still run but rank nothing in particular.
#[derive(Debug, Clone)]
pub struct PlaceholderEmbedder {
    dimension: usize,
}

impl PlaceholderEmbedder {
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }
}

#[async_trait]
impl Embedder for PlaceholderEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbedError> {
        Ok(vec![0.0; self.dimension])
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
}

/// Response from the embeddings API
#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

/// Embedder backed by `POST {base_url}/embeddings`
#[derive(Debug, Clone)]
pub struct HttpEmbedder {
    client: Client,
    base_url: String,
    model: String,
    api_key: String,
    dimension: usize,
    retry_delay: Duration,
}

impl HttpEmbedder {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        dimension: usize,
        timeout: Duration,
    ) -> Result<Self, EmbedError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            model: model.into(),
            api_key: api_key.into(),
            dimension,
            retry_delay: RETRY_DELAY,
        })
    }

    /// Shorten the pause between attempts (tests)
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .post(&url)
            .header(header::AUTHORIZATION, &self.api_key)
            .json(&EmbeddingRequest {
                model: &self.model,
                input: text,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(EmbedError::Api {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let parsed: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| EmbedError::InvalidResponse(e.to_string()))?;

        let embedding = parsed
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbedError::InvalidResponse("no embedding data".into()))?;

        if embedding.len() != self.dimension {
            return Err(EmbedError::Dimension {
                expected: self.dimension,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        let mut attempt = 0;
        loop {
            match self.embed_once(text).await {
                Ok(v) => return Ok(v),
                Err(e) if attempt < EMBED_RETRY_ATTEMPTS && !e.is_permanent() => {
                    attempt += 1;
                    debug!("Retrying embed (attempt {}): {}", attempt + 1, e);
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Pick the embedder the config asks for
pub fn from_config(config: &Config) -> Result<Box<dyn Embedder>, EmbedError> {
    match &config.embedding_model {
        Some(model) => {
            info!("Embeddings: {} via {}", model, config.embedding_base_url());
            Ok(Box::new(HttpEmbedder::new(
                config.embedding_base_url(),
                model.clone(),
                config.llm_api_key.clone(),
                config.embedding_dim,
                config.request_timeout(),
            )?))
        }
        None => {
            info!(
                "Embeddings: no model configured, using {}-dim placeholder vectors",
                config.embedding_dim
            );
            Ok(Box::new(PlaceholderEmbedder::new(config.embedding_dim)))
        }
    }
}
