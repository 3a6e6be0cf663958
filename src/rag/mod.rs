//! Retrieval-augmented answering
//!
//! One question runs through: vectorize -> vector search -> web search ->
//! completion -> store the exchange back into the vector store. Each source
//! is optional, which covers the plain, knowledge-base and web-search modes.

pub mod prompt;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::knowledge::{load_snippet, QdrantStore, VectorRecord, VectorStore};
use crate::llm::{embeddings, ChatModel, CompletionClient, EmbedError, Embedder, LlmError};
use crate::tools::web::{ScrapingSearch, WebSearch};

pub use prompt::{PromptTemplate, DEFAULT_SYSTEM_PROMPT};

/// Which stage of the pipeline failed
#[derive(Debug, thiserror::Error)]
pub enum RagError {
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    #[error("vector search failed: {0}")]
    VectorSearch(String),

    #[error("completion failed: {0}")]
    Completion(#[from] LlmError),

    #[error("storing the exchange failed: {0}")]
    Store(String),
}

/// Produces a reply for a question
#[async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, question: &str) -> Result<String, RagError>;
}

/// A reply plus what went into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub reply: String,
    pub knowledge_hits: usize,
    pub web_context: bool,
    pub stored: bool,
}

pub struct RagPipeline {
    model: Arc<dyn ChatModel>,
    embedder: Arc<dyn Embedder>,
    store: Option<Arc<dyn VectorStore>>,
    web: Option<Arc<dyn WebSearch>>,
    snippet: Option<String>,
    template: PromptTemplate,
    search_limit: u64,
}

impl RagPipeline {
    pub fn new(model: Arc<dyn ChatModel>, embedder: Arc<dyn Embedder>) -> Self {
        Self {
            model,
            embedder,
            store: None,
            web: None,
            snippet: None,
            template: PromptTemplate::default(),
            search_limit: crate::config::DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn VectorStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_web_search(mut self, web: Arc<dyn WebSearch>) -> Self {
        self.web = Some(web);
        self
    }

    pub fn with_snippet(mut self, snippet: Option<String>) -> Self {
        self.snippet = snippet;
        self
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_search_limit(mut self, limit: u64) -> Self {
        self.search_limit = limit;
        self
    }

    /// Wire up every source the config enables
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let model = Arc::new(CompletionClient::from_config(config)?);
        let embedder: Arc<dyn Embedder> = Arc::from(embeddings::from_config(config)?);

        let mut pipeline = Self::new(model, embedder)
            .with_snippet(load_snippet(config)?)
            .with_search_limit(config.search_limit);

        if let Some(template) = &config.system_prompt {
            pipeline = pipeline.with_template(PromptTemplate::new(template.clone()));
        }

        if config.vector_store {
            pipeline = pipeline.with_store(Arc::new(QdrantStore::from_config(config)?));
        }

        if let Some(scraper) =
            ScrapingSearch::new(config.web_search, config.web_results, config.request_timeout())
        {
            pipeline = pipeline.with_web_search(Arc::new(scraper));
        }

        Ok(pipeline)
    }

    pub fn model_name(&self) -> &str {
        self.model.model_name()
    }

    pub fn store(&self) -> Option<&Arc<dyn VectorStore>> {
        self.store.as_ref()
    }

    pub fn has_web_search(&self) -> bool {
        self.web.is_some()
    }

    pub fn has_snippet(&self) -> bool {
        self.snippet.is_some()
    }

    /// Create the vector collection if a store is configured
    pub async fn prepare(&self) -> anyhow::Result<()> {
        if let Some(store) = &self.store {
            store.ensure_collection().await?;
        }
        Ok(())
    }

    /// Knowledge-base text for the prompt: the static snippet, then the
    /// contents of the nearest stored records, one per line
    async fn gather_knowledge(&self, question: &str) -> Result<(String, usize), RagError> {
        let mut parts: Vec<String> = self.snippet.iter().cloned().collect();
        let mut hits = 0;

        if let Some(store) = &self.store {
            let vector = self.embedder.embed(question).await?;
            let contents = store
                .search(&vector, self.search_limit)
                .await
                .map_err(|e| RagError::VectorSearch(format!("{:#}", e)))?;
            hits = contents.len();
            parts.extend(contents);
        }

        Ok((parts.join("\n"), hits))
    }

    /// Write the finished exchange back so later questions can find it
    async fn remember(&self, store: &dyn VectorStore, question: &str, reply: &str) -> Result<(), RagError> {
        let vector = self.embedder.embed(&format!("{} {}", question, reply)).await?;
        let record = VectorRecord::new(vector, format!("User: {}\nBot: {}", question, reply));
        store
            .upsert(record)
            .await
            .map_err(|e| RagError::Store(format!("{:#}", e)))
    }

    pub async fn answer(&self, question: &str) -> Result<Answer, RagError> {
        let (knowledge, knowledge_hits) = self.gather_knowledge(question).await?;

        let web_results = match &self.web {
            Some(web) => web.search(question).await,
            None => String::new(),
        };

        let messages = self.template.messages(&knowledge, &web_results, question);
        debug!(
            "Prompting {} with {} knowledge records, {} bytes of web results",
            self.model.model_name(),
            knowledge_hits,
            web_results.len()
        );

        let reply = self.model.complete(&messages).await?;

        // the reply already exists, so a failed write only costs future recall
        let stored = match &self.store {
            Some(store) => match self.remember(store.as_ref(), question, &reply).await {
                Ok(()) => true,
                Err(e) => {
                    warn!("Failed to store conversation in {}: {}", store.describe(), e);
                    false
                }
            },
            None => false,
        };

        info!(
            "Answered ({} chars, {} knowledge hits, stored: {})",
            reply.len(),
            knowledge_hits,
            stored
        );

        Ok(Answer {
            reply,
            knowledge_hits,
            web_context: !web_results.is_empty(),
            stored,
        })
    }
}

#[async_trait]
impl Responder for RagPipeline {
    async fn respond(&self, question: &str) -> Result<String, RagError> {
        self.answer(question).await.map(|a| a.reply)
    }
}
