//! Language model access: chat completions and text embeddings.
//!
//! Both talk to an OpenAI-compatible HTTP API, which is what Ollama serves
//! under `/v1`.

pub mod client;
pub mod embeddings;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use client::{CompletionClient, LlmError};
pub use embeddings::{EmbedError, Embedder, HttpEmbedder, PlaceholderEmbedder};

/// Message role in a completion request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// One role-tagged entry of a completion request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptMessage {
    pub role: Role,
    pub content: String,
}

impl PromptMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self { role: Role::System, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self { role: Role::User, content: content.into() }
    }
}

/// Anything that turns a list of prompt messages into a reply
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, LlmError>;

    fn model_name(&self) -> &str;
}
