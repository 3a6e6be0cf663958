// tests/test_helpers/mod.rs
// In-memory stand-ins for the model, the vector store and web search

#![allow(dead_code)]

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use std::sync::Mutex;

use ragchat::knowledge::{VectorRecord, VectorStore};
use ragchat::llm::{ChatModel, LlmError, PromptMessage};
use ragchat::tools::web::WebSearch;

/// Replies with a fixed text and remembers every prompt it was sent
pub struct FakeModel {
    reply: Option<String>,
    pub prompts: Mutex<Vec<Vec<PromptMessage>>>,
}

impl FakeModel {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Every call fails with an empty-choices error
    pub fn failing() -> Self {
        Self {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn last_prompt(&self) -> Vec<PromptMessage> {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl ChatModel for FakeModel {
    async fn complete(&self, messages: &[PromptMessage]) -> Result<String, LlmError> {
        self.prompts.lock().unwrap().push(messages.to_vec());
        self.reply.clone().ok_or(LlmError::EmptyChoices)
    }

    fn model_name(&self) -> &str {
        "fake-model"
    }
}

/// Vector store that returns canned contents and keeps upserts in memory
#[derive(Default)]
pub struct FakeStore {
    pub contents: Vec<String>,
    pub fail_search: bool,
    pub fail_upsert: bool,
    pub searches: Mutex<Vec<(usize, u64)>>,
    pub upserts: Mutex<Vec<VectorRecord>>,
}

impl FakeStore {
    pub fn with_contents(contents: &[&str]) -> Self {
        Self {
            contents: contents.iter().map(|s| s.to_string()).collect(),
            ..Self::default()
        }
    }
}

#[async_trait]
impl VectorStore for FakeStore {
    async fn ensure_collection(&self) -> Result<()> {
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: u64) -> Result<Vec<String>> {
        self.searches.lock().unwrap().push((vector.len(), limit));
        if self.fail_search {
            return Err(anyhow!("qdrant unreachable"));
        }
        Ok(self.contents.iter().take(limit as usize).cloned().collect())
    }

    async fn upsert(&self, record: VectorRecord) -> Result<()> {
        if self.fail_upsert {
            return Err(anyhow!("write rejected"));
        }
        self.upserts.lock().unwrap().push(record);
        Ok(())
    }

    fn describe(&self) -> String {
        "fake://store".to_string()
    }
}

/// Web search with a fixed answer
pub struct FakeWeb(pub String);

#[async_trait]
impl WebSearch for FakeWeb {
    async fn search(&self, _query: &str) -> String {
        self.0.clone()
    }
}
