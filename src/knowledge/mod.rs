//! Knowledge sources consulted before answering: the Qdrant vector store and
//! a static snippet read once at startup.

pub mod qdrant;
pub mod snippet;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

use crate::llm::Embedder;

pub use qdrant::QdrantStore;
pub use snippet::load_snippet;

/// Payload stored alongside each vector
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordPayload {
    pub content: String,
}

/// One point in the vector store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorRecord {
    pub id: String,
    pub vector: Vec<f32>,
    pub payload: RecordPayload,
}

impl VectorRecord {
    /// New record with a fresh time-based id
    pub fn new(vector: Vec<f32>, content: impl Into<String>) -> Self {
        Self {
            id: next_record_id(),
            vector,
            payload: RecordPayload {
                content: content.into(),
            },
        }
    }
}

static LAST_ID: AtomicU64 = AtomicU64::new(0);

/// Unix milliseconds as a string, bumped by one when two records land in the
/// same millisecond so ids stay unique within the process.
pub fn next_record_id() -> String {
    let now = chrono::Utc::now().timestamp_millis().max(0) as u64;
    let mut last = LAST_ID.load(Ordering::Relaxed);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, candidate, Ordering::Relaxed, Ordering::Relaxed) {
            Ok(_) => return candidate.to_string(),
            Err(actual) => last = actual,
        }
    }
}

/// Nearest-neighbour store the chat reads from and writes exchanges to
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Create the backing collection if it is missing
    async fn ensure_collection(&self) -> Result<()>;

    /// Contents of the `limit` nearest records, closest first
    async fn search(&self, vector: &[f32], limit: u64) -> Result<Vec<String>>;

    async fn upsert(&self, record: VectorRecord) -> Result<()>;

    /// Human-readable location, for status output
    fn describe(&self) -> String;
}

/// Split text into blank-line separated paragraphs, trimmed, empties dropped
pub fn split_paragraphs(text: &str) -> Vec<String> {
    let mut paragraphs = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in text.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                paragraphs.push(current.join("\n"));
                current.clear();
            }
        } else {
            current.push(line.trim_end());
        }
    }
    if !current.is_empty() {
        paragraphs.push(current.join("\n"));
    }

    paragraphs
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Embed every paragraph of `text` and store it. Returns the record count.
pub async fn ingest(store: &dyn VectorStore, embedder: &dyn Embedder, text: &str) -> Result<usize> {
    store.ensure_collection().await?;

    let paragraphs = split_paragraphs(text);
    info!("Ingesting {} paragraphs into {}", paragraphs.len(), store.describe());

    for (i, paragraph) in paragraphs.iter().enumerate() {
        let vector = embedder.embed(paragraph).await?;
        store.upsert(VectorRecord::new(vector, paragraph.clone())).await?;
        debug!("Stored paragraph {}/{}", i + 1, paragraphs.len());
    }

    Ok(paragraphs.len())
}
