//! Qdrant-backed knowledge store

use anyhow::{Context, Result};
use async_trait::async_trait;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value as QdrantValue, VectorParamsBuilder,
};
use qdrant_client::Qdrant;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, info};

use super::{VectorRecord, VectorStore};
use crate::config::Config;

pub struct QdrantStore {
    client: Qdrant,
    url: String,
    collection: String,
    dimension: u64,
}

impl QdrantStore {
    pub fn new(url: &str, collection: &str, dimension: usize, timeout: Duration) -> Result<Self> {
        let client = Qdrant::from_url(url)
            .timeout(timeout)
            .skip_compatibility_check()
            .build()
            .with_context(|| format!("Failed to configure Qdrant client for {}", url))?;

        Ok(Self {
            client,
            url: url.to_string(),
            collection: collection.to_string(),
            dimension: dimension as u64,
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(
            &config.qdrant_url,
            &config.collection,
            config.embedding_dim,
            config.request_timeout(),
        )
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }
}

#[async_trait]
impl VectorStore for QdrantStore {
    async fn ensure_collection(&self) -> Result<()> {
        let exists = self.client.collection_exists(&self.collection).await?;
        if !exists {
            info!("Creating Qdrant collection: {}", self.collection);
            self.client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection)
                        .vectors_config(VectorParamsBuilder::new(self.dimension, Distance::Cosine)),
                )
                .await
                .context(format!("Failed to create collection: {}", self.collection))?;
        }
        Ok(())
    }

    async fn search(&self, vector: &[f32], limit: u64) -> Result<Vec<String>> {
        let search = SearchPointsBuilder::new(&self.collection, vector.to_vec(), limit)
            .with_payload(true);

        let results = self
            .client
            .search_points(search)
            .await
            .context("Qdrant search failed")?;

        let contents: Vec<String> = results
            .result
            .into_iter()
            .filter_map(|point| Some(point.payload.get("content")?.as_str()?.to_string()))
            .collect();

        debug!("Qdrant returned {} records from {}", contents.len(), self.collection);
        Ok(contents)
    }

    async fn upsert(&self, record: VectorRecord) -> Result<()> {
        let mut payload: HashMap<String, QdrantValue> = HashMap::new();
        payload.insert("content".to_string(), record.payload.content.into());
        // keep the caller's id readable even when it had to be hashed
        payload.insert("record_id".to_string(), record.id.clone().into());

        let point = PointStruct::new(point_id(&record.id), record.vector, payload);

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await
            .context("Failed to store point")?;

        debug!("Stored point {} in {}", record.id, self.collection);
        Ok(())
    }

    fn describe(&self) -> String {
        format!("{}/{}", self.url, self.collection)
    }
}

/// Qdrant only accepts unsigned integers or UUIDs as point ids
fn point_id(id: &str) -> u64 {
    id.parse::<u64>().unwrap_or_else(|_| hash_string(id))
}

/// Hash a string to u64 for Qdrant point ID
fn hash_string(s: &str) -> u64 {
    use std::hash::{Hash, Hasher};
    let mut hasher = std::collections::hash_map::DefaultHasher::new();
    s.hash(&mut hasher);
    hasher.finish()
}
