//! Vector search client
//!
//! [`VectorStore`] is the raw store contract (query by vector, upsert);
//! [`SemanticSearch`] embeds the question first and asks the store for the
//! closest policy chunks. Results come back in the store's own similarity
//! order and are never re-ranked.

pub mod memory;
pub mod pinecone;

use crate::embed::{EmbedError, Embedder};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

pub use memory::MemoryVectorStore;
pub use pinecone::PineconeStore;

/// Number of chunks retrieved per question
pub const DEFAULT_TOP_K: usize = 5;

/// Vector errors
#[derive(Error, Debug)]
pub enum VectorError {
    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    #[error("Vector store API error: {0}")]
    ApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type VectorResult<T> = Result<T, VectorError>;

impl VectorError {
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            VectorError::Timeout(e.to_string())
        } else {
            VectorError::NetworkError(e.to_string())
        }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, VectorError::Timeout(_) | VectorError::Embedding(EmbedError::Timeout(_)))
    }
}

/// One word window of an ingested policy document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievedChunk {
    pub text: String,
    #[serde(default)]
    pub source_file: String,
    #[serde(default)]
    pub policy_type: String,
}

impl RetrievedChunk {
    pub fn new(text: impl Into<String>, source_file: impl Into<String>, policy_type: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            source_file: source_file.into(),
            policy_type: policy_type.into(),
        }
    }

    /// Metadata value by key, as stored alongside the vector
    pub fn metadata(&self, key: &str) -> Option<&str> {
        match key {
            "text" => Some(&self.text),
            "source_file" => Some(&self.source_file),
            "policy_type" => Some(&self.policy_type),
            _ => None,
        }
    }
}

/// Exact-match constraints over chunk metadata. All entries must match.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFilter(BTreeMap<String, String>);

impl MetadataFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn policy_type(value: impl Into<String>) -> Self {
        Self::new().with("policy_type", value)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.0.iter()
    }

    pub fn matches(&self, chunk: &RetrievedChunk) -> bool {
        self.0.iter().all(|(k, v)| chunk.metadata(k) == Some(v.as_str()))
    }
}

/// An embedded chunk ready to be written to a store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkRecord {
    pub id: String,
    pub values: Vec<f32>,
    pub chunk: RetrievedChunk,
}

/// Nearest-neighbour store over chunk embeddings
#[async_trait]
pub trait VectorStore: Send + Sync {
    /// Up to `top_k` chunks, most similar first
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> VectorResult<Vec<RetrievedChunk>>;

    /// Insert or replace records by id; returns the number written
    async fn upsert(&self, records: Vec<ChunkRecord>) -> VectorResult<usize>;
}

/// Text-in, chunks-out retrieval used by the orchestrator
#[async_trait]
pub trait PolicySearch: Send + Sync {
    async fn search(&self, query: &str, filter: Option<&MetadataFilter>) -> VectorResult<Vec<RetrievedChunk>>;
}

/// Embeds the query then queries the store
pub struct SemanticSearch {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    top_k: usize,
}

impl SemanticSearch {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

#[async_trait]
impl PolicySearch for SemanticSearch {
    async fn search(&self, query: &str, filter: Option<&MetadataFilter>) -> VectorResult<Vec<RetrievedChunk>> {
        let vector = self.embedder.embed(query).await?;
        let chunks = self.store.query(&vector, self.top_k, filter).await?;
        debug!(chunks = chunks.len(), top_k = self.top_k, "policy search complete");
        Ok(chunks)
    }
}
