//! In-process vector store
//!
//! Exact cosine scan over every stored vector. Small policy corpora fit
//! comfortably, and unlike an approximate index the scan can apply metadata
//! filters before ranking.

use super::{ChunkRecord, MetadataFilter, RetrievedChunk, VectorError, VectorResult, VectorStore};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::info;

/// Cosine distance, `1 - cosine similarity`. Zero vectors sit at distance 1.
pub fn cosine_distance(va: &[f32], vb: &[f32]) -> f32 {
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;

    for (a, b) in va.iter().zip(vb.iter()) {
        dot += a * b;
        norm_a += a * a;
        norm_b += b * b;
    }

    if norm_a <= 0.0 || norm_b <= 0.0 {
        return 1.0;
    }

    1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    dimensions: Option<usize>,
    records: Vec<ChunkRecord>,
}

/// Vectors kept in insertion order; equal distances keep that order
#[derive(Debug, Default)]
pub struct MemoryVectorStore {
    inner: RwLock<Snapshot>,
}

impl MemoryVectorStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a store written by [`MemoryVectorStore::dump`]
    pub async fn load(path: &Path) -> VectorResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        let snapshot: Snapshot =
            serde_json::from_slice(&bytes).map_err(|e| VectorError::SerializationError(e.to_string()))?;
        info!(path = %path.display(), records = snapshot.records.len(), "loaded vector snapshot");
        Ok(Self {
            inner: RwLock::new(snapshot),
        })
    }

    /// `load` when the file exists, an empty store otherwise
    pub async fn open(path: &Path) -> VectorResult<Self> {
        if tokio::fs::try_exists(path).await? {
            Self::load(path).await
        } else {
            Ok(Self::new())
        }
    }

    /// Write every record as a JSON snapshot
    pub async fn dump(&self, path: &Path) -> VectorResult<()> {
        let inner = self.inner.read().await;
        let json = serde_json::to_vec(&*inner).map_err(|e| VectorError::SerializationError(e.to_string()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, json).await?;
        info!(path = %path.display(), records = inner.records.len(), "wrote vector snapshot");
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.records.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn dimensions(&self) -> Option<usize> {
        self.inner.read().await.dimensions
    }
}

#[async_trait]
impl VectorStore for MemoryVectorStore {
    async fn query(
        &self,
        vector: &[f32],
        top_k: usize,
        filter: Option<&MetadataFilter>,
    ) -> VectorResult<Vec<RetrievedChunk>> {
        let inner = self.inner.read().await;
        let Some(expected) = inner.dimensions else {
            return Ok(Vec::new());
        };
        if vector.len() != expected {
            return Err(VectorError::DimensionMismatch {
                expected,
                got: vector.len(),
            });
        }

        let mut scored: Vec<(f32, &ChunkRecord)> = inner
            .records
            .iter()
            .filter(|r| filter.map_or(true, |f| f.matches(&r.chunk)))
            .map(|r| (cosine_distance(vector, &r.values), r))
            .collect();
        // sort_by is stable, so ties keep insertion order
        scored.sort_by(|a, b| a.0.total_cmp(&b.0));

        Ok(scored.into_iter().take(top_k).map(|(_, r)| r.chunk.clone()).collect())
    }

    async fn upsert(&self, records: Vec<ChunkRecord>) -> VectorResult<usize> {
        let mut inner = self.inner.write().await;

        let expected = inner.dimensions.or_else(|| records.first().map(|r| r.values.len()));
        if let Some(expected) = expected {
            if let Some(bad) = records.iter().find(|r| r.values.len() != expected) {
                return Err(VectorError::DimensionMismatch {
                    expected,
                    got: bad.values.len(),
                });
            }
            inner.dimensions = Some(expected);
        }

        let written = records.len();
        for record in records {
            match inner.records.iter().position(|r| r.id == record.id) {
                Some(pos) => inner.records[pos] = record,
                None => inner.records.push(record),
            }
        }
        Ok(written)
    }
}
