//! Policy document ingestion
//!
//! Splits every `*.txt` file in a directory into overlapping word windows,
//! embeds them and writes them to the vector store. Each document is also
//! registered in the graph when a registry is configured.
//!
//! Chunk ids depend only on the file name and the chunk position, so
//! ingesting the same directory again overwrites the earlier records.

use crate::embed::{EmbedError, Embedder};
use crate::graph::{DocumentRegistry, GraphError};
use crate::vector::{ChunkRecord, RetrievedChunk, VectorError, VectorStore};
use futures::stream::{self, StreamExt, TryStreamExt};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Embedding failed: {0}")]
    Embedding(#[from] EmbedError),

    #[error("Vector store error: {0}")]
    Vector(#[from] VectorError),

    #[error("Document registration failed: {0}")]
    Graph(#[from] GraphError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

pub type IngestResult<T> = Result<T, IngestError>;

/// Fixed-size word windows.
///
/// Windows start every `size - overlap` words (at least one); the last
/// windows may be shorter than `size`.
pub fn chunk_words(text: &str, size: usize, overlap: usize) -> Vec<String> {
    let words: Vec<&str> = text.split_whitespace().collect();
    if size == 0 {
        return Vec::new();
    }
    let step = size.saturating_sub(overlap).max(1);

    (0..words.len())
        .step_by(step)
        .map(|start| words[start..start.saturating_add(size).min(words.len())].join(" "))
        .collect()
}

/// Chunks written for one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentReport {
    pub filename: String,
    pub policy_type: String,
    pub chunks: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub documents: Vec<DocumentReport>,
    pub uploaded: usize,
}

pub struct IngestPipeline {
    embedder: Arc<dyn Embedder>,
    store: Arc<dyn VectorStore>,
    registry: Option<Arc<dyn DocumentRegistry>>,
    chunk_size: usize,
    chunk_overlap: usize,
    concurrency: usize,
}

impl IngestPipeline {
    pub fn new(embedder: Arc<dyn Embedder>, store: Arc<dyn VectorStore>) -> Self {
        Self {
            embedder,
            store,
            registry: None,
            chunk_size: 50,
            chunk_overlap: 25,
            concurrency: 4,
        }
    }

    pub fn with_registry(mut self, registry: Arc<dyn DocumentRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn with_chunking(mut self, size: usize, overlap: usize) -> Self {
        self.chunk_size = size;
        self.chunk_overlap = overlap;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Ingest every `.txt` file directly under `dir`, in name order
    pub async fn ingest_directory(&self, dir: &Path) -> IngestResult<IngestReport> {
        if self.chunk_size == 0 {
            return Err(IngestError::ConfigError("chunk size must be positive".to_string()));
        }
        let files = policy_files(dir).await?;
        info!(dir = %dir.display(), files = files.len(), "ingesting policy documents");

        let mut report = IngestReport::default();
        let mut records = Vec::new();

        for path in files {
            let text = tokio::fs::read_to_string(&path).await.map_err(|source| IngestError::Io {
                path: path.clone(),
                source,
            })?;
            let filename = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            let policy_type = policy_type_of(&filename);

            if let Some(registry) = &self.registry {
                registry.register_document(&policy_type, &filename).await?;
            }

            let chunks = chunk_words(&text, self.chunk_size, self.chunk_overlap);
            info!(file = %filename, chunks = chunks.len(), "chunked document");
            report.documents.push(DocumentReport {
                filename: filename.clone(),
                policy_type: policy_type.clone(),
                chunks: chunks.len(),
            });

            let embedded = self.embed_all(&chunks).await?;
            records.extend(chunks.into_iter().zip(embedded).enumerate().map(|(index, (text, values))| ChunkRecord {
                id: chunk_id(&filename, index),
                values,
                chunk: RetrievedChunk::new(text, filename.clone(), policy_type.clone()),
            }));
        }

        info!(chunks = records.len(), "uploading chunks");
        report.uploaded = if records.is_empty() {
            0
        } else {
            self.store.upsert(records).await?
        };
        Ok(report)
    }

    /// Embeddings in input order, at most `concurrency` requests in flight
    async fn embed_all(&self, chunks: &[String]) -> IngestResult<Vec<Vec<f32>>> {
        let embedder = &self.embedder;
        let vectors: Vec<Vec<f32>> = stream::iter(chunks.iter())
            .map(|chunk| async move { embedder.embed(chunk).await })
            .buffered(self.concurrency)
            .try_collect()
            .await?;
        Ok(vectors)
    }
}

/// Stable record id for the `index`-th chunk of `filename`
pub fn chunk_id(filename: &str, index: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(filename.as_bytes());
    hasher.update(b"#");
    hasher.update(index.to_string().as_bytes());
    format!("{:x}", hasher.finalize())
}

/// `.txt` files (any case) directly under `dir`, sorted by name
async fn policy_files(dir: &Path) -> IngestResult<Vec<PathBuf>> {
    let io_err = |source: std::io::Error| IngestError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = tokio::fs::read_dir(dir).await.map_err(io_err)?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
        let path = entry.path();
        let is_txt = path
            .extension()
            .map(|e| e.to_string_lossy().eq_ignore_ascii_case("txt"))
            .unwrap_or(false);
        if is_txt && entry.file_type().await.map_err(io_err)?.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn policy_type_of(filename: &str) -> String {
    match filename.len().checked_sub(4) {
        Some(cut) if filename.is_char_boundary(cut) && filename[cut..].eq_ignore_ascii_case(".txt") => {
            filename[..cut].to_string()
        }
        _ => filename.to_string(),
    }
}
