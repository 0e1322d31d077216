//! Builds every client once from configuration and wires them together

use crate::config::{AppConfig, GraphBackend, VectorBackend};
use crate::embed::{EmbedError, Embedder, EmbeddingClient};
use crate::graph::{DocumentRegistry, GraphContext, GraphError, MemoryDirectory, Neo4jClient};
use crate::http::AppState;
use crate::ingest::{IngestError, IngestPipeline, IngestReport};
use crate::llm::{GenerationClient, GenerationError, LlmClient};
use crate::rag::{AnswerOrchestrator, OrchestratorConfig};
use crate::vector::{MemoryVectorStore, PineconeStore, SemanticSearch, VectorError, VectorStore};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Graph backend: {0}")]
    Graph(#[from] GraphError),

    #[error("Vector backend: {0}")]
    Vector(#[from] VectorError),

    #[error("Embedding client: {0}")]
    Embedding(#[from] EmbedError),

    #[error("Generation client: {0}")]
    Generation(#[from] GenerationError),

    #[error("Ingestion: {0}")]
    Ingest(#[from] IngestError),
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;

/// Every long-lived client of the process
pub struct Services {
    pub config: AppConfig,
    pub graph: Arc<dyn GraphContext>,
    pub registry: Option<Arc<dyn DocumentRegistry>>,
    pub embedder: Arc<dyn Embedder>,
    pub store: Arc<dyn VectorStore>,
    /// Set when vectors live in process and can be snapshotted
    pub memory_store: Option<Arc<MemoryVectorStore>>,
    pub llm: Arc<dyn GenerationClient>,
    pub orchestrator: Arc<AnswerOrchestrator>,
}

pub async fn build_services(config: &AppConfig) -> BootstrapResult<Services> {
    let (graph, registry): (Arc<dyn GraphContext>, Arc<dyn DocumentRegistry>) = match config.graph.backend {
        GraphBackend::Neo4j => {
            let client = Arc::new(Neo4jClient::new(&config.graph)?);
            info!(uri = %config.graph.uri, database = %config.graph.database, "using Neo4j graph");
            (client.clone() as Arc<dyn GraphContext>, client as Arc<dyn DocumentRegistry>)
        }
        GraphBackend::Memory => {
            let directory = match &config.graph.seed_file {
                Some(path) => Arc::new(MemoryDirectory::from_file(path).await?),
                None => {
                    warn!("memory graph has no seed_file; every user will be unknown");
                    Arc::new(MemoryDirectory::default())
                }
            };
            (directory.clone() as Arc<dyn GraphContext>, directory as Arc<dyn DocumentRegistry>)
        }
    };

    let (store, memory_store): (Arc<dyn VectorStore>, Option<Arc<MemoryVectorStore>>) = match config.vector.backend {
        VectorBackend::Pinecone => {
            info!(index = %config.vector.index, "using Pinecone vector store");
            (Arc::new(PineconeStore::new(&config.vector)?) as Arc<dyn VectorStore>, None)
        }
        VectorBackend::Memory => {
            let store = match &config.vector.snapshot_path {
                Some(path) => Arc::new(MemoryVectorStore::open(path).await?),
                None => Arc::new(MemoryVectorStore::new()),
            };
            (store.clone() as Arc<dyn VectorStore>, Some(store))
        }
    };

    let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingClient::new(&config.embedding)?);
    let llm: Arc<dyn GenerationClient> = Arc::new(LlmClient::new(&config.generation)?);
    info!(
        embedding = ?config.embedding.provider,
        generation = ?config.generation.provider,
        model = %config.generation.model,
        "model clients ready"
    );

    let search = SemanticSearch::new(embedder.clone(), store.clone()).with_top_k(config.rag.top_k);
    let orchestrator = AnswerOrchestrator::new(graph.clone(), Arc::new(search), llm.clone())
        .with_prompt_config(&config.prompt)
        .with_config(OrchestratorConfig::from(&config.rag));

    Ok(Services {
        config: config.clone(),
        graph,
        registry: Some(registry),
        embedder,
        store,
        memory_store,
        llm,
        orchestrator: Arc::new(orchestrator),
    })
}

impl Services {
    pub fn app_state(&self) -> AppState {
        AppState::new(self.orchestrator.clone())
    }

    pub fn ingest_pipeline(&self) -> IngestPipeline {
        let ingest = &self.config.ingest;
        let pipeline = IngestPipeline::new(self.embedder.clone(), self.store.clone())
            .with_chunking(ingest.chunk_size, ingest.chunk_overlap)
            .with_concurrency(ingest.concurrency);
        match &self.registry {
            Some(registry) => pipeline.with_registry(registry.clone()),
            None => pipeline,
        }
    }

    /// Ingest `dir` and persist in-process vectors when a snapshot path is set
    pub async fn ingest(&self, dir: &Path) -> BootstrapResult<IngestReport> {
        let report = self.ingest_pipeline().ingest_directory(dir).await?;
        self.save_vectors().await?;
        info!(documents = report.documents.len(), uploaded = report.uploaded, "ingestion complete");
        Ok(report)
    }

    pub async fn save_vectors(&self) -> BootstrapResult<()> {
        if let (Some(store), Some(path)) = (&self.memory_store, &self.config.vector.snapshot_path) {
            store.dump(path).await?;
        }
        Ok(())
    }
}
