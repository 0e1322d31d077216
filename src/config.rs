//! Runtime configuration.
//!
//! Uses Figment to merge, lowest precedence first: built-in defaults,
//! `onboarding.toml` (or the file named by `ONBOARDING_CONFIG`), the
//! conventional backend variables (`NEO4J_URI`, `PINECONE_API_KEY`,
//! `OLLAMA_BASE_URL`, ...) and finally `ONBOARDING_*` variables with `__`
//! separating sections (`ONBOARDING_SERVER__PORT=9000`).

use crate::llm::LLMProvider;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "onboarding.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub graph: GraphConfig,
    pub vector: VectorConfig,
    pub embedding: EmbeddingConfig,
    pub generation: GenerationConfig,
    pub prompt: PromptConfig,
    pub rag: RagConfig,
    pub ingest: IngestConfig,
}

impl AppConfig {
    /// Load from the default file (or `ONBOARDING_CONFIG`) and the environment.
    pub fn load() -> Result<Self, figment::Error> {
        let path = std::env::var("ONBOARDING_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_FILE));
        Self::figment(&path).extract()
    }

    /// Load from an explicit file and the environment.
    pub fn load_from(path: &Path) -> Result<Self, figment::Error> {
        Self::figment(path).extract()
    }

    /// The full provider stack; a missing file contributes nothing.
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(backend_env())
            .merge(Env::raw().only(&["OLLAMA_BASE_URL"]).map(|_| "embedding.api_base_url".into()))
            .merge(Env::raw().only(&["OLLAMA_BASE_URL"]).map(|_| "generation.api_base_url".into()))
            .merge(Env::prefixed("ONBOARDING_").split("__"))
    }
}

/// Variables the backing services conventionally read, mapped onto config keys
fn backend_env() -> Env {
    Env::raw()
        .only(&[
            "NEO4J_URI",
            "NEO4J_USER",
            "NEO4J_PASSWORD",
            "PINECONE_API_KEY",
            "PINECONE_INDEX",
            "PINECONE_HOST",
        ])
        .map(|key| match key.as_str().to_ascii_uppercase().as_str() {
            "NEO4J_URI" => "graph.uri".into(),
            "NEO4J_USER" => "graph.user".into(),
            "NEO4J_PASSWORD" => "graph.password".into(),
            "PINECONE_API_KEY" => "vector.api_key".into(),
            "PINECONE_INDEX" => "vector.index".into(),
            "PINECONE_HOST" => "vector.host".into(),
            other => other.to_string().into(),
        })
}

/// HTTP listener settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub address: String,
    /// Port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GraphBackend {
    Neo4j,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub backend: GraphBackend,
    /// Neo4j URI; `bolt://` and `neo4j://` are mapped onto the HTTP endpoint
    pub uri: String,
    pub user: String,
    pub password: String,
    pub database: String,
    /// JSON seed for the memory backend
    pub seed_file: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            backend: GraphBackend::Neo4j,
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: "password".to_string(),
            database: "neo4j".to_string(),
            seed_file: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VectorBackend {
    Pinecone,
    Memory,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorConfig {
    pub backend: VectorBackend,
    pub api_key: String,
    pub index: String,
    /// Data-plane host; resolved through the control plane when absent
    pub host: Option<String>,
    pub namespace: Option<String>,
    pub control_plane_url: String,
    /// Snapshot file for the memory backend
    pub snapshot_path: Option<PathBuf>,
    pub timeout_secs: u64,
}

impl Default for VectorConfig {
    fn default() -> Self {
        Self {
            backend: VectorBackend::Pinecone,
            api_key: String::new(),
            index: "onboarding-policies".to_string(),
            host: None,
            namespace: None,
            control_plane_url: "https://api.pinecone.io".to_string(),
            snapshot_path: None,
            timeout_secs: 10,
        }
    }
}

/// Configuration for the embedding gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// The LLM provider to use
    pub provider: LLMProvider,
    /// Model name (e.g., "nomic-embed-text", "text-embedding-3-small")
    pub model: String,
    /// API Key (OpenAI only)
    pub api_key: Option<String>,
    /// API Base URL; provider default when absent
    pub api_base_url: Option<String>,
    /// Vector size produced by the mock provider
    pub dimensions: usize,
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::Ollama,
            model: "nomic-embed-text".to_string(),
            api_key: None,
            api_base_url: None,
            dimensions: 768,
            timeout_secs: 30,
        }
    }
}

/// Configuration for the generation client
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// The LLM provider to use
    pub provider: LLMProvider,
    /// Model name (e.g., "llama3", "gpt-4o")
    pub model: String,
    /// API Key (OpenAI only)
    pub api_key: Option<String>,
    /// API Base URL; provider default when absent
    pub api_base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::Ollama,
            model: "llama3".to_string(),
            api_key: None,
            api_base_url: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PromptConfig {
    pub employer: String,
    pub assistant_role: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            employer: "GlideCloud".to_string(),
            assistant_role: "HR assistant".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    /// Chunks retrieved per question
    pub top_k: usize,
    /// Bound on the user lookup and on the policy search
    pub lookup_timeout_secs: u64,
    /// Bound on the generation call
    pub generation_timeout_secs: u64,
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            lookup_timeout_secs: 30,
            generation_timeout_secs: 120,
        }
    }
}

impl RagConfig {
    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_secs)
    }

    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    pub documents_dir: PathBuf,
    /// Words per chunk
    pub chunk_size: usize,
    /// Words shared by consecutive chunks
    pub chunk_overlap: usize,
    /// Embedding requests in flight during ingestion
    pub concurrency: usize,
    /// Ingest `documents_dir` when the server starts
    pub on_startup: bool,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            documents_dir: PathBuf::from("data/documents"),
            chunk_size: 50,
            chunk_overlap: 25,
            concurrency: 4,
            on_startup: false,
        }
    }
}
