//! Generation client
//!
//! Turns a fully composed prompt into a completion. One request per call,
//! no retries, no streaming.

pub mod client;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use client::LlmClient;

/// Generation errors
#[derive(Error, Debug)]
pub enum GenerationError {
    /// API error from LLM provider
    #[error("LLM API error: {0}")]
    ApiError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// The provider did not answer within the client timeout
    #[error("Request timed out: {0}")]
    Timeout(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),
}

pub type GenerationResult<T> = Result<T, GenerationError>;

impl GenerationError {
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            GenerationError::Timeout(e.to_string())
        } else {
            GenerationError::NetworkError(e.to_string())
        }
    }
}

/// LLM Provider options, shared by the embedding and generation clients
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LLMProvider {
    OpenAI,
    Ollama,
    /// Deterministic offline provider for local runs and tests
    Mock,
}

impl LLMProvider {
    /// Base URL used when the configuration does not name one
    pub fn default_base_url(&self) -> &'static str {
        match self {
            LLMProvider::OpenAI => "https://api.openai.com/v1",
            LLMProvider::Ollama => "http://localhost:11434",
            LLMProvider::Mock => "",
        }
    }
}

/// Produces a completion for a prompt.
#[async_trait]
pub trait GenerationClient: Send + Sync {
    async fn generate(&self, prompt: &str) -> GenerationResult<String>;
}
