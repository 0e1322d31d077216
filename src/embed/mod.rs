//! Embedding gateway
//!
//! Turns arbitrary text into a fixed-length vector by calling an external
//! embedding model. Results are never cached and failed calls are never retried.

pub mod client;

use async_trait::async_trait;
use thiserror::Error;

pub use client::{mock_embedding, EmbeddingClient};

/// Embed errors
#[derive(Error, Debug)]
pub enum EmbedError {
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

pub type EmbedResult<T> = Result<T, EmbedError>;

impl EmbedError {
    pub(crate) fn from_transport(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            EmbedError::Timeout(e.to_string())
        } else {
            EmbedError::NetworkError(e.to_string())
        }
    }
}

/// Produces an embedding for a piece of text.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> EmbedResult<Vec<f32>>;
}
