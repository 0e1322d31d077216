//! Embedding client for the supported LLM providers

use crate::config::EmbeddingConfig;
use crate::embed::{Embedder, EmbedError, EmbedResult};
use crate::llm::LLMProvider;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Client for interacting with LLM APIs to generate embeddings
pub struct EmbeddingClient {
    client: Client,
    provider: LLMProvider,
    model: String,
    api_key: Option<String>,
    api_base_url: String,
    dimensions: usize,
}

impl EmbeddingClient {
    /// Create a new embedding client based on configuration
    pub fn new(config: &EmbeddingConfig) -> EmbedResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbedError::ConfigError(e.to_string()))?;

        if config.provider == LLMProvider::OpenAI && config.api_key.is_none() {
            return Err(EmbedError::ConfigError("OpenAI requires API key".to_string()));
        }
        if config.provider == LLMProvider::Mock && config.dimensions == 0 {
            return Err(EmbedError::ConfigError("mock embeddings need a non-zero dimension".to_string()));
        }

        let api_base_url = config
            .api_base_url
            .clone()
            .unwrap_or_else(|| config.provider.default_base_url().to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            provider: config.provider,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            api_base_url,
            dimensions: config.dimensions,
        })
    }

    async fn ollama_embedding(&self, text: &str) -> EmbedResult<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.api_base_url);
        let resp = self.client.post(&url)
            .json(&OllamaRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(EmbedError::from_transport)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(EmbedError::ApiError(format!("Ollama returned {}: {}", status, error_text)));
        }

        let result: OllamaResponse = resp.json().await.map_err(|e| EmbedError::SerializationError(e.to_string()))?;
        Ok(result.embedding)
    }

    async fn openai_embedding(&self, text: &str) -> EmbedResult<Vec<f32>> {
        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            input: [&'a str; 1],
            model: &'a str,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            data: Vec<OpenAIData>,
        }

        #[derive(Deserialize)]
        struct OpenAIData {
            embedding: Vec<f32>,
        }

        let api_key = self.api_key.as_ref().ok_or_else(|| EmbedError::ConfigError("OpenAI requires API key".to_string()))?;

        let url = format!("{}/embeddings", self.api_base_url);
        let resp = self.client.post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&OpenAIRequest {
                input: [text],
                model: &self.model,
            })
            .send()
            .await
            .map_err(EmbedError::from_transport)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await.unwrap_or_default();
            return Err(EmbedError::ApiError(format!("OpenAI returned {}: {}", status, error_text)));
        }

        let result: OpenAIResponse = resp.json().await.map_err(|e| EmbedError::SerializationError(e.to_string()))?;
        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbedError::SerializationError("OpenAI response has no data".to_string()))
    }
}

#[async_trait]
impl Embedder for EmbeddingClient {
    async fn embed(&self, text: &str) -> EmbedResult<Vec<f32>> {
        let embedding = match self.provider {
            LLMProvider::Ollama => self.ollama_embedding(text).await?,
            LLMProvider::OpenAI => self.openai_embedding(text).await?,
            LLMProvider::Mock => return Ok(mock_embedding(text, self.dimensions)),
        };

        if embedding.is_empty() {
            return Err(EmbedError::SerializationError(format!("{:?} returned an empty embedding", self.provider)));
        }
        Ok(embedding)
    }
}

/// Hashed bag-of-words embedding, L2-normalized.
///
/// Identical texts map to identical vectors and texts sharing words land
/// close together, which is enough for offline runs of the whole pipeline.
pub fn mock_embedding(text: &str, dimensions: usize) -> Vec<f32> {
    let mut v = vec![0f32; dimensions];
    if dimensions == 0 {
        return v;
    }

    for token in text.split_whitespace() {
        let token = token.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
        if token.is_empty() {
            continue;
        }
        let digest = Sha256::digest(token.as_bytes());
        let mut bucket = [0u8; 8];
        bucket.copy_from_slice(&digest[..8]);
        let idx = (u64::from_le_bytes(bucket) % dimensions as u64) as usize;
        v[idx] += 1.0;
    }

    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in &mut v {
            *x /= norm;
        }
    }
    v
}
