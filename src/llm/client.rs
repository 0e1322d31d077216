//! Generation client for the supported LLM providers

use crate::config::GenerationConfig;
use crate::llm::{GenerationClient, GenerationError, GenerationResult, LLMProvider};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Client for text completions against a single provider and model
pub struct LlmClient {
    client: Client,
    provider: LLMProvider,
    model: String,
    api_key: Option<String>,
    api_base_url: String,
}

impl LlmClient {
    /// Create a new generation client based on configuration
    pub fn new(config: &GenerationConfig) -> GenerationResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| GenerationError::ConfigError(e.to_string()))?;

        if config.provider == LLMProvider::OpenAI && config.api_key.is_none() {
            return Err(GenerationError::ConfigError("OpenAI requires API key".to_string()));
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
        })
    }

    async fn ollama_generate(&self, prompt: &str) -> GenerationResult<String> {
        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            prompt: &'a str,
            stream: bool,
        }

        #[derive(Deserialize)]
        struct Response {
            response: String,
        }

        let url = format!("{}/api/generate", self.api_base_url);
        let resp = self.client.post(&url)
            .json(&Request {
                model: &self.model,
                prompt,
                stream: false,
            })
            .send()
            .await
            .map_err(GenerationError::from_transport)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError(format!("Ollama returned {}: {}", status, text)));
        }

        let result: Response = resp.json().await.map_err(|e| GenerationError::SerializationError(e.to_string()))?;
        Ok(result.response)
    }

    async fn openai_chat(&self, prompt: &str) -> GenerationResult<String> {
        #[derive(Serialize)]
        struct Message<'a> {
            role: &'a str,
            content: &'a str,
        }

        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            messages: Vec<Message<'a>>,
        }

        #[derive(Deserialize)]
        struct Response {
            choices: Vec<Choice>,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: MessageContent,
        }

        #[derive(Deserialize)]
        struct MessageContent {
            content: String,
        }

        let api_key = self.api_key.as_ref().ok_or_else(|| GenerationError::ConfigError("OpenAI requires API key".to_string()))?;

        let url = format!("{}/chat/completions", self.api_base_url);
        let resp = self.client.post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&Request {
                model: &self.model,
                messages: vec![Message { role: "user", content: prompt }],
            })
            .send()
            .await
            .map_err(GenerationError::from_transport)?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(GenerationError::ApiError(format!("OpenAI returned {}: {}", status, text)));
        }

        let result: Response = resp.json().await.map_err(|e| GenerationError::SerializationError(e.to_string()))?;
        result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| GenerationError::SerializationError("OpenAI response has no choices".to_string()))
    }

    fn mock_generate(&self, prompt: &str) -> String {
        let question = prompt
            .lines()
            .rev()
            .find_map(|line| line.strip_prefix("Question: "))
            .unwrap_or("");
        format!("[{}] grounded answer for: {}", self.model, question.trim())
    }
}

#[async_trait]
impl GenerationClient for LlmClient {
    async fn generate(&self, prompt: &str) -> GenerationResult<String> {
        debug!(provider = ?self.provider, model = %self.model, prompt_len = prompt.len(), "requesting completion");
        match self.provider {
            LLMProvider::Ollama => self.ollama_generate(prompt).await,
            LLMProvider::OpenAI => self.openai_chat(prompt).await,
            LLMProvider::Mock => Ok(self.mock_generate(prompt)),
        }
    }
}
