//! RemoteClient, the network client for a running server

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};

use crate::client::OnboardingClient;
use crate::error::{SdkError, SdkResult};
use onboarding_buddy::http::models::{ChatRequest, ChatResponse, ErrorResponse, HealthStatus, RosterResponse};
use onboarding_buddy::RosterEntry;

/// Uses `POST /chat`, `GET /list_by_role` and `GET /`.
pub struct RemoteClient {
    http_base_url: String,
    http_client: Client,
}

impl RemoteClient {
    /// # Example
    /// ```no_run
    /// # use onboarding_sdk::RemoteClient;
    /// let client = RemoteClient::new("http://localhost:8000");
    /// ```
    pub fn new(http_base_url: &str) -> Self {
        Self {
            http_base_url: http_base_url.trim_end_matches('/').to_string(),
            http_client: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.http_base_url
    }

    /// Decode a success body, or turn the error body into an `SdkError`
    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> SdkResult<T> {
        let status = response.status();
        if status.is_success() {
            let bytes = response.bytes().await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorResponse>(&text)
            .map(|e| e.error)
            .unwrap_or(text);
        match status {
            StatusCode::UNPROCESSABLE_ENTITY | StatusCode::BAD_REQUEST => Err(SdkError::Validation(message)),
            _ => Err(SdkError::Server {
                status: status.as_u16(),
                message,
            }),
        }
    }
}

#[async_trait]
impl OnboardingClient for RemoteClient {
    async fn chat(&self, request: &ChatRequest) -> SdkResult<ChatResponse> {
        let url = format!("{}/chat", self.http_base_url);
        let response = self.http_client.post(&url).json(request).send().await?;
        Self::decode(response).await
    }

    async fn list_by_role(&self, role: &str) -> SdkResult<Vec<RosterEntry>> {
        let url = Url::parse_with_params(&format!("{}/list_by_role", self.http_base_url), &[("role", role)])
            .map_err(|e| SdkError::ConnectionError(e.to_string()))?;
        let response = self.http_client.get(url).send().await?;
        let roster: RosterResponse = Self::decode(response).await?;
        Ok(roster.items)
    }

    async fn health(&self) -> SdkResult<HealthStatus> {
        let url = format!("{}/", self.http_base_url);
        let response = self
            .http_client
            .get(&url)
            .send()
            .await
            .map_err(|e| SdkError::ConnectionError(e.to_string()))?;
        Self::decode(response).await
    }
}
