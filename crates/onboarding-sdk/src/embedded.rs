//! EmbeddedClient, the in-process client

use async_trait::async_trait;
use std::sync::Arc;

use crate::client::OnboardingClient;
use crate::error::SdkResult;
use onboarding_buddy::http::models::{ChatRequest, ChatResponse, HealthStatus};
use onboarding_buddy::{AnswerOrchestrator, MetadataFilter, RosterEntry, Services};

/// Calls the orchestrator directly; no server involved.
pub struct EmbeddedClient {
    orchestrator: Arc<AnswerOrchestrator>,
}

impl EmbeddedClient {
    pub fn new(orchestrator: Arc<AnswerOrchestrator>) -> Self {
        Self { orchestrator }
    }

    pub fn from_services(services: &Services) -> Self {
        Self::new(services.orchestrator.clone())
    }

    pub fn orchestrator(&self) -> &Arc<AnswerOrchestrator> {
        &self.orchestrator
    }
}

#[async_trait]
impl OnboardingClient for EmbeddedClient {
    async fn chat(&self, request: &ChatRequest) -> SdkResult<ChatResponse> {
        let filter = request
            .policy_type
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(MetadataFilter::policy_type);
        let result = self
            .orchestrator
            .answer_with_filter(&request.user_id, &request.question, filter.as_ref(), request.debug)
            .await?;
        Ok(ChatResponse {
            answer: result.answer,
            context: result.debug_context,
        })
    }

    async fn list_by_role(&self, role: &str) -> SdkResult<Vec<RosterEntry>> {
        Ok(self.orchestrator.graph().list_by_role(role).await?)
    }

    async fn health(&self) -> SdkResult<HealthStatus> {
        Ok(HealthStatus::ok())
    }
}
