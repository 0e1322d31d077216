//! OnboardingClient trait, the interface shared by embedded and remote modes

use crate::error::SdkResult;
use async_trait::async_trait;
use onboarding_buddy::http::models::{ChatRequest, ChatResponse, HealthStatus};
use onboarding_buddy::RosterEntry;

/// Implemented by:
/// - `EmbeddedClient`: in-process, no network
/// - `RemoteClient`: a running server over HTTP
#[async_trait]
pub trait OnboardingClient: Send + Sync {
    /// Ask a question on behalf of an employee
    async fn chat(&self, request: &ChatRequest) -> SdkResult<ChatResponse>;

    /// People holding a role, ascending by id; unknown roles list nobody
    async fn list_by_role(&self, role: &str) -> SdkResult<Vec<RosterEntry>>;

    /// Service health
    async fn health(&self) -> SdkResult<HealthStatus>;
}
