//! Answer orchestration
//!
//! user lookup → policy search → grounded prompt → generation → response

pub mod orchestrator;
pub mod prompt;

use serde::{Deserialize, Serialize};

pub use orchestrator::{AnswerOrchestrator, OrchestratorConfig};
pub use prompt::{PromptTemplate, ABSENT};

/// Answer returned when the user id resolves to nobody
pub const USER_NOT_FOUND: &str = "User not found.";

/// Outcome of one question
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerResult {
    pub answer: String,
    /// Raw text of every chunk placed in the prompt, only when debug was requested
    pub debug_context: Option<Vec<String>>,
}

impl AnswerResult {
    pub fn user_not_found() -> Self {
        Self {
            answer: USER_NOT_FOUND.to_string(),
            debug_context: None,
        }
    }

    pub fn is_user_not_found(&self) -> bool {
        self.answer == USER_NOT_FOUND && self.debug_context.is_none()
    }
}
