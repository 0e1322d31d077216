//! Answer orchestrator

use super::prompt::{policy_block, PromptTemplate};
use super::AnswerResult;
use crate::config::{PromptConfig, RagConfig};
use crate::error::{RagError, RagResult, Stage};
use crate::graph::GraphContext;
use crate::llm::GenerationClient;
use crate::vector::{MetadataFilter, PolicySearch};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Per-stage time bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrchestratorConfig {
    pub lookup_timeout: Duration,
    pub generation_timeout: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self::from(&RagConfig::default())
    }
}

impl From<&RagConfig> for OrchestratorConfig {
    fn from(config: &RagConfig) -> Self {
        Self {
            lookup_timeout: config.lookup_timeout(),
            generation_timeout: config.generation_timeout(),
        }
    }
}

/// Answers onboarding questions grounded in retrieved policy text.
///
/// Holds no per-request state; one instance serves concurrent requests.
pub struct AnswerOrchestrator {
    graph: Arc<dyn GraphContext>,
    search: Arc<dyn PolicySearch>,
    llm: Arc<dyn GenerationClient>,
    template: PromptTemplate,
    config: OrchestratorConfig,
}

impl AnswerOrchestrator {
    pub fn new(graph: Arc<dyn GraphContext>, search: Arc<dyn PolicySearch>, llm: Arc<dyn GenerationClient>) -> Self {
        Self {
            graph,
            search,
            llm,
            template: PromptTemplate::default(),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    pub fn with_prompt_config(self, config: &PromptConfig) -> Self {
        self.with_template(PromptTemplate::from(config))
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn graph(&self) -> &Arc<dyn GraphContext> {
        &self.graph
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    /// Answer with no metadata filter on retrieval
    pub async fn answer_question(&self, user_id: &str, question: &str, debug: bool) -> RagResult<AnswerResult> {
        self.answer_with_filter(user_id, question, None, debug).await
    }

    /// Answer, restricting retrieval to chunks matching `filter`.
    ///
    /// An unknown user is answered with the not-found message and never
    /// reaches search or generation.
    pub async fn answer_with_filter(
        &self,
        user_id: &str,
        question: &str,
        filter: Option<&MetadataFilter>,
        debug: bool,
    ) -> RagResult<AnswerResult> {
        let lookup = self.config.lookup_timeout;

        let Some(user) = bounded(Stage::UserLookup, lookup, self.graph.user_context(user_id)).await? else {
            info!(user_id, "unknown user");
            return Ok(AnswerResult::user_not_found());
        };

        let chunks = bounded(Stage::Search, lookup, self.search.search(question, filter)).await?;
        debug!(user_id, chunks = chunks.len(), "retrieved policy chunks");

        let prompt = self.template.render(&user, &policy_block(&chunks), question);
        let answer = bounded(Stage::Generation, self.config.generation_timeout, self.llm.generate(&prompt)).await?;
        info!(user_id, chunks = chunks.len(), answer_len = answer.len(), "answered question");

        let debug_context = debug.then(|| chunks.into_iter().map(|c| c.text).collect());
        Ok(AnswerResult { answer, debug_context })
    }
}

async fn bounded<T, E, F>(stage: Stage, after: Duration, fut: F) -> RagResult<T>
where
    F: Future<Output = Result<T, E>>,
    RagError: From<E>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result.map_err(RagError::from),
        Err(_) => Err(RagError::Timeout { stage, after }),
    }
}
