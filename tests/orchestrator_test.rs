use async_trait::async_trait;
use onboarding_buddy::graph::{GraphResult, MemoryDirectory};
use onboarding_buddy::llm::{GenerationClient, GenerationError, GenerationResult};
use onboarding_buddy::vector::VectorResult;
use onboarding_buddy::{
    AnswerOrchestrator, GraphContext, MetadataFilter, PolicySearch, RagError, RetrievedChunk, Stage, USER_NOT_FOUND,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SEED: &str = r#"{
    "employees": [
        { "id": "EMP001", "name": "Asha", "department": "Engineering", "manager": "MGR001",
          "mentor": "MEN001", "college": "NIT Trichy", "employment_type": "intern" }
    ],
    "managers": [{ "id": "MGR001", "name": "Ravi" }],
    "mentors": [{ "id": "MEN001", "name": "Meera" }]
}"#;

/// Returns a fixed list of chunks and remembers every call
struct FixedSearch {
    chunks: Vec<RetrievedChunk>,
    calls: AtomicUsize,
    last_filter: Mutex<Option<MetadataFilter>>,
}

impl FixedSearch {
    fn new(texts: &[&str]) -> Self {
        Self {
            chunks: texts.iter().map(|t| RetrievedChunk::new(*t, "leave.txt", "leave")).collect(),
            calls: AtomicUsize::new(0),
            last_filter: Mutex::new(None),
        }
    }
}

#[async_trait]
impl PolicySearch for FixedSearch {
    async fn search(&self, _query: &str, filter: Option<&MetadataFilter>) -> VectorResult<Vec<RetrievedChunk>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_filter.lock().unwrap() = filter.cloned();
        Ok(self.chunks.clone())
    }
}

/// Records prompts and answers with a canned reply
struct RecordingLlm {
    prompts: Mutex<Vec<String>>,
    reply: Result<String, String>,
    delay: Option<Duration>,
}

impl RecordingLlm {
    fn answering(reply: &str) -> Self {
        Self {
            prompts: Mutex::new(Vec::new()),
            reply: Ok(reply.to_string()),
            delay: None,
        }
    }

    fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl GenerationClient for RecordingLlm {
    async fn generate(&self, prompt: &str) -> GenerationResult<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.reply.clone().map_err(GenerationError::ApiError)
    }
}

fn directory() -> Arc<dyn GraphContext> {
    Arc::new(MemoryDirectory::from_json(SEED).unwrap())
}

#[tokio::test]
async fn test_unknown_user_makes_no_downstream_calls() {
    let search = Arc::new(FixedSearch::new(&["Leave is 20 days."]));
    let llm = Arc::new(RecordingLlm::answering("unused"));
    let orchestrator = AnswerOrchestrator::new(directory(), search.clone(), llm.clone());

    for debug in [false, true] {
        let result = orchestrator.answer_question("EMP999", "How many leaves?", debug).await.unwrap();
        assert_eq!(result.answer, USER_NOT_FOUND);
        assert_eq!(result.debug_context, None);
    }
    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    assert_eq!(llm.calls(), 0);
}

#[tokio::test]
async fn test_known_user_without_debug() {
    let search = Arc::new(FixedSearch::new(&["Interns get 1 leave day per month.", "Leave needs manager approval."]));
    let llm = Arc::new(RecordingLlm::answering("You get one day per month."));
    let orchestrator = AnswerOrchestrator::new(directory(), search.clone(), llm.clone());

    let result = orchestrator.answer_question("EMP001", "How many leaves do I get?", false).await.unwrap();
    assert_eq!(result.answer, "You get one day per month.");
    assert_eq!(result.debug_context, None);
    assert_eq!(search.calls.load(Ordering::SeqCst), 1);
    assert_eq!(*search.last_filter.lock().unwrap(), None);

    let prompts = llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 1);
    let prompt = &prompts[0];
    assert!(prompt.starts_with("You are GlideCloud's HR assistant.\n"));
    assert!(prompt.contains("User role: intern\nUser name: Asha\nManager: Ravi\nMentor: Meera\n"));
    assert!(prompt.contains("Interns get 1 leave day per month.\n\nLeave needs manager approval."));
    assert!(prompt.ends_with("Question: How many leaves do I get?\n"));
}

#[tokio::test]
async fn test_full_time_employee_without_mentor_or_college() {
    let graph: Arc<dyn GraphContext> = Arc::new(
        MemoryDirectory::from_json(
            r#"{
                "employees": [
                    { "id": "EMP001", "name": "John Doe", "manager": "MGR001",
                      "mentor": null, "college": null, "employment_type": "full_time" }
                ],
                "managers": [{ "id": "MGR001", "name": "Alice" }]
            }"#,
        )
        .unwrap(),
    );
    let chunk = "Full-time employees get 20 days of paid leave per year.";
    let search = Arc::new(FixedSearch::new(&[chunk]));
    let llm = Arc::new(RecordingLlm::answering("You get 20 days of paid leave."));
    let orchestrator = AnswerOrchestrator::new(graph, search, llm.clone());

    let plain = orchestrator.answer_question("EMP001", "How many leave days do I get?", false).await.unwrap();
    assert!(plain.answer.contains("20 days"));
    assert_eq!(plain.debug_context, None);

    let debug = orchestrator.answer_question("EMP001", "How many leave days do I get?", true).await.unwrap();
    assert!(debug.answer.contains("20 days"));
    assert_eq!(debug.debug_context, Some(vec![chunk.to_string()]));

    let prompts = llm.prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    for prompt in prompts.iter() {
        assert!(prompt.contains("User role: full_time\nUser name: John Doe\nManager: Alice\n"));
        assert!(prompt.contains("Mentor: not provided\n"));
        assert!(prompt.contains("College: not provided\n"));
        assert!(prompt.contains(chunk));
    }
}

#[tokio::test]
async fn test_debug_context_matches_chunks_in_order() {
    let texts = ["first chunk", "second chunk", "third chunk"];
    let search = Arc::new(FixedSearch::new(&texts));
    let llm = Arc::new(RecordingLlm::answering("answer"));
    let orchestrator = AnswerOrchestrator::new(directory(), search, llm);

    let result = orchestrator.answer_question("EMP001", "What is the policy?", true).await.unwrap();
    assert_eq!(result.debug_context, Some(texts.iter().map(|t| t.to_string()).collect()));
}

#[tokio::test]
async fn test_zero_chunks_still_generates() {
    let search = Arc::new(FixedSearch::new(&[]));
    let llm = Arc::new(RecordingLlm::answering("I could not find that in the policy."));
    let orchestrator = AnswerOrchestrator::new(directory(), search, llm.clone());

    let result = orchestrator.answer_question("EMP001", "Do we get free lunch?", true).await.unwrap();
    assert_eq!(result.answer, "I could not find that in the policy.");
    assert_eq!(result.debug_context, Some(Vec::new()));
    assert_eq!(llm.calls(), 1);
    assert!(llm.prompts.lock().unwrap()[0].contains("----------------\n\n----------------"));
}

#[tokio::test]
async fn test_filter_is_passed_to_search() {
    let search = Arc::new(FixedSearch::new(&["Stipend is paid monthly."]));
    let llm = Arc::new(RecordingLlm::answering("monthly"));
    let orchestrator = AnswerOrchestrator::new(directory(), search.clone(), llm);

    let filter = MetadataFilter::policy_type("stipend");
    orchestrator
        .answer_with_filter("EMP001", "When is the stipend paid?", Some(&filter), false)
        .await
        .unwrap();
    assert_eq!(*search.last_filter.lock().unwrap(), Some(filter));
}

#[tokio::test]
async fn test_generation_failure_propagates() {
    let search = Arc::new(FixedSearch::new(&["text"]));
    let llm = Arc::new(RecordingLlm {
        prompts: Mutex::new(Vec::new()),
        reply: Err("model not loaded".to_string()),
        delay: None,
    });
    let orchestrator = AnswerOrchestrator::new(directory(), search, llm);

    let err = orchestrator.answer_question("EMP001", "Q?", false).await.unwrap_err();
    assert!(matches!(err, RagError::Generation(GenerationError::ApiError(_))));
    assert!(!err.is_timeout());
}

#[tokio::test(start_paused = true)]
async fn test_generation_timeout() {
    let search = Arc::new(FixedSearch::new(&["text"]));
    let llm = Arc::new(RecordingLlm {
        prompts: Mutex::new(Vec::new()),
        reply: Ok("too late".to_string()),
        delay: Some(Duration::from_secs(121)),
    });
    let orchestrator = AnswerOrchestrator::new(directory(), search, llm);

    let err = orchestrator.answer_question("EMP001", "Q?", false).await.unwrap_err();
    assert!(err.is_timeout());
    assert!(matches!(
        err,
        RagError::Timeout { stage: Stage::Generation, after } if after == Duration::from_secs(120)
    ));
}

struct BrokenGraph;

#[async_trait]
impl GraphContext for BrokenGraph {
    async fn user_context(&self, _user_id: &str) -> GraphResult<Option<onboarding_buddy::UserContext>> {
        Err(onboarding_buddy::GraphError::NetworkError("connection refused".to_string()))
    }

    async fn roster(&self, _role: onboarding_buddy::Role) -> GraphResult<Vec<onboarding_buddy::RosterEntry>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_graph_failure_is_not_user_not_found() {
    let search = Arc::new(FixedSearch::new(&["text"]));
    let llm = Arc::new(RecordingLlm::answering("unused"));
    let orchestrator = AnswerOrchestrator::new(Arc::new(BrokenGraph), search.clone(), llm.clone());

    let err = orchestrator.answer_question("EMP001", "Q?", false).await.unwrap_err();
    assert!(matches!(err, RagError::Graph(_)));
    assert_eq!(search.calls.load(Ordering::SeqCst), 0);
    assert_eq!(llm.calls(), 0);
}
