use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use onboarding_buddy::config::{EmbeddingConfig, GenerationConfig};
use onboarding_buddy::embed::{Embedder, EmbeddingClient};
use onboarding_buddy::graph::MemoryDirectory;
use onboarding_buddy::http::{router, AppState};
use onboarding_buddy::llm::{GenerationClient, GenerationResult, LLMProvider, LlmClient};
use onboarding_buddy::rag::OrchestratorConfig;
use onboarding_buddy::vector::{ChunkRecord, MemoryVectorStore, SemanticSearch, VectorStore};
use onboarding_buddy::{AnswerOrchestrator, RetrievedChunk};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const SEED: &str = r#"{
    "employees": [
        { "id": "EMP003", "name": "Chitra", "employment_type": "intern" },
        { "id": "EMP001", "name": "Asha", "department": "Engineering", "manager": "MGR001",
          "employment_type": "intern" },
        { "id": "EMP002", "name": "Bala", "employment_type": "full_time" }
    ],
    "managers": [{ "id": "MGR001", "name": "Ravi" }],
    "mentors": []
}"#;

const POLICIES: [(&str, &str); 3] = [
    ("leave", "Interns receive one paid leave day for every month of the internship."),
    ("leave", "Leave requests must be approved by the reporting manager in advance."),
    ("stipend", "The internship stipend is credited on the last working day of each month."),
];

fn embedding_config() -> EmbeddingConfig {
    EmbeddingConfig {
        provider: LLMProvider::Mock,
        dimensions: 128,
        ..EmbeddingConfig::default()
    }
}

async fn app_with_llm(llm: Arc<dyn GenerationClient>, config: OrchestratorConfig) -> axum::Router {
    let embedder: Arc<dyn Embedder> = Arc::new(EmbeddingClient::new(&embedding_config()).unwrap());
    let store = Arc::new(MemoryVectorStore::new());

    let mut records = Vec::new();
    for (i, (policy_type, text)) in POLICIES.iter().enumerate() {
        records.push(ChunkRecord {
            id: format!("chunk-{}", i),
            values: embedder.embed(text).await.unwrap(),
            chunk: RetrievedChunk::new(*text, format!("{}.txt", policy_type), *policy_type),
        });
    }
    store.upsert(records).await.unwrap();

    let graph = Arc::new(MemoryDirectory::from_json(SEED).unwrap());
    let search = Arc::new(SemanticSearch::new(embedder, store));
    let orchestrator = AnswerOrchestrator::new(graph, search, llm).with_config(config);
    router(AppState::new(Arc::new(orchestrator)))
}

async fn app() -> axum::Router {
    let llm = LlmClient::new(&GenerationConfig {
        provider: LLMProvider::Mock,
        model: "mock".to_string(),
        ..GenerationConfig::default()
    })
    .unwrap();
    app_with_llm(Arc::new(llm), OrchestratorConfig::default()).await
}

async fn send(app: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn post_chat(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/chat")
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(app().await, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_chat_without_debug_has_no_context_key() {
    let (status, body) = send(
        app().await,
        post_chat(json!({ "user_id": "EMP001", "question": "How many leave days do interns get?" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "[mock] grounded answer for: How many leave days do interns get?");
    assert!(body.get("context").is_none());
}

#[tokio::test]
async fn test_chat_with_debug_returns_context() {
    let (status, body) = send(
        app().await,
        post_chat(json!({ "userId": "EMP001", "question": "When is the stipend paid?", "debug": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let context = body["context"].as_array().unwrap();
    assert_eq!(context.len(), POLICIES.len());
    assert_eq!(context[0], POLICIES[2].1);
}

#[tokio::test]
async fn test_chat_policy_type_filter() {
    let (status, body) = send(
        app().await,
        post_chat(json!({
            "user_id": "EMP001",
            "question": "When is the stipend paid?",
            "debug": true,
            "policy_type": "leave"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let context = body["context"].as_array().unwrap();
    assert_eq!(context.len(), 2);
    assert!(context.iter().all(|c| c.as_str().unwrap().contains("leave") || c.as_str().unwrap().contains("Leave")));
}

#[tokio::test]
async fn test_chat_unknown_user() {
    let (status, body) = send(
        app().await,
        post_chat(json!({ "user_id": "EMP999", "question": "Hi?", "debug": true })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["answer"], "User not found.");
    assert_eq!(body.get("context"), None);
}

#[tokio::test]
async fn test_chat_missing_field_is_unprocessable() {
    let (status, _) = send(app().await, post_chat(json!({ "question": "Who am I?" }))).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_list_by_role_sorted() {
    let (status, body) = send(app().await, get("/list_by_role?role=intern")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "items": [{ "id": "EMP001", "name": "Asha" }, { "id": "EMP003", "name": "Chitra" }] })
    );

    let (_, body) = send(app().await, get("/list_by_role?role=manager")).await;
    assert_eq!(body, json!({ "items": [{ "id": "MGR001", "name": "Ravi" }] }));
}

#[tokio::test]
async fn test_list_by_role_unknown_and_missing() {
    for role in ["Intern", "ceo", ""] {
        let (status, body) = send(app().await, get(&format!("/list_by_role?role={}", role))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "items": [] }));
    }

    let (status, _) = send(app().await, get("/list_by_role")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

struct FailingLlm;

#[async_trait]
impl GenerationClient for FailingLlm {
    async fn generate(&self, _prompt: &str) -> GenerationResult<String> {
        Err(onboarding_buddy::llm::GenerationError::NetworkError("connection refused".to_string()))
    }
}

struct StalledLlm;

#[async_trait]
impl GenerationClient for StalledLlm {
    async fn generate(&self, _prompt: &str) -> GenerationResult<String> {
        tokio::time::sleep(Duration::from_secs(5)).await;
        Ok("late".to_string())
    }
}

#[tokio::test]
async fn test_upstream_failure_is_500() {
    let app = app_with_llm(Arc::new(FailingLlm), OrchestratorConfig::default()).await;
    let (status, body) = send(app, post_chat(json!({ "user_id": "EMP001", "question": "Q?" }))).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("connection refused"));
}

#[tokio::test]
async fn test_upstream_timeout_is_504() {
    let config = OrchestratorConfig {
        lookup_timeout: Duration::from_secs(5),
        generation_timeout: Duration::from_millis(50),
    };
    let app = app_with_llm(Arc::new(StalledLlm), config).await;
    let (status, body) = send(app, post_chat(json!({ "user_id": "EMP001", "question": "Q?" }))).await;
    assert_eq!(status, StatusCode::GATEWAY_TIMEOUT);
    assert!(body["error"].as_str().unwrap().contains("generation timed out"));
}
