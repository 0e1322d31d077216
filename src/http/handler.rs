//! HTTP handlers

use super::models::{ChatRequest, ChatResponse, ErrorResponse, HealthStatus, RosterQuery, RosterResponse};
use crate::error::RagError;
use crate::graph::GraphError;
use crate::rag::AnswerOrchestrator;
use crate::vector::MetadataFilter;
use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{debug, error};

/// Shared by every request; clients inside are built once at startup
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<AnswerOrchestrator>,
}

impl AppState {
    pub fn new(orchestrator: Arc<AnswerOrchestrator>) -> Self {
        Self { orchestrator }
    }
}

/// Upstream failure rendered as `{"error": ...}`
#[derive(Debug)]
pub enum ApiError {
    Rag(RagError),
    Graph(GraphError),
}

impl From<RagError> for ApiError {
    fn from(e: RagError) -> Self {
        ApiError::Rag(e)
    }
}

impl From<GraphError> for ApiError {
    fn from(e: GraphError) -> Self {
        ApiError::Graph(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Rag(e) if e.is_timeout() => (StatusCode::GATEWAY_TIMEOUT, e.to_string()),
            ApiError::Rag(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            ApiError::Graph(GraphError::Timeout(msg)) => {
                (StatusCode::GATEWAY_TIMEOUT, format!("Graph lookup timed out: {}", msg))
            }
            ApiError::Graph(e) => (StatusCode::INTERNAL_SERVER_ERROR, format!("Graph lookup failed: {}", e)),
        };
        error!(status = status.as_u16(), error = %message, "request failed");
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

pub async fn health_handler() -> Json<HealthStatus> {
    Json(HealthStatus::ok())
}

pub async fn chat_handler(
    State(state): State<AppState>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, ApiError> {
    debug!(user_id = %req.user_id, debug = req.debug, "chat request");
    let filter = req
        .policy_type
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(MetadataFilter::policy_type);

    let result = state
        .orchestrator
        .answer_with_filter(&req.user_id, &req.question, filter.as_ref(), req.debug)
        .await?;

    Ok(Json(ChatResponse {
        answer: result.answer,
        context: if req.debug { result.debug_context } else { None },
    }))
}

pub async fn list_by_role_handler(
    State(state): State<AppState>,
    Query(query): Query<RosterQuery>,
) -> Result<Json<RosterResponse>, ApiError> {
    let items = state.orchestrator.graph().list_by_role(&query.role).await?;
    debug!(role = %query.role, items = items.len(), "roster request");
    Ok(Json(RosterResponse { items }))
}
