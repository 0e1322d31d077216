//! HTTP server

use super::handler::{chat_handler, health_handler, list_by_role_handler, AppState};
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// All routes with tracing and permissive CORS
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(health_handler))
        .route("/chat", post(chat_handler))
        .route("/list_by_role", get(list_by_role_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub struct HttpServer {
    state: AppState,
    address: String,
    port: u16,
}

impl HttpServer {
    pub fn new(state: AppState, address: impl Into<String>, port: u16) -> Self {
        Self {
            state,
            address: address.into(),
            port,
        }
    }

    /// Bind and serve until the process is stopped
    pub async fn start(&self) -> std::io::Result<()> {
        let addr = format!("{}:{}", self.address, self.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        info!("Onboarding API listening on http://{}", listener.local_addr()?);
        axum::serve(listener, router(self.state.clone())).await
    }
}
