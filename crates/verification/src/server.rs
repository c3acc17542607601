//! HTTP server for the verification service.

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use incident::health::{accepted, health_handler};
use incident::RemediationResult;

use crate::verifier::Verifier;

/// Server state shared across handlers.
pub struct ServerState {
    pub verifier: Arc<Verifier>,
}

/// Build the HTTP router.
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/log", post(log_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Accept a remediation result and verify it in the background.
async fn log_handler(
    State(state): State<Arc<ServerState>>,
    Json(result): Json<RemediationResult>,
) -> impl IntoResponse {
    info!(
        action = %result.plan.action,
        status = result.status.as_str(),
        "Received remediation result"
    );

    let verifier = Arc::clone(&state.verifier);
    tokio::spawn(async move {
        verifier.run(result).await;
    });

    accepted()
}
