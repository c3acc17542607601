//! HTTP server for the remediation service.

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
use incident::RemediationPlan;

use crate::executor::Executor;

/// Server state shared across handlers.
pub struct ServerState {
    pub executor: Arc<Executor>,
}

/// Build the HTTP router.
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/remediate", post(remediate_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Accept a plan and execute it in the background.
async fn remediate_handler(
    State(state): State<Arc<ServerState>>,
    Json(plan): Json<RemediationPlan>,
) -> impl IntoResponse {
    info!(action = %plan.action, target = %plan.target_label(), "Received remediation plan");

    let executor = Arc::clone(&state.executor);
    tokio::spawn(async move {
        executor.run(plan).await;
    });

    accepted()
}
