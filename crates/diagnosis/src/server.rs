//! HTTP server for the diagnosis service.
//!
//! Provides endpoints for:
//! - Health checks
//! - Receiving Alertmanager webhooks
//! - Receiving Slack interactive callbacks (the approval gate)
//!
//! Both webhooks acknowledge before any diagnosis or hand-off work starts.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use incident::health::health_handler;
use incident::AlertBatch;

use crate::approval::{ApprovalGate, InteractionPayload};
use crate::orchestrator::Diagnoser;

/// Server state shared across handlers.
pub struct ServerState {
    pub diagnoser: Arc<Diagnoser>,
    pub gate: Arc<ApprovalGate>,
}

/// Build the HTTP router.
pub fn build_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/alert", post(alert_handler))
        .route("/slack-interactive", post(interactive_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ============================================================================
// Request/Response types
// ============================================================================

/// Response to an alert webhook.
#[derive(Debug, Serialize)]
pub struct AlertResponse {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alerts: Option<usize>,
}

/// Form body of an interactive callback.
#[derive(Debug, Deserialize)]
pub struct InteractiveForm {
    pub payload: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// Accept an Alertmanager batch and diagnose it in the background.
async fn alert_handler(
    State(state): State<Arc<ServerState>>,
    Json(batch): Json<AlertBatch>,
) -> impl IntoResponse {
    if !batch.is_firing() {
        info!(status = %batch.status, "Ignoring non-firing alert batch");
        return (
            StatusCode::OK,
            Json(AlertResponse {
                status: "ignored",
                alerts: None,
            }),
        );
    }

    let count = batch.alerts.len();
    info!(count, group_key = %batch.group_key, "Received firing alert batch");

    let diagnoser = Arc::clone(&state.diagnoser);
    tokio::spawn(async move {
        diagnoser.process_batch(batch).await;
    });

    (
        StatusCode::ACCEPTED,
        Json(AlertResponse {
            status: "accepted",
            alerts: Some(count),
        }),
    )
}

/// Acknowledge a button click and resolve it in the background.
async fn interactive_handler(
    State(state): State<Arc<ServerState>>,
    Form(form): Form<InteractiveForm>,
) -> Response {
    let payload: InteractionPayload = match serde_json::from_str(&form.payload) {
        Ok(payload) => payload,
        Err(e) => {
            warn!(error = %e, "Malformed interaction payload");
            return (StatusCode::BAD_REQUEST, format!("invalid payload: {e}")).into_response();
        }
    };

    let gate = Arc::clone(&state.gate);
    tokio::spawn(async move {
        gate.handle(&payload).await;
    });

    StatusCode::OK.into_response()
}
