//! Handlers every service mounts.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

/// Health check response.
#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

/// Acknowledgment returned before background work starts.
#[derive(Debug, Serialize)]
pub struct AckResponse {
    pub status: &'static str,
}

/// Liveness handler.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// `202 {"status": "accepted"}`.
#[must_use]
pub fn accepted() -> (StatusCode, Json<AckResponse>) {
    (StatusCode::ACCEPTED, Json(AckResponse { status: "accepted" }))
}
