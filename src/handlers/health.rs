//! Health check handler

use axum::{extract::State, Json};
use serde::Serialize;
use serde_json::{json, Value};

use crate::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
    timestamp: i64,
    model_sha256: Option<String>,
    clients: usize,
}

/// Liveness message kept for dashboard compatibility
pub async fn root() -> Json<Value> {
    Json(json!({ "message": "API is running!" }))
}

pub async fn check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: chrono::Utc::now().timestamp(),
        model_sha256: state.service.model_digest().map(str::to_string),
        clients: state.service.client_count(),
    })
}
