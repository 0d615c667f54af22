//! Runtime settings shared with the dashboard

use axum::{extract::State, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct SettingsResponse {
    /// Exact cutoff used by the decision engine
    pub threshold: f64,
    pub top_n: usize,
    pub feature_count: usize,
}

pub async fn get(State(state): State<AppState>) -> Json<SettingsResponse> {
    Json(SettingsResponse {
        threshold: state.service.threshold(),
        top_n: state.config.top_n,
        feature_count: state.service.feature_count(),
    })
}
