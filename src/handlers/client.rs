//! Client scoring handler

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};

use crate::models::ClientScoreResponse;
use crate::{AppError, AppResult, AppState};

/// Default probability, decision and explanation for one client
pub async fn score(
    State(state): State<AppState>,
    client_id: Result<Path<i64>, PathRejection>,
) -> AppResult<Json<ClientScoreResponse>> {
    let Path(client_id) = client_id
        .map_err(|e| AppError::ValidationError(format!("Invalid client id: {}", e.body_text())))?;

    let result = state.service.score_client(client_id)?;

    tracing::info!(
        "Client {} scored: probability={:.4} decision={:?}",
        client_id,
        result.probability,
        result.decision
    );

    Ok(Json(result.into()))
}
