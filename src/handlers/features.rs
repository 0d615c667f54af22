//! Feature handlers - global importance, population data, descriptions

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::{FeatureDescription, FeatureImportanceEntry};
use crate::service::FeatureData;
use crate::{AppError, AppResult, AppState};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct TopNQuery {
    #[validate(range(min = 1, max = 1000))]
    pub top_n: Option<usize>,
}

impl TopNQuery {
    fn resolve(query: Result<Query<TopNQuery>, QueryRejection>, default: usize) -> AppResult<usize> {
        let Query(query) = query
            .map_err(|e| AppError::ValidationError(format!("Invalid query: {}", e.body_text())))?;
        query.validate()?;
        Ok(query.top_n.unwrap_or(default))
    }
}

#[derive(Debug, Serialize)]
pub struct FeatureImportanceResponse {
    pub top_n: usize,
    #[serde(rename = "top_10_feature_importance")]
    pub feature_importance: Vec<FeatureImportanceEntry>,
}

#[derive(Debug, Serialize)]
pub struct ColumnDescriptionResponse {
    pub columns_description: Vec<FeatureDescription>,
}

/// Top-N global feature importances
pub async fn importance(
    State(state): State<AppState>,
    query: Result<Query<TopNQuery>, QueryRejection>,
) -> AppResult<Json<FeatureImportanceResponse>> {
    let top_n = TopNQuery::resolve(query, state.config.top_n)?;
    let entries = state.service.feature_importance(top_n).to_vec();

    Ok(Json(FeatureImportanceResponse {
        top_n: entries.len(),
        feature_importance: entries,
    }))
}

/// Population values of the top-N features, with the label column
pub async fn data(
    State(state): State<AppState>,
    query: Result<Query<TopNQuery>, QueryRejection>,
) -> AppResult<Json<FeatureData>> {
    let top_n = TopNQuery::resolve(query, state.config.top_n)?;
    let data = state.service.feature_data(top_n);

    tracing::debug!("Feature data: {} features x {} clients", data.top_features.len(), data.target.len());

    Ok(Json(data))
}

/// Human-readable descriptions of known features
pub async fn descriptions(State(state): State<AppState>) -> Json<ColumnDescriptionResponse> {
    Json(ColumnDescriptionResponse {
        columns_description: state.service.feature_descriptions().to_vec(),
    })
}
