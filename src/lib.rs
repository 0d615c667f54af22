//! Credit Scoring API
//!
//! Serves default probabilities for loan applicants together with the
//! per-feature reasoning behind each score.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      CREDIT SCORING API                      │
//! ├──────────────────────────────────────────────────────────────┤
//! │   HTTP (Axum) ──► ScoringService                             │
//! │                     ├── PopulationStore   (clients CSV)      │
//! │                     ├── TreePipeline      (model JSON)       │
//! │                     ├── DecisionThreshold (config)           │
//! │                     ├── TreeSHAP explainer                   │
//! │                     ├── FeatureRanking    (importance CSV)   │
//! │                     └── DescriptionCatalog (columns CSV)     │
//! └──────────────────────────────────────────────────────────────┘
//! ```

pub mod classifier;
pub mod config;
pub mod error;
pub mod explain;
pub mod handlers;
pub mod models;
pub mod service;

use std::sync::Arc;

use axum::{routing::get, Router};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use error::{AppError, AppResult, ScoringError};
pub use service::ScoringService;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<ScoringService>,
    pub config: config::Config,
}

/// Create the main router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::health::root))
        .route("/health", get(handlers::health::check))
        .route("/config", get(handlers::settings::get))
        // Scoring
        .route("/client/:client_id", get(handlers::client::score))
        // Exploration
        .route("/feature-importance", get(handlers::features::importance))
        .route("/feature-data", get(handlers::features::data))
        .route("/column-description", get(handlers::features::descriptions))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}
