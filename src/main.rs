//! Credit Scoring API server

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use credit_scoring::{config::Config, create_router, AppState, ScoringService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();

    let config = Config::from_env()
        .and_then(|config| config.validate().map(|_| config))
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "credit_scoring=debug,tower_http=debug".into());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|f| f == "json")
        .unwrap_or_else(|_| config.is_production());
    let registry = tracing_subscriber::registry().with(filter);
    if json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }

    tracing::info!("Credit Scoring API starting ({})...", config.environment);
    tracing::info!("Decision threshold: {}", config.decision_threshold);

    // Artifacts load once; any failure stops the process before it serves.
    let service = ScoringService::load(&config).context("Failed to load scoring artifacts")?;

    let state = AppState {
        service: Arc::new(service),
        config: config.clone(),
    };

    let app = create_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
