use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use usage_service::{
    api::{self, AppState},
    config::AppConfig,
    insight::{GeminiClient, InsightEngine},
    observability,
};

#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let cfg = AppConfig::load()?;

    observability::init_metrics();

    let pool = PgPoolOptions::new()
        .max_connections(cfg.database.max_connections)
        .connect(&cfg.database.uri)
        .await?;

    // The generation client is constructed exactly once here and injected;
    // a missing API key surfaces per-request as a configuration error.
    let generator = Arc::new(GeminiClient::from_config(&cfg.insights));
    let engine = Arc::new(InsightEngine::new(
        generator,
        Duration::from_millis(cfg.insights.timeout_ms),
    ));

    let state = AppState::new(pool, engine, cfg.http.auth_bearer_token.clone());
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.http.bind_addr).await?;
    tracing::info!(addr = %cfg.http.bind_addr, "usage service listening");
    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
