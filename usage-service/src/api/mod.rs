//! HTTP boundary: owner-scoped reading CRUD, statistics/chart queries, and
//! the insight endpoint. Every failure path maps to a category-appropriate
//! message; raw internal error text never reaches the client.

pub mod insights;
pub mod readings;

use std::collections::HashMap;
use std::sync::Arc;

use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use sqlx::PgPool;
use tokio::sync::Mutex;
use usage_core::cache::ReadingCache;
use usage_core::db::StoreError;
use uuid::Uuid;

use crate::insight::{InsightEngine, InsightError};
use crate::observability;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub engine: Arc<InsightEngine>,
    pub auth_bearer_token: Option<String>,
    /// One two-phase cache per owner, lazily populated from the store.
    pub caches: Arc<Mutex<HashMap<Uuid, ReadingCache>>>,
}

impl AppState {
    pub fn new(pool: PgPool, engine: Arc<InsightEngine>, auth_bearer_token: Option<String>) -> Self {
        Self {
            pool,
            engine,
            auth_bearer_token,
            caches: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/users/:owner_id/readings",
            get(readings::list).post(readings::create),
        )
        .route(
            "/users/:owner_id/readings/:id",
            put(readings::update).delete(readings::remove),
        )
        .route("/users/:owner_id/statistics", get(readings::statistics))
        .route("/users/:owner_id/chart", get(readings::chart))
        .route("/insights", post(insights::generate))
        .route("/metrics", get(observability::render_metrics))
        .with_state(state)
}

#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("unauthorized: missing or invalid authorization header")]
    Unauthorized,
    #[error("reading not found")]
    NotFound,
    #[error("request timeout: insight generation took too long")]
    Timeout,
    #[error("server configuration error")]
    Configuration,
    #[error("internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Timeout => StatusCode::GATEWAY_TIMEOUT,
            ApiError::Configuration | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(_) => ApiError::NotFound,
            StoreError::Database(e) => {
                tracing::error!(error = %e, "reading store query failed");
                ApiError::Internal
            }
        }
    }
}

impl From<InsightError> for ApiError {
    fn from(err: InsightError) -> Self {
        match err {
            InsightError::NoData => {
                ApiError::BadRequest("no readings available to analyze".to_string())
            }
            InsightError::Timeout => ApiError::Timeout,
            InsightError::Configuration(_) => ApiError::Configuration,
            InsightError::Upstream(_) | InsightError::Unknown(_) => ApiError::Internal,
        }
    }
}

/// Check the request credential against the configured bearer token. Routes
/// are open when no token is configured.
pub fn require_bearer(headers: &HeaderMap, expected: Option<&str>) -> Result<(), ApiError> {
    let Some(expected) = expected else {
        return Ok(());
    };

    let provided = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match provided {
        Some(token) if token == expected => Ok(()),
        _ => Err(ApiError::Unauthorized),
    }
}
