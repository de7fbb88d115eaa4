use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use usage_core::domain::{Insight, Reading};

use super::{require_bearer, ApiError, AppState};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InsightRequest {
    pub energy_data: Vec<Reading>,
}

/// POST /insights: narrative insight over the caller's filtered reading set.
/// 200 with the insight, 400 for malformed or empty data, 401 for a bad
/// credential, 504 on timeout, 500 for configuration or unknown failures.
pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<InsightRequest>, JsonRejection>,
) -> Result<Json<Insight>, ApiError> {
    require_bearer(&headers, state.auth_bearer_token.as_deref())?;
    metrics::counter!("http_insight_requests_total").increment(1);

    let Json(request) = payload.map_err(|_| {
        ApiError::BadRequest("invalid request: energyData array is required".to_string())
    })?;

    // Empty sets are rejected by the engine itself, before any external call.
    let insight = state.engine.request(&request.energy_data).await?;
    Ok(Json(insight))
}
