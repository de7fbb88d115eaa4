use std::collections::HashMap;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use sqlx::PgPool;
use time::{Date, OffsetDateTime};
use usage_core::aggregate;
use usage_core::cache::{CacheError, ReadingCache};
use usage_core::db;
use usage_core::domain::{
    ChartDataPoint, DateRange, NewReading, Reading, ReadingPatch, Statistics, UtilityFilter,
};
use usage_core::validate::{validate_patch, validate_reading, ReadingDraft};
use uuid::Uuid;

use super::{require_bearer, ApiError, AppState};

/// Populate the owner's cache from the store on first touch.
async fn ensure_cache(
    caches: &mut HashMap<Uuid, ReadingCache>,
    pool: &PgPool,
    owner_id: Uuid,
) -> Result<(), ApiError> {
    if !caches.contains_key(&owner_id) {
        let rows = db::list_readings(pool, owner_id).await?;
        caches.insert(owner_id, ReadingCache::new(rows));
    }
    Ok(())
}

fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

pub async fn list(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    headers: HeaderMap,
) -> Result<Json<Vec<Reading>>, ApiError> {
    require_bearer(&headers, state.auth_bearer_token.as_deref())?;
    metrics::counter!("http_readings_requests_total").increment(1);

    let mut caches = state.caches.lock().await;
    ensure_cache(&mut caches, &state.pool, owner_id).await?;
    let cache = caches.get_mut(&owner_id).expect("populated above");

    Ok(Json(cache.readings().to_vec()))
}

pub async fn create(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    headers: HeaderMap,
    payload: Result<Json<ReadingDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Reading>), ApiError> {
    require_bearer(&headers, state.auth_bearer_token.as_deref())?;
    let Json(draft) =
        payload.map_err(|_| ApiError::BadRequest("invalid reading payload".to_string()))?;

    let outcome = validate_reading(&draft, today());
    if !outcome.is_valid() {
        metrics::counter!("validation_rejected_total").increment(1);
        return Err(ApiError::BadRequest(outcome.messages().join("; ")));
    }

    let new = NewReading {
        date: draft.date.expect("validated above"),
        utility_type: draft.parsed_type().expect("validated above"),
        usage: draft.usage.expect("validated above"),
        notes: draft.notes.clone(),
    };

    let mut caches = state.caches.lock().await;
    ensure_cache(&mut caches, &state.pool, owner_id).await?;

    let stored = db::insert_reading(&state.pool, owner_id, &new).await?;

    // The store assigned the id and timestamps, so the local apply cannot
    // diverge from it; stage and commit in one step.
    let cache = caches.get_mut(&owner_id).expect("populated above");
    if cache.stage_insert(stored.clone()).is_ok() {
        let _ = cache.commit();
    }

    Ok((StatusCode::CREATED, Json(stored)))
}

pub async fn update(
    State(state): State<AppState>,
    Path((owner_id, id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
    payload: Result<Json<ReadingPatch>, JsonRejection>,
) -> Result<StatusCode, ApiError> {
    require_bearer(&headers, state.auth_bearer_token.as_deref())?;
    let Json(patch) =
        payload.map_err(|_| ApiError::BadRequest("invalid reading payload".to_string()))?;

    let outcome = validate_patch(&patch, today());
    if !outcome.is_valid() {
        metrics::counter!("validation_rejected_total").increment(1);
        return Err(ApiError::BadRequest(outcome.messages().join("; ")));
    }

    let mut caches = state.caches.lock().await;
    ensure_cache(&mut caches, &state.pool, owner_id).await?;

    // Phase one: tentative local apply.
    match caches
        .get_mut(&owner_id)
        .expect("populated above")
        .stage_update(id, &patch)
    {
        Ok(()) => {}
        Err(CacheError::NotFound(_)) => return Err(ApiError::NotFound),
        Err(e) => {
            tracing::error!(error = %e, "could not stage reading update");
            return Err(ApiError::Internal);
        }
    }

    // Phase two: remote write decides between commit and rollback.
    match db::update_reading(&state.pool, id, owner_id, &patch).await {
        Ok(()) => {
            let _ = caches.get_mut(&owner_id).expect("populated above").commit();
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            resync_after_failure(&mut caches, &state.pool, owner_id).await;
            Err(err.into())
        }
    }
}

pub async fn remove(
    State(state): State<AppState>,
    Path((owner_id, id)): Path<(Uuid, Uuid)>,
    headers: HeaderMap,
) -> Result<StatusCode, ApiError> {
    require_bearer(&headers, state.auth_bearer_token.as_deref())?;

    let mut caches = state.caches.lock().await;
    ensure_cache(&mut caches, &state.pool, owner_id).await?;

    match caches
        .get_mut(&owner_id)
        .expect("populated above")
        .stage_delete(id)
    {
        Ok(()) => {}
        Err(CacheError::NotFound(_)) => return Err(ApiError::NotFound),
        Err(e) => {
            tracing::error!(error = %e, "could not stage reading delete");
            return Err(ApiError::Internal);
        }
    }

    match db::delete_reading(&state.pool, id, owner_id).await {
        Ok(()) => {
            let _ = caches.get_mut(&owner_id).expect("populated above").commit();
            Ok(StatusCode::NO_CONTENT)
        }
        Err(err) => {
            resync_after_failure(&mut caches, &state.pool, owner_id).await;
            Err(err.into())
        }
    }
}

/// Rollback path: discard the tentative list and resynchronize from the
/// authoritative store. When even the refetch fails, drop the cache entry so
/// the next read repopulates it.
async fn resync_after_failure(
    caches: &mut HashMap<Uuid, ReadingCache>,
    pool: &PgPool,
    owner_id: Uuid,
) {
    match db::list_readings(pool, owner_id).await {
        Ok(rows) => {
            if let Some(cache) = caches.get_mut(&owner_id) {
                let _ = cache.rollback(rows);
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, "resync after failed write also failed, dropping cache");
            caches.remove(&owner_id);
        }
    }
}

#[derive(Deserialize)]
pub struct RangeQuery {
    pub start: Date,
    pub end: Date,
}

pub async fn statistics(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Query(query): Query<RangeQuery>,
    headers: HeaderMap,
) -> Result<Json<Statistics>, ApiError> {
    require_bearer(&headers, state.auth_bearer_token.as_deref())?;

    let range = DateRange::new(query.start, query.end);
    let readings = owner_readings(&state, owner_id).await?;
    let in_range = aggregate::filter_by_date_range(&readings, &range);

    Ok(Json(aggregate::statistics(&in_range, &range)))
}

#[derive(Deserialize)]
pub struct ChartQuery {
    pub start: Date,
    pub end: Date,
    /// Utility name or "all" (the default).
    #[serde(rename = "type")]
    pub utility: Option<String>,
}

pub async fn chart(
    State(state): State<AppState>,
    Path(owner_id): Path<Uuid>,
    Query(query): Query<ChartQuery>,
    headers: HeaderMap,
) -> Result<Json<Vec<ChartDataPoint>>, ApiError> {
    require_bearer(&headers, state.auth_bearer_token.as_deref())?;

    let filter = match query.utility.as_deref() {
        None => UtilityFilter::All,
        Some(raw) => raw
            .parse::<UtilityFilter>()
            .map_err(|e| ApiError::BadRequest(e.to_string()))?,
    };

    let range = DateRange::new(query.start, query.end);
    let readings = owner_readings(&state, owner_id).await?;
    let in_range = aggregate::filter_by_date_range(&readings, &range);
    let selected = aggregate::filter_by_utility(&in_range, filter);

    Ok(Json(aggregate::chart_data(&selected)))
}

async fn owner_readings(state: &AppState, owner_id: Uuid) -> Result<Vec<Reading>, ApiError> {
    let mut caches = state.caches.lock().await;
    ensure_cache(&mut caches, &state.pool, owner_id).await?;
    Ok(caches
        .get_mut(&owner_id)
        .expect("populated above")
        .readings()
        .to_vec())
}
