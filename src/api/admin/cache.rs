//! Cache inspection and maintenance admin endpoints

use axum::extract::{Query, State, rejection::QueryRejection};
use tracing::{debug, info, warn};

use super::query_params;
use crate::api::middleware::RequestId;
use crate::api::state::AppState;
use crate::api::types::{
    ApiError, BrowseQuery, BrowseResponse, CacheStatsResponse, ClearQuery, ClearResponse,
    DeleteEntryQuery, DeleteEntryResponse, Json,
};
use crate::domain::cache::normalize_prompt;
use crate::domain::image::validate_prompt;

/// GET /admin/cache/stats
pub async fn get_cache_stats(
    State(state): State<AppState>,
    request_id: RequestId,
) -> Result<Json<CacheStatsResponse>, ApiError> {
    let rid = request_id.as_str();
    let analysis = &state.config.analysis;

    let cache = state
        .cache
        .stats(analysis.key_sample, analysis.batch_size)
        .await
        .map_err(|e| ApiError::from_domain(e, rid))?;

    Ok(Json(CacheStatsResponse {
        success: true,
        cache,
        background_tasks: state.tasks.stats(),
        prediction_threshold: state.predictor.threshold(),
        request_id: rid.to_string(),
    }))
}

/// GET /admin/cache/entries
pub async fn browse_entries(
    State(state): State<AppState>,
    request_id: RequestId,
    query: Result<Query<BrowseQuery>, QueryRejection>,
) -> Result<Json<BrowseResponse>, ApiError> {
    let rid = request_id.as_str();
    let params = query_params(query, rid)?;

    let entries = state
        .cache
        .browse(
            params.prefix.as_deref(),
            params.limit(),
            state.config.analysis.batch_size,
        )
        .await
        .map_err(|e| ApiError::from_domain(e, rid))?;

    debug!(request_id = %rid, count = entries.len(), "Browsed cache entries");

    Ok(Json(BrowseResponse {
        success: true,
        count: entries.len(),
        entries,
        request_id: rid.to_string(),
    }))
}

/// DELETE /admin/cache/entries?prompt=...
pub async fn delete_entry(
    State(state): State<AppState>,
    request_id: RequestId,
    query: Result<Query<DeleteEntryQuery>, QueryRejection>,
) -> Result<Json<DeleteEntryResponse>, ApiError> {
    let rid = request_id.as_str();
    let params = query_params(query, rid)?;
    validate_prompt(&params.prompt).map_err(|e| ApiError::from_domain(e, rid))?;

    let deleted = state
        .cache
        .delete(&params.prompt)
        .await
        .map_err(|e| ApiError::from_domain(e, rid))?;
    let key = normalize_prompt(&params.prompt);

    info!(request_id = %rid, key = %key, deleted, "Cache entry deleted");

    Ok(Json(DeleteEntryResponse {
        success: true,
        key,
        deleted,
        request_id: rid.to_string(),
    }))
}

/// DELETE /admin/cache
pub async fn clear_cache(
    State(state): State<AppState>,
    request_id: RequestId,
    query: Result<Query<ClearQuery>, QueryRejection>,
) -> Result<Json<ClearResponse>, ApiError> {
    let rid = request_id.as_str();
    let params = query_params(query, rid)?;

    let result = state
        .cache
        .clear(params.include_sessions)
        .await
        .map_err(|e| ApiError::from_domain(e, rid))?;

    warn!(
        request_id = %rid,
        prompts_deleted = result.prompts_deleted,
        sessions_deleted = result.sessions_deleted,
        "Cache cleared"
    );

    Ok(Json(ClearResponse {
        success: true,
        result,
        request_id: rid.to_string(),
    }))
}
