//! Admin API endpoints for inspecting and tuning the cache

pub mod analytics;
pub mod cache;
pub mod clusters;

use axum::{
    Router,
    extract::{Query, rejection::QueryRejection},
    routing::{delete, get},
};

use super::state::AppState;
use super::types::ApiError;

/// Create admin API router
pub fn create_admin_router() -> Router<AppState> {
    Router::new()
        // Offline analyses
        .route("/clusters/analysis", get(clusters::get_cluster_analysis))
        .route("/analytics/users", get(analytics::get_user_analytics))
        // Cache management
        .route("/cache/stats", get(cache::get_cache_stats))
        .route(
            "/cache/entries",
            get(cache::browse_entries).delete(cache::delete_entry),
        )
        .route("/cache", delete(cache::clear_cache))
}

/// Unwraps a query string, rendering malformed input in the API error shape
pub(crate) fn query_params<T>(
    query: Result<Query<T>, QueryRejection>,
    request_id: &str,
) -> Result<T, ApiError> {
    query
        .map(|Query(params)| params)
        .map_err(|rejection| ApiError::bad_request(rejection.body_text(), request_id))
}
