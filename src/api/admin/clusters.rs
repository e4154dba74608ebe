//! Cluster analysis admin endpoint

use std::time::Instant;

use axum::extract::State;
use tracing::info;

use crate::api::middleware::RequestId;
use crate::api::state::AppState;
use crate::api::types::{ApiError, ClusterAnalysisResponse, Json};

/// GET /admin/clusters/analysis
pub async fn get_cluster_analysis(
    State(state): State<AppState>,
    request_id: RequestId,
) -> Result<Json<ClusterAnalysisResponse>, ApiError> {
    let rid = request_id.as_str();
    let start = Instant::now();

    let analysis = state
        .cluster_analyzer
        .analyze()
        .await
        .map_err(|e| ApiError::from_domain(e, rid))?;

    info!(
        request_id = %rid,
        clusters = analysis.stats.total_clusters,
        duplicates = analysis.duplicates.len(),
        duration_ms = start.elapsed().as_millis() as u64,
        "Cluster analysis complete"
    );

    Ok(Json(ClusterAnalysisResponse {
        success: true,
        analysis,
        request_id: rid.to_string(),
    }))
}
