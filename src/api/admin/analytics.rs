//! User behaviour analytics admin endpoint

use axum::extract::{Query, State, rejection::QueryRejection};
use tracing::info;

use super::query_params;
use crate::api::middleware::RequestId;
use crate::api::state::AppState;
use crate::api::types::{AnalyticsQuery, AnalyticsResponse, ApiError, Json};

/// GET /admin/analytics/users
///
/// With `apply=true` the suggested prediction threshold replaces the
/// running one.
pub async fn get_user_analytics(
    State(state): State<AppState>,
    request_id: RequestId,
    query: Result<Query<AnalyticsQuery>, QueryRejection>,
) -> Result<Json<AnalyticsResponse>, ApiError> {
    let rid = request_id.as_str();
    let params = query_params(query, rid)?;

    let analytics = state
        .analytics
        .analyze(state.predictor.threshold())
        .await
        .map_err(|e| ApiError::from_domain(e, rid))?;

    let applied_threshold = params
        .apply
        .then(|| state.predictor.set_threshold(analytics.suggested_threshold));

    info!(
        request_id = %rid,
        sessions = analytics.total_sessions,
        suggested_threshold = analytics.suggested_threshold,
        applied = applied_threshold.is_some(),
        "User analytics complete"
    );

    Ok(Json(AnalyticsResponse {
        success: true,
        analytics,
        applied_threshold,
        request_id: rid.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    use crate::api::state::test_support::{test_app, test_app_with};
    use crate::domain::cache::MockCache;
    use crate::domain::image::MockImageGenerator;
    use crate::domain::llm::MockLlmProvider;

    fn query(apply: bool) -> Result<Query<AnalyticsQuery>, QueryRejection> {
        Ok(Query(AnalyticsQuery { apply }))
    }

    async fn seed_sessions(app: &crate::api::state::test_support::TestApp) {
        for (session, prompt) in [("s-1", "a red fox"), ("s-2", "a red fox"), ("s-2", "a whale")] {
            app.state
                .analytics
                .track_session(session, prompt, false, Some("Mozilla/5.0 Firefox/120.0"))
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_report_without_apply_keeps_threshold() {
        let app = test_app(MockLlmProvider::new(), MockImageGenerator::new());
        seed_sessions(&app).await;
        let before = app.state.predictor.threshold();

        let Json(response) = get_user_analytics(
            State(app.state.clone()),
            RequestId("req-1".to_string()),
            query(false),
        )
        .await
        .unwrap();

        assert!(response.success);
        assert_eq!(response.analytics.total_sessions, 2);
        assert_eq!(response.analytics.top_prompts[0].prompt, "a red fox");
        assert!(response.applied_threshold.is_none());
        assert_eq!(app.state.predictor.threshold(), before);
    }

    #[tokio::test]
    async fn test_apply_sets_suggested_threshold() {
        let app = test_app(MockLlmProvider::new(), MockImageGenerator::new());
        seed_sessions(&app).await;

        let Json(response) = get_user_analytics(
            State(app.state.clone()),
            RequestId("req-1".to_string()),
            query(true),
        )
        .await
        .unwrap();

        let applied = response.applied_threshold.unwrap();
        assert_eq!(app.state.predictor.threshold(), applied);
    }

    #[tokio::test]
    async fn test_cache_outage_is_internal_error() {
        let app = test_app_with(
            MockLlmProvider::new(),
            MockImageGenerator::new(),
            MockCache::new().with_failing_reads(),
        );

        let err = get_user_analytics(
            State(app.state),
            RequestId("req-1".to_string()),
            query(false),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
