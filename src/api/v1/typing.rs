//! Typing prediction and tracking endpoint handlers

use axum::{extract::State, http::HeaderMap};
use chrono::Utc;
use tracing::{debug, warn};

use super::user_agent;
use crate::api::middleware::RequestId;
use crate::api::state::AppState;
use crate::api::types::{
    ApiError, Json, PredictRequest, PredictResponse, TrackRequest, TrackResponse,
};
use crate::domain::TypingPattern;
use crate::domain::session::validate_session_id;

/// POST /v1/typing/predict
pub async fn predict(
    State(state): State<AppState>,
    request_id: RequestId,
    headers: HeaderMap,
    Json(request): Json<PredictRequest>,
) -> Result<Json<PredictResponse>, ApiError> {
    let rid = request_id.as_str();

    if let Some(session_id) = &request.session_id {
        validate_session_id(session_id).map_err(|e| ApiError::from_domain(e, rid))?;
    }

    let recent = match &request.session_id {
        Some(session_id) => {
            state
                .analytics
                .recent_prompts(session_id, state.config.prediction.context_window)
                .await
        }
        None => Vec::new(),
    };

    let result = state.predictor.predict(&request.partial, &recent, rid).await;
    debug!(
        request_id = %rid,
        predictions = result.predictions.len(),
        confidence = result.confidence,
        warming = result.warming,
        "Prediction complete"
    );

    if let Some(session_id) = request.session_id {
        if !result.predictions.is_empty() {
            let analytics = state.analytics.clone();
            let partial = request.partial.clone();
            let predictions = result.predictions.clone();
            let confidence = result.confidence;
            let agent = user_agent(&headers, request.user_agent.as_deref());

            state.tasks.spawn("prediction_tracking", rid, async move {
                analytics
                    .track_prediction(
                        &session_id,
                        &partial,
                        &predictions,
                        confidence,
                        agent.as_deref(),
                    )
                    .await
                    .inspect_err(|e| warn!(error = %e, "Failed to track prediction"))
            });
        }
    }

    Ok(Json(PredictResponse {
        success: true,
        predictions: result.predictions,
        confidence: result.confidence,
        request_id: rid.to_string(),
    }))
}

/// POST /v1/typing/track
pub async fn track(
    State(state): State<AppState>,
    request_id: RequestId,
    headers: HeaderMap,
    Json(request): Json<TrackRequest>,
) -> Result<Json<TrackResponse>, ApiError> {
    let rid = request_id.as_str();
    let agent = user_agent(&headers, request.user_agent.as_deref());

    let pattern = TypingPattern {
        partial: request.partial,
        final_prompt: request.final_prompt,
        duration: request.duration,
        abandoned: request.abandoned.unwrap_or(false),
        timestamp: Utc::now(),
    };

    state
        .analytics
        .track_typing_pattern(&request.session_id, pattern, agent.as_deref())
        .await
        .map_err(|e| ApiError::from_domain(e, rid))?;

    Ok(Json(TrackResponse {
        success: true,
        request_id: rid.to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{StatusCode, header};

    use crate::api::state::test_support::{test_app, test_app_with};
    use crate::domain::BrowserFamily;
    use crate::domain::cache::MockCache;
    use crate::domain::image::MockImageGenerator;
    use crate::domain::llm::MockLlmProvider;

    fn rid() -> RequestId {
        RequestId("req-1".to_string())
    }

    fn predict_request(partial: &str, session_id: Option<&str>) -> PredictRequest {
        PredictRequest {
            partial: partial.to_string(),
            session_id: session_id.map(str::to_string),
            user_agent: None,
        }
    }

    fn track_request(session_id: &str) -> TrackRequest {
        TrackRequest {
            partial: "a drag".to_string(),
            session_id: session_id.to_string(),
            duration: 1200,
            final_prompt: Some("a dragon over a castle".to_string()),
            abandoned: None,
            user_agent: None,
        }
    }

    #[tokio::test]
    async fn test_predict_returns_predictions() {
        let llm = MockLlmProvider::new().with_response(
            r#"["a dragon over a castle", "a dragon in the snow", "a dragon asleep"]"#,
        );
        let app = test_app(llm, MockImageGenerator::new());

        let Json(response) = predict(
            State(app.state.clone()),
            rid(),
            HeaderMap::new(),
            Json(predict_request("a dragon", None)),
        )
        .await
        .unwrap();

        assert!(response.success);
        assert_eq!(response.predictions.len(), 3);
        assert!(response.confidence > 0.0);
        assert_eq!(response.request_id, "req-1");
    }

    #[tokio::test]
    async fn test_predict_short_partial_is_empty() {
        let llm = MockLlmProvider::new().with_response(r#"["a cat"]"#);
        let app = test_app(llm, MockImageGenerator::new());

        let Json(response) = predict(
            State(app.state),
            rid(),
            HeaderMap::new(),
            Json(predict_request("a", None)),
        )
            .await
            .unwrap();

        assert!(response.success);
        assert!(response.predictions.is_empty());
        assert_eq!(response.confidence, 0.0);
    }

    #[tokio::test]
    async fn test_predict_llm_failure_is_empty_success() {
        let app = test_app(
            MockLlmProvider::new().with_error("rate limited"),
            MockImageGenerator::new(),
        );

        let Json(response) = predict(
            State(app.state),
            rid(),
            HeaderMap::new(),
            Json(predict_request("a dragon", None)),
        )
        .await
        .unwrap();

        assert!(response.success);
        assert!(response.predictions.is_empty());
    }

    #[tokio::test]
    async fn test_predict_records_session_predictions() {
        let llm = MockLlmProvider::new().with_response(r#"["a dragon over a castle"]"#);
        let app = test_app(llm, MockImageGenerator::new());

        predict(
            State(app.state.clone()),
            rid(),
            HeaderMap::new(),
            Json(predict_request("a dragon", Some("session-1"))),
        )
        .await
        .unwrap();
        app.state.tasks.wait_idle().await;

        let session = app
            .state
            .analytics
            .session("session-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.predictions.len(), 1);
        assert_eq!(session.predictions[0].partial, "a dragon");
    }

    #[tokio::test]
    async fn test_predict_records_browser_family() {
        let llm = MockLlmProvider::new().with_response(r#"["a dragon over a castle"]"#);
        let app = test_app(llm, MockImageGenerator::new());

        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0"
                .parse()
                .unwrap(),
        );
        predict(
            State(app.state.clone()),
            rid(),
            headers,
            Json(predict_request("a dragon", Some("session-1"))),
        )
        .await
        .unwrap();

        let mut request = predict_request("a dragon", Some("session-2"));
        request.user_agent = Some("Mozilla/5.0 Chrome/126.0 Safari/537.36".to_string());
        predict(State(app.state.clone()), rid(), HeaderMap::new(), Json(request))
            .await
            .unwrap();
        app.state.tasks.wait_idle().await;

        let first = app.state.analytics.session("session-1").await.unwrap().unwrap();
        let second = app.state.analytics.session("session-2").await.unwrap().unwrap();
        assert_eq!(first.user_agent, Some(BrowserFamily::Firefox));
        assert_eq!(second.user_agent, Some(BrowserFamily::Chrome));
    }

    #[tokio::test]
    async fn test_predict_rejects_invalid_session() {
        let app = test_app(MockLlmProvider::new(), MockImageGenerator::new());

        let err = predict(
            State(app.state),
            rid(),
            HeaderMap::new(),
            Json(predict_request("a dragon", Some("no spaces allowed"))),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_track_stores_typing_pattern() {
        let app = test_app(MockLlmProvider::new(), MockImageGenerator::new());
        let mut headers = HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            "Mozilla/5.0 (Windows NT 10.0) Chrome/120.0".parse().unwrap(),
        );

        let Json(response) = track(
            State(app.state.clone()),
            rid(),
            headers,
            Json(track_request("session-1")),
        )
        .await
        .unwrap();

        assert!(response.success);
        let session = app
            .state
            .analytics
            .session("session-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(session.typing_patterns.len(), 1);
        assert_eq!(session.typing_patterns[0].duration, 1200);
    }

    #[tokio::test]
    async fn test_track_cache_outage_is_internal_error() {
        let app = test_app_with(
            MockLlmProvider::new(),
            MockImageGenerator::new(),
            MockCache::new().with_failing_writes(),
        );

        let err = track(
            State(app.state),
            rid(),
            HeaderMap::new(),
            Json(track_request("session-1")),
        )
        .await
        .unwrap_err();

        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
