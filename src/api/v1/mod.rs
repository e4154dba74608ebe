//! Public v1 API endpoints

pub mod images;
pub mod typing;

use axum::{
    Router,
    http::{HeaderMap, header},
    routing::post,
};

use super::state::AppState;

/// Create v1 API router
pub fn create_v1_router() -> Router<AppState> {
    Router::new()
        // Tiered image delivery
        .route("/images/instant", post(images::instant))
        .route("/images/generate", post(images::generate))
        .route("/images/upgrade", post(images::upgrade))
        .route("/images/semantic-check", post(images::semantic_check))
        // Typing prediction
        .route("/typing/predict", post(typing::predict))
        .route("/typing/track", post(typing::track))
}

/// Client user agent: an explicit body value wins over the header
pub(crate) fn user_agent(headers: &HeaderMap, explicit: Option<&str>) -> Option<String> {
    explicit
        .map(str::to_string)
        .or_else(|| {
            headers
                .get(header::USER_AGENT)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        })
        .filter(|ua| !ua.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_agent_prefers_explicit_value() {
        let mut headers = HeaderMap::new();
        headers.insert(header::USER_AGENT, "curl/8.0".parse().unwrap());

        assert_eq!(
            user_agent(&headers, Some("Mozilla/5.0 Firefox/120.0")).as_deref(),
            Some("Mozilla/5.0 Firefox/120.0")
        );
        assert_eq!(user_agent(&headers, None).as_deref(), Some("curl/8.0"));
        assert_eq!(user_agent(&HeaderMap::new(), None), None);
        assert_eq!(user_agent(&HeaderMap::new(), Some("  ")), None);
    }
}
