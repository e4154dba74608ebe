//! Image delivery endpoint handlers

use axum::{extract::State, http::HeaderMap};
use tracing::{info, warn};

use super::user_agent;
use crate::api::middleware::RequestId;
use crate::api::state::AppState;
use crate::api::types::{
    ApiError, GenerateRequest, GenerateResponse, InstantRequest, InstantResponse, Json,
    SemanticCheckRequest, SemanticCheckResponse, UpgradeRequest, UpgradeResponse,
};
use crate::domain::image::validate_prompt;
use crate::domain::session::validate_session_id;
use crate::domain::{LookupContext, Tier, TierPlan};
use crate::infrastructure::services::InstantLookup;

/// POST /v1/images/instant
pub async fn instant(
    State(state): State<AppState>,
    request_id: RequestId,
    headers: HeaderMap,
    Json(request): Json<InstantRequest>,
) -> Result<Json<InstantResponse>, ApiError> {
    let rid = request_id.as_str();
    validate_request(&request.prompt, request.session_id.as_deref(), rid)?;

    let lookup = state
        .resolver
        .lookup_instant(&request.prompt, LookupContext::QuickSuggest, rid)
        .await;

    if let Some(session_id) = request.session_id {
        track_session(
            &state,
            session_id,
            &request.prompt,
            matches!(lookup, InstantLookup::Hit(_)),
            user_agent(&headers, None),
            rid,
        );
    }

    let response = match lookup {
        InstantLookup::Hit(hit) => InstantResponse {
            success: true,
            url: Some(hit.url),
            tier: Tier::Instant,
            confidence: hit.confidence,
            reason: if hit.entry.is_semantic_variation {
                "semantic match".to_string()
            } else {
                "exact match".to_string()
            },
            request_id: rid.to_string(),
        },
        InstantLookup::BelowFloor { confidence } => InstantResponse {
            success: false,
            url: None,
            tier: Tier::Instant,
            confidence,
            reason: "below confidence floor".to_string(),
            request_id: rid.to_string(),
        },
        InstantLookup::Miss => InstantResponse {
            success: false,
            url: None,
            tier: Tier::Instant,
            confidence: 0.0,
            reason: "not cached".to_string(),
            request_id: rid.to_string(),
        },
    };

    Ok(Json(response))
}

/// POST /v1/images/generate
pub async fn generate(
    State(state): State<AppState>,
    request_id: RequestId,
    headers: HeaderMap,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let rid = request_id.as_str();
    validate_request(&request.prompt, request.session_id.as_deref(), rid)?;

    let plan = TierPlan::new(&request.tiers, request.max_tiers)
        .map_err(|e| ApiError::from_domain(e, rid))?;

    info!(request_id = %rid, tiers = ?plan, "Processing generation request");

    let resolution = state
        .resolver
        .resolve(&request.prompt, &plan, LookupContext::Default, rid)
        .await
        .map_err(|e| ApiError::from_domain(e, rid))?;

    if let Some(session_id) = request.session_id {
        let cache_hit = resolution.as_ref().is_some_and(|r| r.cached);
        track_session(
            &state,
            session_id,
            &request.prompt,
            cache_hit,
            user_agent(&headers, None),
            rid,
        );
    }

    let response = match resolution {
        Some(resolution) => GenerateResponse::resolved(&resolution, rid),
        None if plan.contains(Tier::Fast) && !plan.contains(Tier::Final) => {
            GenerateResponse::unresolved("fast tier unavailable and not cached", rid)
        }
        None => GenerateResponse::unresolved("not cached", rid),
    };

    Ok(Json(response))
}

/// POST /v1/images/upgrade
///
/// Schedules a final-quality generation and answers immediately.
pub async fn upgrade(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<UpgradeRequest>,
) -> Result<Json<UpgradeResponse>, ApiError> {
    let rid = request_id.as_str();
    validate_prompt(&request.prompt).map_err(|e| ApiError::from_domain(e, rid))?;

    if let Some(tiers) = &request.tiers {
        if !tiers.is_empty() && !tiers.contains(&Tier::Final) {
            return Err(ApiError::bad_request(
                "upgrade requires the final tier to be allowed",
                rid,
            ));
        }
    }

    state.resolver.schedule_upgrade(&request.prompt, rid);

    Ok(Json(UpgradeResponse {
        success: true,
        message: "Upgrade scheduled".to_string(),
        request_id: rid.to_string(),
    }))
}

/// POST /v1/images/semantic-check
pub async fn semantic_check(
    State(state): State<AppState>,
    request_id: RequestId,
    Json(request): Json<SemanticCheckRequest>,
) -> Result<Json<SemanticCheckResponse>, ApiError> {
    let rid = request_id.as_str();
    validate_prompt(&request.prompt).map_err(|e| ApiError::from_domain(e, rid))?;

    let hit = state
        .resolver
        .instant(&request.prompt, LookupContext::QuickSuggest, rid)
        .await;

    Ok(Json(match hit {
        Some(hit) => SemanticCheckResponse {
            found: true,
            url: Some(hit.url),
            confidence: hit.confidence,
            request_id: rid.to_string(),
        },
        None => SemanticCheckResponse {
            found: false,
            url: None,
            confidence: 0.0,
            request_id: rid.to_string(),
        },
    }))
}

fn validate_request(prompt: &str, session_id: Option<&str>, rid: &str) -> Result<(), ApiError> {
    validate_prompt(prompt).map_err(|e| ApiError::from_domain(e, rid))?;
    if let Some(session_id) = session_id {
        validate_session_id(session_id).map_err(|e| ApiError::from_domain(e, rid))?;
    }
    Ok(())
}

fn track_session(
    state: &AppState,
    session_id: String,
    prompt: &str,
    cache_hit: bool,
    user_agent: Option<String>,
    rid: &str,
) {
    let analytics = state.analytics.clone();
    let prompt = prompt.to_string();

    state.tasks.spawn("session_tracking", rid, async move {
        analytics
            .track_session(&session_id, &prompt, cache_hit, user_agent.as_deref())
            .await
            .inspect_err(|e| warn!(error = %e, "Failed to track session"))
    });
}
