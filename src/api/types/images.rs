//! Image endpoint request and response bodies

use serde::{Deserialize, Serialize};

use crate::domain::{Tier, TierResolution};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantRequest {
    pub prompt: String,
    /// Accepted for client compatibility; at most one image is returned
    #[serde(default)]
    pub max_options: Option<usize>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstantResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub tier: Tier,
    pub confidence: f32,
    pub reason: String,
    pub request_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub prompt: String,
    /// Allowed tiers; empty means all three
    #[serde(default)]
    pub tiers: Vec<Tier>,
    #[serde(default)]
    pub max_tiers: Option<usize>,
    #[serde(default)]
    pub session_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    pub cached: bool,
    /// True when the URL is the provider's short-lived URL
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub degraded: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub request_id: String,
}

impl GenerateResponse {
    pub fn resolved(resolution: &TierResolution, request_id: &str) -> Self {
        Self {
            success: true,
            url: Some(resolution.url.clone()),
            tier: Some(resolution.tier),
            confidence: Some(resolution.confidence),
            cached: resolution.cached,
            degraded: resolution.entry.degraded,
            reason: None,
            request_id: request_id.to_string(),
        }
    }

    pub fn unresolved(reason: impl Into<String>, request_id: &str) -> Self {
        Self {
            success: false,
            url: None,
            tier: None,
            confidence: None,
            cached: false,
            degraded: false,
            reason: Some(reason.into()),
            request_id: request_id.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeRequest {
    pub prompt: String,
    #[serde(default)]
    pub tiers: Option<Vec<Tier>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpgradeResponse {
    pub success: bool,
    pub message: String,
    pub request_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticCheckRequest {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticCheckResponse {
    pub found: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub confidence: f32,
    pub request_id: String,
}
