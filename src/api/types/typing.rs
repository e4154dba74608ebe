//! Typing endpoint request and response bodies

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictRequest {
    pub partial: String,
    #[serde(default)]
    pub session_id: Option<String>,
    /// Overrides the `User-Agent` header when given
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictResponse {
    pub success: bool,
    pub predictions: Vec<String>,
    pub confidence: f32,
    pub request_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackRequest {
    pub partial: String,
    pub session_id: String,
    /// Milliseconds spent typing
    pub duration: u64,
    #[serde(default)]
    pub final_prompt: Option<String>,
    #[serde(default)]
    pub abandoned: Option<bool>,
    /// Overrides the `User-Agent` header when given
    #[serde(default)]
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResponse {
    pub success: bool,
    pub request_id: String,
}
