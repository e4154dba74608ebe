//! Administrative endpoint bodies

use serde::{Deserialize, Serialize};

use crate::domain::{AnalyticsReport, ClusterAnalysis};
use crate::infrastructure::background::BackgroundStats;
use crate::infrastructure::services::{BrowsedEntry, CacheStatsReport, ClearResult};

/// Default page size for cache browsing
pub const DEFAULT_BROWSE_LIMIT: usize = 100;
pub const MAX_BROWSE_LIMIT: usize = 1000;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAnalysisResponse {
    pub success: bool,
    pub analysis: ClusterAnalysis,
    pub request_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsQuery {
    /// Apply the suggested prediction threshold to the running engine
    #[serde(default)]
    pub apply: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsResponse {
    pub success: bool,
    pub analytics: AnalyticsReport,
    /// Threshold now in effect when `apply=true`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub applied_threshold: Option<f32>,
    pub request_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsResponse {
    pub success: bool,
    pub cache: CacheStatsReport,
    pub background_tasks: BackgroundStats,
    pub prediction_threshold: f32,
    pub request_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseQuery {
    #[serde(default)]
    pub prefix: Option<String>,
    #[serde(default)]
    pub limit: Option<usize>,
}

impl BrowseQuery {
    pub fn limit(&self) -> usize {
        self.limit
            .unwrap_or(DEFAULT_BROWSE_LIMIT)
            .clamp(1, MAX_BROWSE_LIMIT)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseResponse {
    pub success: bool,
    pub count: usize,
    pub entries: Vec<BrowsedEntry>,
    pub request_id: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEntryQuery {
    pub prompt: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteEntryResponse {
    pub success: bool,
    /// Normalized prompt that was addressed
    pub key: String,
    /// False when nothing was cached under the key
    pub deleted: bool,
    pub request_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearQuery {
    #[serde(default)]
    pub include_sessions: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResponse {
    pub success: bool,
    #[serde(flatten)]
    pub result: ClearResult,
    pub request_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_browse_limit_is_bounded() {
        assert_eq!(BrowseQuery::default().limit(), DEFAULT_BROWSE_LIMIT);
        assert_eq!(
            BrowseQuery {
                prefix: None,
                limit: Some(50_000)
            }
            .limit(),
            MAX_BROWSE_LIMIT
        );
        assert_eq!(
            BrowseQuery {
                prefix: None,
                limit: Some(0)
            }
            .limit(),
            1
        );
    }

    #[test]
    fn test_clear_response_flattens_counts() {
        let response = ClearResponse {
            success: true,
            result: ClearResult {
                prompts_deleted: 3,
                sessions_deleted: 1,
            },
            request_id: "req-1".into(),
        };

        let json = serde_json::to_value(response).unwrap();
        assert_eq!(json["promptsDeleted"], 3);
        assert_eq!(json["sessionsDeleted"], 1);
    }
}
