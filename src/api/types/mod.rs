//! Request/response bodies of the HTTP surface

pub mod admin;
pub mod error;
pub mod images;
pub mod json;
pub mod typing;

pub use admin::{
    AnalyticsQuery, AnalyticsResponse, BrowseQuery, BrowseResponse, CacheStatsResponse,
    ClearQuery, ClearResponse, ClusterAnalysisResponse, DeleteEntryQuery, DeleteEntryResponse,
};
pub use error::{ApiError, ApiErrorResponse};
pub use images::{
    GenerateRequest, GenerateResponse, InstantRequest, InstantResponse, SemanticCheckRequest,
    SemanticCheckResponse, UpgradeRequest, UpgradeResponse,
};
pub use json::Json;
pub use typing::{PredictRequest, PredictResponse, TrackRequest, TrackResponse};
