//! Domain layer - Core records, policies and provider contracts

pub mod analytics;
pub mod cache;
pub mod cluster;
pub mod error;
pub mod image;
pub mod llm;
pub mod prediction;
pub mod session;

pub use analytics::{AnalyticsParams, AnalyticsReport, Insight, InsightKind, PromptFrequency};
pub use cache::{Cache, CacheExt, normalize_prompt, prompt_key, session_key};
pub use cluster::{ClusterAnalysis, ClusterGroup, ClusterStats, DuplicateGroup, OptimizationReport};
pub use error::DomainError;
pub use image::{
    CacheEntry, GeneratedImage, GenerationQuality, ImageGenerator, ImageSource, ImageUploader,
    LookupContext, QualityConfig, StoredImage, Tier, TierPlan, TierResolution,
};
pub use llm::{LlmProvider, LlmRequest, LlmResponse, Message, MessageRole};
pub use prediction::prediction_confidence;
pub use session::{BrowserFamily, PredictionRecord, Session, TypingPattern};
