//! Infrastructure services

mod cluster_analyzer;
mod generation_gateway;
mod image_cache_service;
mod predictive_engine;
mod semantic_expander;
mod tier_resolver;
mod user_analytics;

pub use cluster_analyzer::ClusterAnalyzer;
pub use generation_gateway::GenerationGateway;
pub use image_cache_service::{BrowsedEntry, CacheStatsReport, ClearResult, ImageCacheService};
pub use predictive_engine::{PredictionResult, PredictiveEngine};
pub use semantic_expander::{ExpansionOutcome, SemanticExpander};
pub use tier_resolver::{InstantLookup, TierResolver, UpgradeOutcome};
pub use user_analytics::UserAnalytics;
