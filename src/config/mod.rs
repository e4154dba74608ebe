//! Layered application configuration

mod app_config;

pub use app_config::{
    AnalysisConfig, AnalyticsConfig, AppConfig, CacheBackend, CacheConfig, ExpansionConfig,
    ImageProviderConfig, LlmProviderConfig, LogFormat, LoggingConfig, PredictionConfig,
    ProvidersConfig, ServerConfig, TierConfig, UploaderConfig,
};
