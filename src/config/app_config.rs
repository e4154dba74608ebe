use std::time::Duration;

use serde::Deserialize;

use crate::domain::QualityConfig;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub cache: CacheConfig,
    pub providers: ProvidersConfig,
    pub tiers: TierConfig,
    pub expansion: ExpansionConfig,
    pub prediction: PredictionConfig,
    pub analysis: AnalysisConfig,
    pub analytics: AnalyticsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound on waiting for background tasks during shutdown
    pub shutdown_grace_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum CacheBackend {
    #[default]
    InMemory,
    Redis,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackend,
    pub redis_url: String,
    /// Prefix prepended to every key in a shared Redis
    pub key_prefix: String,
    pub max_capacity: u64,
    /// Expiry for prompt entries; `None` keeps them until evicted
    pub entry_ttl_secs: Option<u64>,
}

impl CacheConfig {
    pub fn entry_ttl(&self) -> Option<Duration> {
        self.entry_ttl_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProvidersConfig {
    pub llm: LlmProviderConfig,
    pub image: ImageProviderConfig,
    pub uploader: UploaderConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ImageProviderConfig {
    pub base_url: String,
    pub api_key: String,
    pub fast_model: String,
    pub final_model: String,
    pub fast_steps: u32,
    pub final_steps: u32,
    pub timeout_secs: u64,
}

impl ImageProviderConfig {
    pub fn fast_profile(&self) -> QualityConfig {
        QualityConfig {
            steps: self.fast_steps,
            ..QualityConfig::fast(&self.fast_model)
        }
    }

    pub fn final_profile(&self) -> QualityConfig {
        QualityConfig {
            steps: self.final_steps,
            ..QualityConfig::final_quality(&self.final_model)
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UploaderConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TierConfig {
    /// Minimum hit confidence in quick-suggest contexts
    pub quick_suggest_floor: f32,
    /// Minimum hit confidence in default generate flows
    pub default_floor: f32,
    /// Confidence reported for fast-tier responses
    pub fast_confidence: f32,
    pub fast_enabled: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    pub enabled: bool,
    pub count: usize,
    /// Quality score written on every variation entry
    pub variation_quality_score: f32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PredictionConfig {
    pub enabled: bool,
    pub min_partial_len: usize,
    pub prediction_count: usize,
    pub confidence_threshold: f32,
    pub stagger_secs: u64,
    pub context_window: usize,
}

impl PredictionConfig {
    pub fn stagger(&self) -> Duration {
        Duration::from_secs(self.stagger_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub key_sample: usize,
    pub batch_size: usize,
    pub duplicate_sample: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    pub session_ttl_days: u64,
    pub key_sample: usize,
    pub batch_size: usize,
    pub top_prompts: usize,
    pub recent_window_days: i64,
}

impl AnalyticsConfig {
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_days * 24 * 60 * 60)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            shutdown_grace_secs: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackend::default(),
            redis_url: "redis://127.0.0.1:6379".to_string(),
            key_prefix: String::new(),
            max_capacity: 100_000,
            entry_ttl_secs: None,
        }
    }
}

impl Default for LlmProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 512,
            timeout_secs: 30,
        }
    }
}

impl Default for ImageProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            api_key: String::new(),
            fast_model: "flux-schnell".to_string(),
            final_model: "flux-dev".to_string(),
            fast_steps: 4,
            final_steps: 28,
            timeout_secs: 120,
        }
    }
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:9000".to_string(),
            api_key: String::new(),
            timeout_secs: 60,
        }
    }
}

impl Default for TierConfig {
    fn default() -> Self {
        Self {
            quick_suggest_floor: 0.70,
            default_floor: 0.85,
            fast_confidence: 0.6,
            fast_enabled: true,
        }
    }
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            count: 6,
            variation_quality_score: 0.9,
        }
    }
}

impl Default for PredictionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            min_partial_len: 3,
            prediction_count: 3,
            confidence_threshold: 0.4,
            stagger_secs: 2,
            context_window: 5,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            key_sample: 1000,
            batch_size: 50,
            duplicate_sample: 20,
        }
    }
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            session_ttl_days: 30,
            key_sample: 5000,
            batch_size: 50,
            top_prompts: 10,
            recent_window_days: 7,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
