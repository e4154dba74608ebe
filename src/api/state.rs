//! Application state for shared services

use std::sync::Arc;

use crate::config::AppConfig;
use crate::domain::{Cache, ImageGenerator, ImageUploader, LlmProvider};
use crate::infrastructure::background::BackgroundTasks;
use crate::infrastructure::services::{
    ClusterAnalyzer, GenerationGateway, ImageCacheService, PredictiveEngine, SemanticExpander,
    TierResolver, UserAnalytics,
};

/// External collaborators the service is built from
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub cache: Arc<dyn Cache>,
    pub llm: Arc<dyn LlmProvider>,
    pub generator: Arc<dyn ImageGenerator>,
    pub uploader: Arc<dyn ImageUploader>,
}

/// Shared handles to every component, cloned into each handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub cache: Arc<ImageCacheService>,
    pub resolver: Arc<TierResolver>,
    pub predictor: Arc<PredictiveEngine>,
    pub cluster_analyzer: Arc<ClusterAnalyzer>,
    pub analytics: Arc<UserAnalytics>,
    pub tasks: BackgroundTasks,
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Wires the components together, each with its own config section
    pub fn new(config: AppConfig, collaborators: Collaborators) -> Self {
        let tasks = BackgroundTasks::new();

        let cache = Arc::new(ImageCacheService::new(
            collaborators.cache.clone(),
            config.cache.entry_ttl(),
        ));
        let gateway = Arc::new(GenerationGateway::new(
            collaborators.generator,
            collaborators.uploader,
            config.providers.image.fast_profile(),
            config.providers.image.final_profile(),
        ));
        let expander = Arc::new(SemanticExpander::new(
            collaborators.llm.clone(),
            cache.clone(),
            tasks.clone(),
            config.expansion.clone(),
        ));
        let resolver = Arc::new(TierResolver::new(
            cache.clone(),
            gateway,
            expander,
            tasks.clone(),
            config.tiers.clone(),
            config.expansion.variation_quality_score,
        ));
        let predictor = Arc::new(PredictiveEngine::new(
            collaborators.llm.clone(),
            resolver.clone(),
            tasks.clone(),
            config.prediction.clone(),
        ));
        let cluster_analyzer = Arc::new(ClusterAnalyzer::new(
            collaborators.llm,
            cache.clone(),
            config.analysis.clone(),
        ));
        let analytics = Arc::new(UserAnalytics::new(
            collaborators.cache,
            config.analytics.clone(),
        ));

        Self {
            cache,
            resolver,
            predictor,
            cluster_analyzer,
            analytics,
            tasks,
            config: Arc::new(config),
        }
    }
}
