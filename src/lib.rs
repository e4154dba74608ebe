//! Storyboard image cache
//!
//! Serves images for storyboard prompts through three tiers:
//! - instant: exact or paraphrased prompt already in the cache
//! - fast: low-step generation, upgraded to final quality in the background
//! - final: full-quality generation, expanded into cached paraphrases
//!
//! Typing predictions warm the cache ahead of submission, and offline
//! analyses report on image clusters and user behaviour.

pub mod api;
pub mod cli;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::AppConfig;

use anyhow::Context;
use tracing::info;

use api::{AppState, Collaborators};
use infrastructure::cache::CacheFactory;
use infrastructure::image::{create_image_generator, create_image_uploader};
use infrastructure::llm::LlmProviderFactory;

/// Create the application state with all components connected to their
/// configured backends
pub async fn create_app_state_with_config(config: &AppConfig) -> anyhow::Result<AppState> {
    let cache = CacheFactory::new()
        .create(&config.cache)
        .await
        .context("failed to create cache backend")?;
    let llm = LlmProviderFactory::create(&config.providers.llm)
        .context("failed to create language model provider")?;
    let generator = create_image_generator(&config.providers.image)
        .context("failed to create image generator")?;
    let uploader = create_image_uploader(&config.providers.uploader)
        .context("failed to create image uploader")?;

    info!(
        cache_backend = ?config.cache.backend,
        llm_model = %config.providers.llm.model,
        fast_enabled = config.tiers.fast_enabled,
        "Application state initialized"
    );

    Ok(AppState::new(
        config.clone(),
        Collaborators {
            cache,
            llm,
            generator,
            uploader,
        },
    ))
}
