//! Image generation and upload adapters

mod http_generator;
mod http_uploader;

use std::sync::Arc;
use std::time::Duration;

pub use http_generator::HttpImageGenerator;
pub use http_uploader::HttpImageUploader;

use crate::config::{ImageProviderConfig, UploaderConfig};
use crate::domain::{DomainError, ImageGenerator, ImageUploader};
use crate::infrastructure::http_client::HttpClient;

pub fn create_image_generator(
    config: &ImageProviderConfig,
) -> Result<Arc<dyn ImageGenerator>, DomainError> {
    if config.base_url.trim().is_empty() {
        return Err(DomainError::configuration(
            "Image provider base_url must not be empty",
        ));
    }

    let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;
    Ok(Arc::new(HttpImageGenerator::new(
        client,
        &config.api_key,
        &config.base_url,
    )))
}

pub fn create_image_uploader(
    config: &UploaderConfig,
) -> Result<Arc<dyn ImageUploader>, DomainError> {
    if config.base_url.trim().is_empty() {
        return Err(DomainError::configuration("Uploader base_url must not be empty"));
    }

    let client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;
    Ok(Arc::new(HttpImageUploader::new(
        client,
        &config.api_key,
        &config.base_url,
    )))
}
