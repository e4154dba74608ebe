use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

use crate::domain::DomainError;

/// Generation settings handed to the image model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityConfig {
    pub model: String,
    pub steps: u32,
    pub width: u32,
    pub height: u32,
}

impl QualityConfig {
    /// Reduced-step profile for the fast tier
    pub fn fast(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            steps: 4,
            width: 512,
            height: 512,
        }
    }

    /// Full-quality profile for the final tier
    pub fn final_quality(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            steps: 28,
            width: 1024,
            height: 768,
        }
    }

    pub fn size(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

/// Raw output of the image model
#[derive(Debug, Clone, Default)]
pub struct GeneratedImage {
    /// Base64-encoded image bytes
    pub base64: Option<String>,
    /// Short-lived URL served by the provider
    pub ephemeral_url: Option<String>,
}

/// What the uploader should persist
#[derive(Debug, Clone, PartialEq)]
pub enum ImageSource {
    Base64(String),
    Url(String),
}

/// An image persisted in the object store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredImage {
    pub id: String,
    pub url: String,
    /// True when `url` is the provider's ephemeral URL (upload failed)
    #[serde(default)]
    pub degraded: bool,
}

/// Image-generation model
#[async_trait]
pub trait ImageGenerator: Send + Sync + Debug {
    async fn generate(
        &self,
        prompt: &str,
        quality: &QualityConfig,
    ) -> Result<GeneratedImage, DomainError>;

    fn provider_name(&self) -> &'static str;
}

/// Persistent object store
#[async_trait]
pub trait ImageUploader: Send + Sync + Debug {
    async fn upload(&self, source: ImageSource) -> Result<StoredImage, DomainError>;
}
