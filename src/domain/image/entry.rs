//! Cached prompt → image record

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::provider::StoredImage;
use crate::domain::DomainError;
use crate::domain::cache::normalize_prompt;

/// Current schema version written for cache entries
pub const ENTRY_SCHEMA_VERSION: u32 = 1;

/// Longest prompt accepted, in characters
pub const MAX_PROMPT_LEN: usize = 2000;

fn default_schema_version() -> u32 {
    ENTRY_SCHEMA_VERSION
}

/// Generation profile that produced an image
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GenerationQuality {
    /// Reduced-step, low-latency pass
    Fast,
    /// Full-quality pass
    #[default]
    Final,
}

impl std::fmt::Display for GenerationQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Fast => write!(f, "fast"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// A cached image for one normalized prompt
///
/// Every entry sharing a `semantic_cluster` resolves to the same
/// `persistent_url`. The canonical entry and all of its variations carry
/// `semantic_cluster == normalize(original_prompt)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheEntry {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    /// Canonical (non-variation) prompt text
    pub original_prompt: String,
    pub persistent_url: String,
    pub provider_image_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub is_semantic_variation: bool,
    #[serde(default)]
    pub semantic_cluster: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<f32>,
    #[serde(default)]
    pub quality: GenerationQuality,
    #[serde(default)]
    pub hit_count: u64,
    /// Stored URL is the provider's ephemeral URL (upload failed)
    #[serde(default)]
    pub degraded: bool,
}

impl CacheEntry {
    /// Creates the canonical entry for a user-submitted prompt
    pub fn canonical(prompt: &str, image: &StoredImage, quality: GenerationQuality) -> Self {
        let original_prompt = prompt.trim().to_string();

        Self {
            schema_version: ENTRY_SCHEMA_VERSION,
            semantic_cluster: normalize_prompt(&original_prompt),
            original_prompt,
            persistent_url: image.url.clone(),
            provider_image_id: image.id.clone(),
            timestamp: Utc::now(),
            is_semantic_variation: false,
            quality_score: None,
            quality,
            hit_count: 0,
            degraded: image.degraded,
        }
    }

    /// Creates a paraphrase entry pointing at this entry's image
    pub fn variation(&self, quality_score: f32) -> Self {
        Self {
            schema_version: ENTRY_SCHEMA_VERSION,
            original_prompt: self.original_prompt.clone(),
            persistent_url: self.persistent_url.clone(),
            provider_image_id: self.provider_image_id.clone(),
            timestamp: Utc::now(),
            is_semantic_variation: true,
            semantic_cluster: self.cluster_id(),
            quality_score: Some(quality_score.clamp(0.0, 1.0)),
            quality: self.quality,
            hit_count: 0,
            degraded: self.degraded,
        }
    }

    /// Cluster identity, falling back to the normalized original prompt
    pub fn cluster_id(&self) -> String {
        if self.semantic_cluster.is_empty() {
            normalize_prompt(&self.original_prompt)
        } else {
            self.semantic_cluster.clone()
        }
    }

    /// Confidence that this entry matches a lookup that hit its key
    pub fn hit_confidence(&self, default_variation_score: f32) -> f32 {
        if self.is_semantic_variation {
            self.quality_score.unwrap_or(default_variation_score)
        } else {
            1.0
        }
    }
}

/// Rejects prompts that are blank or too long to be a storyboard caption
pub fn validate_prompt(prompt: &str) -> Result<(), DomainError> {
    let trimmed = prompt.trim();

    if trimmed.is_empty() {
        return Err(DomainError::validation("prompt must not be empty"));
    }

    if trimmed.chars().count() > MAX_PROMPT_LEN {
        return Err(DomainError::validation(format!(
            "prompt must be at most {} characters",
            MAX_PROMPT_LEN
        )));
    }

    Ok(())
}
