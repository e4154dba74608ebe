//! Image cache domain - entries, tiers and provider contracts

mod entry;
mod provider;
mod tier;

pub use entry::{CacheEntry, ENTRY_SCHEMA_VERSION, GenerationQuality, MAX_PROMPT_LEN, validate_prompt};
pub use provider::{
    GeneratedImage, ImageGenerator, ImageSource, ImageUploader, QualityConfig, StoredImage,
};
pub use tier::{LookupContext, Tier, TierPlan, TierResolution};

#[cfg(test)]
pub use provider::mock::{MockImageGenerator, MockImageUploader};
