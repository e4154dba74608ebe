//! Generation gateway - image model plus persistent upload

use std::sync::Arc;
use std::time::Instant;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tracing::{info, warn};
use uuid::Uuid;

use crate::domain::{
    DomainError, GeneratedImage, GenerationQuality, ImageGenerator, ImageSource, ImageUploader,
    QualityConfig, StoredImage,
};

/// Produces a stable URL for a prompt at a given quality.
///
/// Single-shot: no retries. When the upload fails but the provider served an
/// ephemeral URL, that URL is returned flagged as `degraded`.
#[derive(Debug)]
pub struct GenerationGateway {
    generator: Arc<dyn ImageGenerator>,
    uploader: Arc<dyn ImageUploader>,
    fast: QualityConfig,
    final_quality: QualityConfig,
}

impl GenerationGateway {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        uploader: Arc<dyn ImageUploader>,
        fast: QualityConfig,
        final_quality: QualityConfig,
    ) -> Self {
        Self {
            generator,
            uploader,
            fast,
            final_quality,
        }
    }

    pub fn profile(&self, quality: GenerationQuality) -> &QualityConfig {
        match quality {
            GenerationQuality::Fast => &self.fast,
            GenerationQuality::Final => &self.final_quality,
        }
    }

    pub async fn generate(
        &self,
        prompt: &str,
        quality: GenerationQuality,
    ) -> Result<StoredImage, DomainError> {
        let started = Instant::now();
        let profile = self.profile(quality);

        let generated = self.generator.generate(prompt, profile).await?;
        let source = upload_source(&generated)?;

        let stored = match self.uploader.upload(source).await {
            Ok(stored) => stored,
            Err(e) => match generated.ephemeral_url {
                Some(url) => {
                    warn!(
                        error = %e,
                        quality = %quality,
                        "Upload failed, serving the provider's ephemeral URL"
                    );
                    StoredImage {
                        id: format!("ephemeral-{}", Uuid::new_v4()),
                        url,
                        degraded: true,
                    }
                }
                None => return Err(e),
            },
        };

        info!(
            quality = %quality,
            model = %profile.model,
            image_id = %stored.id,
            degraded = stored.degraded,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Image generated"
        );

        Ok(stored)
    }
}

/// Prefers the inline payload; a payload that is not valid base64 falls back
/// to the provider URL when there is one
fn upload_source(generated: &GeneratedImage) -> Result<ImageSource, DomainError> {
    if let Some(ref data) = generated.base64 {
        match STANDARD.decode(data) {
            Ok(bytes) if !bytes.is_empty() => return Ok(ImageSource::Base64(data.clone())),
            Ok(_) => warn!("Provider returned an empty image payload"),
            Err(e) => warn!(error = %e, "Provider returned invalid base64"),
        }
    }

    generated
        .ephemeral_url
        .clone()
        .map(ImageSource::Url)
        .ok_or_else(|| DomainError::provider("image-generator", "No usable image in response"))
}
