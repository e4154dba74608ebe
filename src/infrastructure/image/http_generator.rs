use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{DomainError, GeneratedImage, ImageGenerator, QualityConfig};
use crate::infrastructure::http_client::HttpClientTrait;

/// Image model behind an OpenAI-images-compatible endpoint
#[derive(Debug)]
pub struct HttpImageGenerator<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> HttpImageGenerator<C> {
    pub fn new(client: C, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn generations_url(&self) -> String {
        format!("{}/v1/images/generations", self.base_url)
    }

    fn build_request(prompt: &str, quality: &QualityConfig) -> serde_json::Value {
        serde_json::json!({
            "model": quality.model,
            "prompt": prompt,
            "n": 1,
            "size": quality.size(),
            "steps": quality.steps,
            "response_format": "b64_json",
        })
    }
}

#[async_trait]
impl<C: HttpClientTrait> ImageGenerator for HttpImageGenerator<C> {
    async fn generate(
        &self,
        prompt: &str,
        quality: &QualityConfig,
    ) -> Result<GeneratedImage, DomainError> {
        let headers = vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ];
        let body = Self::build_request(prompt, quality);

        let json = self
            .client
            .post_json(&self.generations_url(), headers, &body)
            .await
            .map_err(|e| DomainError::provider(self.provider_name(), e.to_string()))?;

        let response: ImagesResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider(
                self.provider_name(),
                format!("Failed to parse response: {}", e),
            )
        })?;

        let image = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider(self.provider_name(), "No image in response"))?;

        if image.b64_json.is_none() && image.url.is_none() {
            return Err(DomainError::provider(
                self.provider_name(),
                "Image has neither b64_json nor url",
            ));
        }

        Ok(GeneratedImage {
            base64: image.b64_json,
            ephemeral_url: image.url,
        })
    }

    fn provider_name(&self) -> &'static str {
        "image-generator"
    }
}

#[derive(Debug, Deserialize)]
struct ImagesResponse {
    #[serde(default)]
    data: Vec<ImageData>,
}

#[derive(Debug, Deserialize)]
struct ImageData {
    b64_json: Option<String>,
    url: Option<String>,
}
