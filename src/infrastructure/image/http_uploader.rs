use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::{DomainError, ImageSource, ImageUploader, StoredImage};
use crate::infrastructure::http_client::HttpClientTrait;

/// Object-store upload service returning a stable delivery URL
#[derive(Debug)]
pub struct HttpImageUploader<C: HttpClientTrait> {
    client: C,
    auth_header: String,
    base_url: String,
}

impl<C: HttpClientTrait> HttpImageUploader<C> {
    pub fn new(client: C, api_key: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            client,
            auth_header: format!("Bearer {}", api_key.into()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn build_request(source: &ImageSource) -> serde_json::Value {
        match source {
            ImageSource::Base64(data) => serde_json::json!({ "base64": data }),
            ImageSource::Url(url) => serde_json::json!({ "sourceUrl": url }),
        }
    }
}

#[async_trait]
impl<C: HttpClientTrait> ImageUploader for HttpImageUploader<C> {
    async fn upload(&self, source: ImageSource) -> Result<StoredImage, DomainError> {
        let url = format!("{}/images", self.base_url);
        let headers = vec![
            ("Authorization", self.auth_header.as_str()),
            ("Content-Type", "application/json"),
        ];

        let json = self
            .client
            .post_json(&url, headers, &Self::build_request(&source))
            .await
            .map_err(|e| DomainError::provider("uploader", e.to_string()))?;

        let uploaded: UploadResponse = serde_json::from_value(json).map_err(|e| {
            DomainError::provider("uploader", format!("Failed to parse response: {}", e))
        })?;

        if uploaded.url.trim().is_empty() {
            return Err(DomainError::provider("uploader", "Upload returned an empty url"));
        }

        Ok(StoredImage {
            id: uploaded.id,
            url: uploaded.url,
            degraded: false,
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    id: String,
    url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::http_client::mock::MockHttpClient;

    const URL: &str = "https://store.test/images";

    #[tokio::test]
    async fn test_upload_base64() {
        let client = MockHttpClient::new().with_response(
            URL,
            serde_json::json!({"id": "obj-7", "url": "https://cdn.test/obj-7.png"}),
        );
        let uploader = HttpImageUploader::new(client, "key", "https://store.test");

        let stored = uploader
            .upload(ImageSource::Base64("aGVsbG8=".into()))
            .await
            .unwrap();

        assert_eq!(stored.id, "obj-7");
        assert_eq!(stored.url, "https://cdn.test/obj-7.png");
        assert!(!stored.degraded);

        let (_, body) = uploader.client.requests().pop().unwrap();
        assert_eq!(body["base64"], "aGVsbG8=");
    }

    #[tokio::test]
    async fn test_upload_from_url() {
        let client = MockHttpClient::new().with_response(
            URL,
            serde_json::json!({"id": "obj-8", "url": "https://cdn.test/obj-8.png"}),
        );
        let uploader = HttpImageUploader::new(client, "key", "https://store.test");

        uploader
            .upload(ImageSource::Url("https://tmp.test/1.png".into()))
            .await
            .unwrap();

        let (_, body) = uploader.client.requests().pop().unwrap();
        assert_eq!(body["sourceUrl"], "https://tmp.test/1.png");
    }

    #[tokio::test]
    async fn test_upload_failure() {
        let client = MockHttpClient::new().with_error(URL, "bucket unavailable");
        let uploader = HttpImageUploader::new(client, "key", "https://store.test");

        let result = uploader.upload(ImageSource::Base64("x".into())).await;
        assert!(matches!(result, Err(DomainError::Provider { .. })));
    }
}
