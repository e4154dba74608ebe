use std::sync::Arc;
use std::time::Duration;

use super::OpenAiProvider;
use crate::config::LlmProviderConfig;
use crate::domain::{DomainError, LlmProvider};
use crate::infrastructure::http_client::HttpClient;

/// Factory for creating the paraphrase/completion provider
#[derive(Debug)]
pub struct LlmProviderFactory;

impl LlmProviderFactory {
    pub fn create(config: &LlmProviderConfig) -> Result<Arc<dyn LlmProvider>, DomainError> {
        if config.base_url.trim().is_empty() {
            return Err(DomainError::configuration("LLM base_url must not be empty"));
        }

        if config.model.trim().is_empty() {
            return Err(DomainError::configuration("LLM model must not be empty"));
        }

        let http_client = HttpClient::with_timeout(Duration::from_secs(config.timeout_secs))?;
        let provider = OpenAiProvider::with_base_url(
            http_client,
            &config.api_key,
            &config.model,
            &config.base_url,
        )
        .with_defaults(config.temperature, config.max_tokens);

        Ok(Arc::new(provider))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_from_defaults() {
        let provider = LlmProviderFactory::create(&LlmProviderConfig::default()).unwrap();
        assert_eq!(provider.provider_name(), "openai");
    }

    #[test]
    fn test_rejects_missing_model() {
        let config = LlmProviderConfig {
            model: " ".to_string(),
            ..Default::default()
        };

        assert!(LlmProviderFactory::create(&config).is_err());
    }
}
