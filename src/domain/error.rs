use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    /// Image generation, upload or LLM call failed or timed out
    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    /// Backing key-value store read or write failed
    #[error("Cache error: {message}")]
    Cache { message: String },
}

impl DomainError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// True when the error came from the backing store
    pub fn is_cache(&self) -> bool {
        matches!(self, Self::Cache { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error() {
        let error = DomainError::validation("Prompt cannot be empty");
        assert_eq!(error.to_string(), "Validation error: Prompt cannot be empty");
    }

    #[test]
    fn test_provider_error() {
        let error = DomainError::provider("image", "timeout");
        assert_eq!(error.to_string(), "Provider error: image - timeout");
    }

    #[test]
    fn test_is_cache() {
        assert!(DomainError::cache("down").is_cache());
        assert!(!DomainError::internal("boom").is_cache());
    }
}
