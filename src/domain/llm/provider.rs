use async_trait::async_trait;
use std::fmt::Debug;

use super::{LlmRequest, LlmResponse};
use crate::domain::DomainError;

/// Paraphrase/completion language model
///
/// The returned text is freeform. Callers must never assume it holds
/// well-formed JSON; see `parse_string_list`.
#[async_trait]
pub trait LlmProvider: Send + Sync + Debug {
    /// Send a completion request
    async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, DomainError>;

    /// Get the provider name
    fn provider_name(&self) -> &'static str;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Scripted LLM: returns queued replies in order, then the fallback reply
    #[derive(Debug, Default)]
    pub struct MockLlmProvider {
        replies: Mutex<Vec<String>>,
        fallback: Option<String>,
        error: Option<String>,
        calls: AtomicUsize,
        requests: Mutex<Vec<LlmRequest>>,
    }

    impl MockLlmProvider {
        pub fn new() -> Self {
            Self::default()
        }

        /// Always answer with `content`
        pub fn with_response(mut self, content: impl Into<String>) -> Self {
            self.fallback = Some(content.into());
            self
        }

        /// Answer with `content` once, before any fallback
        pub fn with_reply(self, content: impl Into<String>) -> Self {
            self.replies.lock().unwrap().push(content.into());
            self
        }

        pub fn with_error(mut self, error: impl Into<String>) -> Self {
            self.error = Some(error.into());
            self
        }

        pub fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn last_user_text(&self) -> Option<String> {
            self.requests
                .lock()
                .unwrap()
                .last()
                .and_then(|r| r.user_text().map(str::to_string))
        }

        pub fn last_temperature(&self) -> Option<f32> {
            self.requests.lock().unwrap().last().and_then(|r| r.temperature)
        }
    }

    #[async_trait]
    impl LlmProvider for MockLlmProvider {
        async fn complete(&self, request: LlmRequest) -> Result<LlmResponse, DomainError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests.lock().unwrap().push(request);

            if let Some(ref error) = self.error {
                return Err(DomainError::provider("mock-llm", error));
            }

            let queued = {
                let mut replies = self.replies.lock().unwrap();
                if replies.is_empty() {
                    None
                } else {
                    Some(replies.remove(0))
                }
            };

            queued
                .or_else(|| self.fallback.clone())
                .map(|content| LlmResponse::new("mock-1", "mock-model", content))
                .ok_or_else(|| DomainError::provider("mock-llm", "No mock response configured"))
        }

        fn provider_name(&self) -> &'static str {
            "mock-llm"
        }
    }
}
