//! LLM provider implementations

mod factory;
mod openai;

pub use factory::LlmProviderFactory;
pub use openai::OpenAiProvider;
