//! Language model domain models and traits

mod message;
mod parse;
mod provider;
mod request;
mod response;

pub use message::{Message, MessageRole};
pub use parse::{parse_index_groups, parse_string_list};
pub use provider::LlmProvider;
pub use request::{LlmRequest, LlmRequestBuilder};
pub use response::{LlmResponse, Usage};

#[cfg(test)]
pub use provider::mock::MockLlmProvider;
