//! Infrastructure layer - Backends, provider adapters and services

pub mod background;
pub mod cache;
pub mod http_client;
pub mod image;
pub mod llm;
pub mod logging;
pub mod services;
