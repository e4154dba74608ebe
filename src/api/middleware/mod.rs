//! API middleware components

pub mod logging;

pub use logging::{REQUEST_ID_HEADER, RequestId, logging_middleware};
