//! Session domain - anonymized typing, prediction and cache-hit history

mod browser;
mod entity;

pub use browser::BrowserFamily;
pub use entity::{
    MAX_HISTORY, MAX_SESSION_ID_LEN, PredictionRecord, SESSION_SCHEMA_VERSION, Session,
    TypingPattern, prediction_accuracy, validate_session_id,
};
