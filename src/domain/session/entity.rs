//! Anonymized per-session typing and prediction history

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::browser::BrowserFamily;
use crate::domain::DomainError;
use crate::domain::cache::normalize_prompt;

/// Current schema version written for session records
pub const SESSION_SCHEMA_VERSION: u32 = 1;

/// Cap on each history list kept per session
pub const MAX_HISTORY: usize = 200;

pub const MAX_SESSION_ID_LEN: usize = 128;

fn default_schema_version() -> u32 {
    SESSION_SCHEMA_VERSION
}

/// One typing burst reported by the client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypingPattern {
    pub partial: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_prompt: Option<String>,
    /// Milliseconds spent typing
    pub duration: u64,
    #[serde(default)]
    pub abandoned: bool,
    pub timestamp: DateTime<Utc>,
}

/// A set of predictions offered for a partial input
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionRecord {
    pub partial: String,
    pub predictions: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_choice: Option<String>,
    #[serde(default)]
    pub accuracy: f32,
    pub confidence: f32,
    pub timestamp: DateTime<Utc>,
}

impl PredictionRecord {
    pub fn is_resolved(&self) -> bool {
        self.actual_choice.is_some()
    }
}

/// Session record stored under `session:<id>`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub session_id: String,
    #[serde(default)]
    pub prompts: Vec<String>,
    #[serde(default)]
    pub typing_patterns: Vec<TypingPattern>,
    #[serde(default)]
    pub predictions: Vec<PredictionRecord>,
    #[serde(default)]
    pub cache_hits: u64,
    #[serde(default)]
    pub cache_misses: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<BrowserFamily>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    pub fn new(session_id: impl Into<String>) -> Self {
        let now = Utc::now();

        Self {
            schema_version: SESSION_SCHEMA_VERSION,
            session_id: session_id.into(),
            prompts: Vec::new(),
            typing_patterns: Vec::new(),
            predictions: Vec::new(),
            cache_hits: 0,
            cache_misses: 0,
            user_agent: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Stores only the coarse browser family of a user agent
    pub fn set_user_agent(&mut self, user_agent: Option<&str>) {
        if let Some(ua) = user_agent {
            self.user_agent = Some(BrowserFamily::from_user_agent(ua));
        }
    }

    pub fn record_prompt(&mut self, prompt: &str) {
        let prompt = prompt.trim();

        if !prompt.is_empty() {
            push_capped(&mut self.prompts, prompt.to_string());
        }
    }

    pub fn record_cache_outcome(&mut self, hit: bool) {
        if hit {
            self.cache_hits += 1;
        } else {
            self.cache_misses += 1;
        }
    }

    /// Records a typing burst; a final prompt resolves pending predictions
    pub fn record_typing(&mut self, pattern: TypingPattern) {
        if let Some(final_prompt) = pattern.final_prompt.clone() {
            self.resolve_predictions(&final_prompt);
        }

        push_capped(&mut self.typing_patterns, pattern);
    }

    pub fn record_prediction(&mut self, record: PredictionRecord) {
        push_capped(&mut self.predictions, record);
    }

    /// Scores every unresolved prediction whose partial prefixes `final_prompt`
    pub fn resolve_predictions(&mut self, final_prompt: &str) {
        let normalized_final = normalize_prompt(final_prompt);

        for record in self.predictions.iter_mut().filter(|r| !r.is_resolved()) {
            if normalized_final.starts_with(&normalize_prompt(&record.partial)) {
                record.accuracy = prediction_accuracy(&record.predictions, final_prompt);
                record.actual_choice = Some(final_prompt.trim().to_string());
            }
        }
    }

    /// Most recent prompts, oldest first
    pub fn recent_prompts(&self, window: usize) -> Vec<String> {
        let start = self.prompts.len().saturating_sub(window);
        self.prompts[start..].to_vec()
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }
}

/// Accuracy of a prediction set against what the user finally submitted.
///
/// 1.0 for an exact normalized match, otherwise the best word-overlap
/// (Jaccard) score across the predictions.
pub fn prediction_accuracy(predictions: &[String], actual: &str) -> f32 {
    let actual_norm = normalize_prompt(actual);

    if predictions.iter().any(|p| normalize_prompt(p) == actual_norm) {
        return 1.0;
    }

    let actual_words: HashSet<&str> = actual_norm.split_whitespace().collect();

    predictions
        .iter()
        .map(|p| {
            let normalized = normalize_prompt(p);
            let words: HashSet<&str> = normalized.split_whitespace().collect();
            let union = words.union(&actual_words).count();

            if union == 0 {
                0.0
            } else {
                words.intersection(&actual_words).count() as f32 / union as f32
            }
        })
        .fold(0.0, f32::max)
}

/// Session ids are opaque client tokens: 1..=128 chars of `[A-Za-z0-9_.-]`
pub fn validate_session_id(session_id: &str) -> Result<(), DomainError> {
    if session_id.is_empty() || session_id.len() > MAX_SESSION_ID_LEN {
        return Err(DomainError::validation(format!(
            "sessionId must be 1-{} characters",
            MAX_SESSION_ID_LEN
        )));
    }

    if !session_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    {
        return Err(DomainError::validation(
            "sessionId may only contain letters, digits, '-', '_' and '.'",
        ));
    }

    Ok(())
}

fn push_capped<T>(items: &mut Vec<T>, item: T) {
    items.push(item);

    if items.len() > MAX_HISTORY {
        let excess = items.len() - MAX_HISTORY;
        items.drain(..excess);
    }
}
