//! Tolerant parsing of language-model output
//!
//! Model output is never trusted to be well-formed JSON. Each parser tries
//! strict JSON first, then JSON embedded in surrounding prose or a code
//! fence, then a pattern-based fallback, and finally yields an empty result.
//! Parse failures never become errors.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use tracing::debug;

static QUOTED_STRING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""((?:[^"\\]|\\.)*)""#).expect("valid quoted-string regex"));

static INDEX_GROUP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\s*(\d+(?:\s*,\s*\d+)+)\s*\]").expect("valid index-group regex"));

/// Extracts a list of strings from model output
pub fn parse_string_list(text: &str) -> Vec<String> {
    let parsed = parse_json_array::<Vec<String>>(text).unwrap_or_else(|| {
        debug!("LLM output is not a JSON string array, falling back to quoted strings");
        extract_quoted_strings(text)
    });

    parsed
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Extracts groups of integer indices (e.g. `[[0, 3], [2, 5]]`) from model output
pub fn parse_index_groups(text: &str) -> Vec<Vec<usize>> {
    if let Some(groups) = parse_json_array::<Vec<Vec<usize>>>(text) {
        return groups;
    }

    debug!("LLM output is not a JSON index array, falling back to bracket groups");

    INDEX_GROUP
        .captures_iter(text)
        .map(|caps| {
            caps[1]
                .split(',')
                .filter_map(|n| n.trim().parse::<usize>().ok())
                .collect()
        })
        .collect()
}

/// Parses the whole text, or the outermost `[...]` span within it, as JSON
fn parse_json_array<T: DeserializeOwned>(text: &str) -> Option<T> {
    let trimmed = text.trim();

    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Some(value);
    }

    let start = trimmed.find('[')?;
    let end = trimmed.rfind(']')?;

    if end <= start {
        return None;
    }

    serde_json::from_str::<T>(&trimmed[start..=end]).ok()
}

fn extract_quoted_strings(text: &str) -> Vec<String> {
    QUOTED_STRING
        .captures_iter(text)
        .map(|caps| caps[1].replace("\\\"", "\"").replace("\\\\", "\\"))
        .collect()
}
