//! Cache key derivation
//!
//! Prompts are identified by their normalized form. The same normalization is
//! applied on every write and every read, so `" Cat On Table "` and
//! `"cat on table"` address the same entry.

/// Namespace for image cache entries
pub const PROMPT_NAMESPACE: &str = "prompt";

/// Namespace for anonymized session records
pub const SESSION_NAMESPACE: &str = "session";

/// Namespace for per-prompt hit counters, kept apart from the entries so
/// bookkeeping never rewrites an image record
pub const HITS_NAMESPACE: &str = "hits";

/// Normalizes a prompt into its cache identity (trim + lower-case).
///
/// Idempotent: `normalize_prompt(&normalize_prompt(p)) == normalize_prompt(p)`.
pub fn normalize_prompt(prompt: &str) -> String {
    prompt.trim().to_lowercase()
}

/// Builds the backing-store key for a prompt, normalizing it first
pub fn prompt_key(prompt: &str) -> String {
    format!("{}:{}", PROMPT_NAMESPACE, normalize_prompt(prompt))
}

/// Builds the hit-counter key for a prompt, normalizing it first
pub fn hits_key(prompt: &str) -> String {
    format!("{}:{}", HITS_NAMESPACE, normalize_prompt(prompt))
}

/// Builds the backing-store key for a session id
pub fn session_key(session_id: &str) -> String {
    format!("{}:{}", SESSION_NAMESPACE, session_id)
}

/// Prefix matching every key of a namespace (for listing)
pub fn namespace_prefix(namespace: &str) -> String {
    format!("{}:", namespace)
}

/// Strips the namespace from a store key, returning the bare identity
pub fn strip_namespace<'a>(namespace: &str, key: &'a str) -> Option<&'a str> {
    key.strip_prefix(namespace)
        .and_then(|rest| rest.strip_prefix(':'))
}
