//! Cache domain - key-value backing store abstraction and key derivation

mod key;
mod repository;

pub use key::{
    HITS_NAMESPACE, PROMPT_NAMESPACE, SESSION_NAMESPACE, hits_key, namespace_prefix,
    normalize_prompt, prompt_key, session_key, strip_namespace,
};
pub use repository::{Cache, CacheExt};
pub(crate) use repository::glob_to_regex;

#[cfg(test)]
pub use repository::mock::MockCache;
