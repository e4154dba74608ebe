//! In-memory cache implementation using moka

use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache as MokaCache;

use crate::domain::DomainError;
use crate::domain::cache::{Cache, glob_to_regex};

/// Configuration for in-memory cache
#[derive(Debug, Clone)]
pub struct InMemoryCacheConfig {
    /// Maximum number of entries
    pub max_capacity: u64,
}

impl Default for InMemoryCacheConfig {
    fn default() -> Self {
        Self {
            max_capacity: 100_000,
        }
    }
}

impl InMemoryCacheConfig {
    pub fn with_max_capacity(mut self, capacity: u64) -> Self {
        self.max_capacity = capacity;
        self
    }
}

/// Value stored in moka
#[derive(Debug, Clone)]
struct StoredValue {
    /// Serialized JSON value
    data: String,
    /// Expiration timestamp (millis since epoch); `None` never expires
    expires_at: Option<u64>,
}

impl StoredValue {
    fn is_expired(&self, now: u64) -> bool {
        self.expires_at.is_some_and(|at| now > at)
    }
}

/// Thread-safe in-memory cache implementation using moka
///
/// Expiry is per entry and checked lazily on access; capacity eviction is
/// left to moka.
#[derive(Debug)]
pub struct InMemoryCache {
    cache: MokaCache<String, StoredValue>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self::with_config(InMemoryCacheConfig::default())
    }

    pub fn with_config(config: InMemoryCacheConfig) -> Self {
        Self {
            cache: MokaCache::builder()
                .max_capacity(config.max_capacity)
                .build(),
        }
    }

    fn current_time_millis() -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    /// Live keys accepted by `filter`, sorted for stable listing
    async fn collect_keys<F>(&self, filter: F) -> Result<Vec<String>, DomainError>
    where
        F: Fn(&str) -> bool + Send + 'static,
    {
        self.cache.run_pending_tasks().await;

        let now = Self::current_time_millis();
        let cache_clone = self.cache.clone();
        let mut keys: Vec<String> = tokio::task::spawn_blocking(move || {
            cache_clone
                .iter()
                .filter(|(k, v)| !v.is_expired(now) && filter(k.as_str()))
                .map(|(k, _)| k.as_ref().clone())
                .collect()
        })
        .await
        .map_err(|e| DomainError::cache(format!("Failed to iterate cache: {}", e)))?;

        keys.sort();
        Ok(keys)
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get_raw(&self, key: &str) -> Result<Option<String>, DomainError> {
        match self.cache.get(key).await {
            Some(entry) => {
                if entry.is_expired(Self::current_time_millis()) {
                    self.cache.remove(key).await;
                    return Ok(None);
                }

                Ok(Some(entry.data))
            }
            None => Ok(None),
        }
    }

    async fn set_raw(
        &self,
        key: &str,
        value: &str,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        let entry = StoredValue {
            data: value.to_string(),
            expires_at: ttl.map(|ttl| Self::current_time_millis() + ttl.as_millis() as u64),
        };

        self.cache.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, DomainError> {
        Ok(self.cache.remove(key).await.is_some())
    }

    async fn delete_pattern(&self, pattern: &str) -> Result<usize, DomainError> {
        let regex = glob_to_regex(pattern)?;
        let keys = self.collect_keys(move |k| regex.is_match(k)).await?;

        for key in &keys {
            self.cache.remove(key).await;
        }

        Ok(keys.len())
    }

    async fn list_keys(
        &self,
        prefix: Option<&str>,
        limit: usize,
    ) -> Result<Vec<String>, DomainError> {
        let prefix = prefix.unwrap_or_default().to_string();
        let mut keys = self.collect_keys(move |k| k.starts_with(&prefix)).await?;

        keys.truncate(limit);
        Ok(keys)
    }

    async fn size(&self) -> Result<usize, DomainError> {
        self.cache.run_pending_tasks().await;
        Ok(self.cache.entry_count() as usize)
    }
}
