//! Prompt → image cache store
//!
//! Wraps the raw key-value backend with prompt normalization, the
//! `prompt:` namespace and `CacheEntry` (de)serialization. Every read path
//! normalizes first, so lookups are insensitive to surrounding whitespace
//! and letter case.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, warn};

use crate::domain::cache::{
    Cache, CacheExt, HITS_NAMESPACE, PROMPT_NAMESPACE, SESSION_NAMESPACE, hits_key,
    namespace_prefix, normalize_prompt, prompt_key, strip_namespace,
};
use crate::domain::{CacheEntry, DomainError, GenerationQuality};

/// Key used by readiness probes
const PROBE_KEY: &str = "health:probe";

/// Shape of the cache over a bounded key sample
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsReport {
    /// Entries reported by the backend across all namespaces
    pub backend_size: usize,
    pub sampled_entries: usize,
    pub canonical_entries: usize,
    pub variation_entries: usize,
    pub clusters: usize,
    pub fast_quality_entries: usize,
    pub degraded_entries: usize,
    pub total_hits: u64,
}

/// One entry returned by cache browsing
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowsedEntry {
    /// Normalized prompt (the entry's identity)
    pub key: String,
    pub entry: CacheEntry,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClearResult {
    pub prompts_deleted: usize,
    pub sessions_deleted: usize,
}

/// Normalized-key store for `CacheEntry` records
#[derive(Debug)]
pub struct ImageCacheService {
    cache: Arc<dyn Cache>,
    entry_ttl: Option<Duration>,
}

impl ImageCacheService {
    pub fn new(cache: Arc<dyn Cache>, entry_ttl: Option<Duration>) -> Self {
        Self { cache, entry_ttl }
    }

    /// Looks up the entry for a prompt
    pub async fn lookup(&self, prompt: &str) -> Result<Option<CacheEntry>, DomainError> {
        self.cache.get(&prompt_key(prompt)).await
    }

    /// Looks up a prompt, treating backend errors as a miss
    pub async fn lookup_or_miss(&self, prompt: &str) -> Option<CacheEntry> {
        match self.lookup(prompt).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "Cache read failed, treating as miss");
                None
            }
        }
    }

    /// Writes `entry` under the normalized form of `prompt`.
    ///
    /// `ttl` overrides the configured entry expiry for this write only.
    pub async fn store(
        &self,
        prompt: &str,
        entry: &CacheEntry,
        ttl: Option<Duration>,
    ) -> Result<(), DomainError> {
        self.cache
            .set(&prompt_key(prompt), entry, ttl.or(self.entry_ttl))
            .await
    }

    /// Writes the canonical entry under its own prompt
    pub async fn store_canonical(&self, entry: &CacheEntry) -> Result<(), DomainError> {
        self.store(&entry.original_prompt, entry, None).await
    }

    /// Removes a prompt's entry and its hit counter.
    ///
    /// Returns whether an entry existed.
    pub async fn delete(&self, prompt: &str) -> Result<bool, DomainError> {
        let deleted = self.cache.delete(&prompt_key(prompt)).await?;
        self.cache.delete(&hits_key(prompt)).await?;

        Ok(deleted)
    }

    /// Increments the hit counter of a cached prompt.
    ///
    /// The counter lives under its own key, so the entry itself is never
    /// rewritten and a concurrent regeneration cannot be rolled back.
    /// Concurrent bumps may still be lost; the count is approximate.
    pub async fn record_hit(&self, prompt: &str) -> Result<(), DomainError> {
        if !self.cache.exists(&prompt_key(prompt)).await? {
            return Ok(());
        }

        let hits = self.hit_count(prompt).await?;
        self.cache
            .set(&hits_key(prompt), &(hits + 1), self.entry_ttl)
            .await
    }

    pub async fn hit_count(&self, prompt: &str) -> Result<u64, DomainError> {
        Ok(self.cache.get(&hits_key(prompt)).await?.unwrap_or(0))
    }

    /// Looks up an entry with its hit counter folded in
    async fn lookup_with_hits(&self, prompt: &str) -> Result<Option<CacheEntry>, DomainError> {
        let Some(mut entry) = self.lookup(prompt).await? else {
            return Ok(None);
        };

        match self.hit_count(prompt).await {
            Ok(hits) => entry.hit_count += hits,
            Err(e) => debug!(error = %e, "Hit counter unreadable, reporting stored count"),
        }

        Ok(Some(entry))
    }

    /// Lists up to `limit` normalized prompts, optionally by prompt prefix
    pub async fn list_keys(
        &self,
        prefix: Option<&str>,
        limit: usize,
    ) -> Result<Vec<String>, DomainError> {
        let store_prefix = format!(
            "{}{}",
            namespace_prefix(PROMPT_NAMESPACE),
            prefix.map(normalize_prompt).unwrap_or_default()
        );

        let keys = self.cache.list_keys(Some(&store_prefix), limit).await?;

        Ok(keys
            .iter()
            .filter_map(|k| strip_namespace(PROMPT_NAMESPACE, k))
            .map(str::to_string)
            .collect())
    }

    /// Fetches entries for normalized prompts in fixed-size concurrent
    /// batches, with hit counters folded in.
    ///
    /// Missing keys and unreadable records are skipped.
    pub async fn entries(
        &self,
        keys: &[String],
        batch_size: usize,
    ) -> Vec<(String, CacheEntry)> {
        let mut found = Vec::with_capacity(keys.len());

        for batch in keys.chunks(batch_size.max(1)) {
            let results = join_all(batch.iter().map(|key| self.lookup_with_hits(key))).await;

            for (key, result) in batch.iter().zip(results) {
                match result {
                    Ok(Some(entry)) => found.push((key.clone(), entry)),
                    Ok(None) => debug!(key = %key, "Entry expired while listing"),
                    Err(e) => warn!(key = %key, error = %e, "Skipping unreadable cache entry"),
                }
            }
        }

        found
    }

    pub async fn browse(
        &self,
        prefix: Option<&str>,
        limit: usize,
        batch_size: usize,
    ) -> Result<Vec<BrowsedEntry>, DomainError> {
        let keys = self.list_keys(prefix, limit).await?;

        Ok(self
            .entries(&keys, batch_size)
            .await
            .into_iter()
            .map(|(key, entry)| BrowsedEntry { key, entry })
            .collect())
    }

    pub async fn stats(
        &self,
        sample: usize,
        batch_size: usize,
    ) -> Result<CacheStatsReport, DomainError> {
        let backend_size = self.cache.size().await?;
        let keys = self.list_keys(None, sample).await?;
        let entries = self.entries(&keys, batch_size).await;

        let mut report = CacheStatsReport {
            backend_size,
            sampled_entries: entries.len(),
            ..Default::default()
        };
        let mut clusters = HashSet::new();

        for (_, entry) in &entries {
            if entry.is_semantic_variation {
                report.variation_entries += 1;
            } else {
                report.canonical_entries += 1;
            }
            if entry.quality == GenerationQuality::Fast {
                report.fast_quality_entries += 1;
            }
            if entry.degraded {
                report.degraded_entries += 1;
            }
            report.total_hits += entry.hit_count;
            clusters.insert(entry.cluster_id());
        }

        report.clusters = clusters.len();
        Ok(report)
    }

    /// Deletes every prompt entry with its hit counter, and session records
    /// when asked
    pub async fn clear(&self, include_sessions: bool) -> Result<ClearResult, DomainError> {
        let prompts_deleted = self
            .cache
            .delete_pattern(&format!("{}*", namespace_prefix(PROMPT_NAMESPACE)))
            .await?;
        self.cache
            .delete_pattern(&format!("{}*", namespace_prefix(HITS_NAMESPACE)))
            .await?;

        let sessions_deleted = if include_sessions {
            self.cache
                .delete_pattern(&format!("{}*", namespace_prefix(SESSION_NAMESPACE)))
                .await?
        } else {
            0
        };

        Ok(ClearResult {
            prompts_deleted,
            sessions_deleted,
        })
    }

    /// Round-trips the backend for readiness probes
    pub async fn check(&self) -> Result<(), DomainError> {
        self.cache.exists(PROBE_KEY).await.map(|_| ())
    }
}
