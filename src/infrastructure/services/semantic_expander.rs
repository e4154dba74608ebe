//! Semantic expander - floods the cache with paraphrases of new prompts

use std::collections::HashSet;
use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use tracing::{debug, info, warn};

use super::ImageCacheService;
use crate::config::ExpansionConfig;
use crate::domain::cache::normalize_prompt;
use crate::domain::llm::parse_string_list;
use crate::domain::{CacheEntry, DomainError, LlmProvider, LlmRequest};
use crate::infrastructure::background::BackgroundTasks;

const SYSTEM_PROMPT: &str = "You rewrite prompts for an image generator. \
Every rewording must describe exactly the same picture: keep every subject, \
attribute, colour, count and setting. Change only wording, word order and \
articles. Reply with a JSON array of strings and nothing else.";

/// Per-run counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpansionOutcome {
    /// Usable paraphrases after filtering
    pub candidates: usize,
    pub written: usize,
    /// Keys already holding a canonical entry
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Debug)]
pub struct SemanticExpander {
    llm: Arc<dyn LlmProvider>,
    cache: Arc<ImageCacheService>,
    tasks: BackgroundTasks,
    config: ExpansionConfig,
}

impl SemanticExpander {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        cache: Arc<ImageCacheService>,
        tasks: BackgroundTasks,
        config: ExpansionConfig,
    ) -> Self {
        Self {
            llm,
            cache,
            tasks,
            config,
        }
    }

    /// Schedules expansion of a freshly generated canonical entry.
    ///
    /// Never runs in the request path; failures only reach the logs.
    pub fn schedule(self: &Arc<Self>, entry: CacheEntry, request_id: &str) {
        if !self.config.enabled || self.config.count == 0 {
            return;
        }

        let expander = self.clone();
        self.tasks.spawn("semantic_expansion", request_id, async move {
            expander.expand(&entry).await.map(|_| ())
        });
    }

    /// Asks the language model for paraphrases and writes one variation
    /// entry per usable rewording.
    ///
    /// Writes run concurrently; a failed write is logged and does not undo
    /// the others.
    pub async fn expand(&self, entry: &CacheEntry) -> Result<ExpansionOutcome, DomainError> {
        let cluster = entry.cluster_id();
        let request = LlmRequest::builder()
            .system(SYSTEM_PROMPT)
            .user(format!(
                "Write exactly {} different rewordings of this image prompt:\n\"{}\"",
                self.config.count, entry.original_prompt
            ))
            .build();

        let response = self.llm.complete(request).await?;
        debug!(
            cluster = %cluster,
            total_tokens = ?response.usage.as_ref().map(|u| u.total_tokens),
            "Paraphrase completion received"
        );
        let variations = self.usable_variations(&cluster, parse_string_list(&response.content));

        if variations.is_empty() {
            info!(cluster = %cluster, "No usable paraphrases returned");
            return Ok(ExpansionOutcome::default());
        }

        let results = join_all(
            variations
                .iter()
                .map(|variation| self.write_variation(entry, variation)),
        )
        .await;

        let mut outcome = ExpansionOutcome {
            candidates: variations.len(),
            ..Default::default()
        };

        for (variation, result) in variations.iter().zip(results) {
            match result {
                Ok(true) => outcome.written += 1,
                Ok(false) => outcome.skipped += 1,
                Err(e) => {
                    outcome.failed += 1;
                    warn!(cluster = %cluster, variation = %variation, error = %e, "Failed to store variation");
                }
            }
        }

        info!(
            cluster = %cluster,
            written = outcome.written,
            skipped = outcome.skipped,
            failed = outcome.failed,
            "Semantic expansion finished"
        );

        Ok(outcome)
    }

    /// Drops rewordings equal to the original or to each other, then caps
    /// the list at the configured count
    fn usable_variations(&self, cluster: &str, candidates: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::from([cluster.to_string()]);

        candidates
            .into_iter()
            .filter(|candidate| seen.insert(normalize_prompt(candidate)))
            .take(self.config.count)
            .collect()
    }

    /// Returns false when the key already holds a user-submitted entry
    async fn write_variation(
        &self,
        canonical: &CacheEntry,
        variation: &str,
    ) -> Result<bool, DomainError> {
        if let Some(existing) = self.cache.lookup(variation).await? {
            if !existing.is_semantic_variation {
                debug!(variation = %variation, "Keeping existing canonical entry");
                return Ok(false);
            }
        }

        self.cache
            .store(
                variation,
                &canonical.variation(self.config.variation_quality_score),
                None,
            )
            .await?;

        Ok(true)
    }
}
