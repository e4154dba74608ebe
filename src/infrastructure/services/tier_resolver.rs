//! Tier resolver - instant / fast / final response selection
//!
//! Tiers are tried in priority order and only if the caller asked for them:
//!
//! 1. `instant`: cache hit whose confidence clears the context's floor.
//!    Never calls the image model.
//! 2. `fast`: reduced-quality generation, cached as a normal entry. If the
//!    caller also allowed `final`, a full-quality regeneration is scheduled
//!    in the background.
//! 3. `final`: full-quality generation, cached, then semantic expansion is
//!    scheduled in the background.
//!
//! Generation failures are returned as-is with no retry and nothing cached.
//! Cache failures never fail a request: reads count as misses and writes are
//! logged and dropped.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use super::{GenerationGateway, ImageCacheService, SemanticExpander};
use crate::config::TierConfig;
use crate::domain::{
    CacheEntry, DomainError, GenerationQuality, LookupContext, Tier, TierPlan, TierResolution,
};
use crate::infrastructure::background::BackgroundTasks;

/// Result of a background upgrade run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum UpgradeOutcome {
    /// Cached canonical entry is already final quality
    AlreadyFinal,
    Upgraded,
    /// Prompt was not cached; generated at final quality
    Generated,
}

/// Outcome of a cache-only lookup
#[derive(Debug, Clone)]
pub enum InstantLookup {
    Hit(TierResolution),
    /// Cached, but the entry's confidence is under the context's floor
    BelowFloor { confidence: f32 },
    Miss,
}

impl InstantLookup {
    pub fn into_hit(self) -> Option<TierResolution> {
        match self {
            Self::Hit(resolution) => Some(resolution),
            Self::BelowFloor { .. } | Self::Miss => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TierResolver {
    cache: Arc<ImageCacheService>,
    gateway: Arc<GenerationGateway>,
    expander: Arc<SemanticExpander>,
    tasks: BackgroundTasks,
    config: TierConfig,
    /// Confidence assumed for variation entries written without a score
    variation_score: f32,
}

impl TierResolver {
    pub fn new(
        cache: Arc<ImageCacheService>,
        gateway: Arc<GenerationGateway>,
        expander: Arc<SemanticExpander>,
        tasks: BackgroundTasks,
        config: TierConfig,
        variation_score: f32,
    ) -> Self {
        Self {
            cache,
            gateway,
            expander,
            tasks,
            config,
            variation_score,
        }
    }

    pub fn floor(&self, context: LookupContext) -> f32 {
        match context {
            LookupContext::QuickSuggest => self.config.quick_suggest_floor,
            LookupContext::Default => self.config.default_floor,
        }
    }

    /// Cache-only lookup; a hit below the context's floor counts as a miss
    pub async fn instant(
        &self,
        prompt: &str,
        context: LookupContext,
        request_id: &str,
    ) -> Option<TierResolution> {
        self.lookup_instant(prompt, context, request_id)
            .await
            .into_hit()
    }

    /// Cache-only lookup that tells a below-floor hit apart from a miss
    pub async fn lookup_instant(
        &self,
        prompt: &str,
        context: LookupContext,
        request_id: &str,
    ) -> InstantLookup {
        let Some(entry) = self.cache.lookup_or_miss(prompt).await else {
            return InstantLookup::Miss;
        };
        let confidence = entry.hit_confidence(self.variation_score);
        let floor = self.floor(context);

        if confidence < floor {
            debug!(confidence, floor, "Cache hit below instant floor");
            return InstantLookup::BelowFloor { confidence };
        }

        self.schedule_hit_bookkeeping(prompt, request_id);

        InstantLookup::Hit(TierResolution {
            tier: Tier::Instant,
            url: entry.persistent_url.clone(),
            confidence,
            cached: true,
            entry,
        })
    }

    /// Walks the plan and returns the first tier that produced an image.
    ///
    /// `Ok(None)` means no requested tier could answer (an instant-only miss,
    /// or a fast-only request with the fast tier disabled).
    pub async fn resolve(
        &self,
        prompt: &str,
        plan: &TierPlan,
        context: LookupContext,
        request_id: &str,
    ) -> Result<Option<TierResolution>, DomainError> {
        if plan.contains(Tier::Instant) {
            if let Some(hit) = self.instant(prompt, context, request_id).await {
                info!(tier = %Tier::Instant, confidence = hit.confidence, "Served from cache");
                return Ok(Some(hit));
            }
        }

        if plan.contains(Tier::Fast) && self.config.fast_enabled {
            let entry = self
                .generate_and_store(prompt, GenerationQuality::Fast)
                .await?;

            if plan.contains(Tier::Final) {
                self.schedule_final_upgrade(prompt, request_id);
            }

            info!(tier = %Tier::Fast, "Served fast generation");
            return Ok(Some(TierResolution {
                tier: Tier::Fast,
                url: entry.persistent_url.clone(),
                confidence: self.config.fast_confidence,
                cached: false,
                entry,
            }));
        }

        if plan.contains(Tier::Final) {
            let entry = self
                .generate_and_store(prompt, GenerationQuality::Final)
                .await?;

            self.expander.schedule(entry.clone(), request_id);

            info!(tier = %Tier::Final, "Served final generation");
            return Ok(Some(TierResolution {
                tier: Tier::Final,
                url: entry.persistent_url.clone(),
                confidence: 1.0,
                cached: false,
                entry,
            }));
        }

        Ok(None)
    }

    /// Schedules a final-quality pass for `prompt` and returns immediately
    pub fn schedule_upgrade(&self, prompt: &str, request_id: &str) {
        let resolver = self.clone();
        let prompt = prompt.to_string();
        let rid = request_id.to_string();

        self.tasks.spawn("background_upgrade", request_id, async move {
            let outcome = resolver.upgrade_to_final(&prompt, &rid).await?;
            info!(outcome = ?outcome, "Background upgrade finished");
            Ok(())
        });
    }

    /// Regenerates a prompt at final quality unless its canonical entry
    /// already is, then schedules expansion
    pub async fn upgrade_to_final(
        &self,
        prompt: &str,
        request_id: &str,
    ) -> Result<UpgradeOutcome, DomainError> {
        let existing = self.cache.lookup_or_miss(prompt).await;

        if let Some(ref entry) = existing {
            if !entry.is_semantic_variation && entry.quality == GenerationQuality::Final {
                return Ok(UpgradeOutcome::AlreadyFinal);
            }
        }

        let entry = self
            .generate_and_store(prompt, GenerationQuality::Final)
            .await?;
        self.expander.schedule(entry, request_id);

        Ok(match existing {
            Some(_) => UpgradeOutcome::Upgraded,
            None => UpgradeOutcome::Generated,
        })
    }

    /// Pre-generates a prompt at final quality when it is not cached yet.
    ///
    /// Returns false when an entry already exists.
    pub async fn warm(&self, prompt: &str, request_id: &str) -> Result<bool, DomainError> {
        if self.cache.lookup_or_miss(prompt).await.is_some() {
            debug!("Prediction already cached, skipping warm-up");
            return Ok(false);
        }

        let entry = self
            .generate_and_store(prompt, GenerationQuality::Final)
            .await?;
        self.expander.schedule(entry, request_id);

        Ok(true)
    }

    /// Generates, then writes the canonical entry before returning so an
    /// immediate instant lookup sees it. A failed write is logged only.
    async fn generate_and_store(
        &self,
        prompt: &str,
        quality: GenerationQuality,
    ) -> Result<CacheEntry, DomainError> {
        let image = self.gateway.generate(prompt, quality).await?;
        let entry = CacheEntry::canonical(prompt, &image, quality);

        if let Err(e) = self.cache.store_canonical(&entry).await {
            warn!(error = %e, quality = %quality, "Failed to cache generated image");
        }

        Ok(entry)
    }

    fn schedule_final_upgrade(&self, prompt: &str, request_id: &str) {
        let resolver = self.clone();
        let prompt = prompt.to_string();
        let rid = request_id.to_string();

        self.tasks.spawn("final_upgrade", request_id, async move {
            resolver.upgrade_to_final(&prompt, &rid).await.map(|_| ())
        });
    }

    fn schedule_hit_bookkeeping(&self, prompt: &str, request_id: &str) {
        let cache = self.cache.clone();
        let prompt = prompt.to_string();

        self.tasks.spawn("hit_bookkeeping", request_id, async move {
            cache.record_hit(&prompt).await
        });
    }
}
