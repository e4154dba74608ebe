//! Cluster analyzer - read-only redundancy report over the image cache

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use super::ImageCacheService;
use crate::config::AnalysisConfig;
use crate::domain::cluster::{
    ClusterAnalysis, ClusterGroup, DuplicateGroup, build_optimization, compute_stats,
    group_entries, resolve_duplicate_groups,
};
use crate::domain::llm::parse_index_groups;
use crate::domain::{DomainError, LlmProvider, LlmRequest};

const SYSTEM_PROMPT: &str = "You compare image prompts. Two prompts are duplicates \
when they would produce essentially the same picture. Reply with a JSON array of \
index groups, for example [[0, 3], [2, 5]], listing only groups of two or more \
duplicates. Reply with [] when there are none.";

/// Groups cached entries into clusters and recommends cleanups.
///
/// Never mutates the cache.
#[derive(Debug)]
pub struct ClusterAnalyzer {
    llm: Arc<dyn LlmProvider>,
    cache: Arc<ImageCacheService>,
    config: AnalysisConfig,
}

impl ClusterAnalyzer {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        cache: Arc<ImageCacheService>,
        config: AnalysisConfig,
    ) -> Self {
        Self { llm, cache, config }
    }

    pub async fn analyze(&self) -> Result<ClusterAnalysis, DomainError> {
        let started = Instant::now();

        let keys = self.cache.list_keys(None, self.config.key_sample).await?;
        let entries = self.cache.entries(&keys, self.config.batch_size).await;
        let clusters = group_entries(&entries);
        let duplicates = self.detect_duplicates(&clusters).await;

        let analysis = ClusterAnalysis {
            optimization: build_optimization(&clusters, &duplicates),
            stats: compute_stats(&clusters, &duplicates),
            clusters,
            duplicates,
        };

        info!(
            keys = keys.len(),
            clusters = analysis.stats.total_clusters,
            duplicates = analysis.duplicates.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Cluster analysis finished"
        );

        Ok(analysis)
    }

    /// Asks the language model which of the largest clusters depict the
    /// same concept. Best effort: any failure means no duplicates.
    async fn detect_duplicates(&self, clusters: &[ClusterGroup]) -> Vec<DuplicateGroup> {
        let sample = &clusters[..clusters.len().min(self.config.duplicate_sample)];

        if sample.len() < 2 {
            return Vec::new();
        }

        let listing: String = sample
            .iter()
            .enumerate()
            .map(|(i, cluster)| format!("{}. {}\n", i, cluster.original_prompt))
            .collect();

        let request = LlmRequest::builder()
            .system(SYSTEM_PROMPT)
            .user(format!(
                "Which of these prompts are duplicates of each other?\n{}",
                listing
            ))
            .temperature(0.0)
            .build();

        match self.llm.complete(request).await {
            Ok(response) => {
                let groups = parse_index_groups(&response.content);
                debug!(groups = groups.len(), "Duplicate index groups returned");
                resolve_duplicate_groups(sample, &groups)
            }
            Err(e) => {
                warn!(error = %e, "Duplicate detection failed, reporting none");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;
    use crate::domain::llm::MockLlmProvider;
    use crate::domain::{CacheEntry, GenerationQuality, StoredImage};

    async fn seeded_cache() -> Arc<ImageCacheService> {
        let service = Arc::new(ImageCacheService::new(Arc::new(MockCache::new()), None));

        let fixtures = [
            ("A lion wearing sunglasses", 1, &["lion in sunglasses", "sunglasses lion", "a lion with shades"][..]),
            ("A lion in shades", 2, &["shaded lion"][..]),
            ("A red car", 3, &[][..]),
        ];

        for (prompt, n, variations) in fixtures {
            let canonical = CacheEntry::canonical(
                prompt,
                &StoredImage {
                    id: format!("img-{}", n),
                    url: format!("https://cdn.example.com/img-{}.png", n),
                    degraded: false,
                },
                GenerationQuality::Final,
            );
            service.store_canonical(&canonical).await.unwrap();
            for variation in variations {
                service.store(variation, &canonical.variation(0.9), None).await.unwrap();
            }
        }

        service
    }

    fn analyzer(llm: MockLlmProvider, cache: Arc<ImageCacheService>) -> (ClusterAnalyzer, Arc<MockLlmProvider>) {
        let llm = Arc::new(llm);
        (
            ClusterAnalyzer::new(llm.clone(), cache, AnalysisConfig::default()),
            llm,
        )
    }

    #[tokio::test]
    async fn test_analysis_groups_and_recommends() {
        let (analyzer, llm) = analyzer(
            MockLlmProvider::new().with_response("[[0, 1]]"),
            seeded_cache().await,
        );

        let analysis = analyzer.analyze().await.unwrap();

        assert_eq!(analysis.clusters.len(), 3);
        let lion = &analysis.clusters[0];
        assert_eq!(lion.id, "a lion wearing sunglasses");
        assert_eq!(lion.size, 4);
        assert_eq!(lion.efficiency, 3.0);

        // Listing sent to the model is numbered largest cluster first
        let sent = llm.last_user_text().unwrap();
        assert!(sent.contains("0. A lion wearing sunglasses"));
        assert!(sent.contains("1. A lion in shades"));
        assert_eq!(llm.last_temperature(), Some(0.0));

        assert_eq!(analysis.duplicates.len(), 1);
        let dup = &analysis.duplicates[0];
        assert_eq!(dup.recommended_merge, "A lion wearing sunglasses");
        assert_eq!(dup.savings_estimate, 1);

        assert_eq!(analysis.optimization.cleanup_candidates, vec!["a red car"]);
        assert!(analysis.optimization.expansion_opportunities.is_empty());
        assert_eq!(analysis.optimization.total_estimated_savings, 1);

        assert_eq!(analysis.stats.total_entries, 7);
        assert_eq!(analysis.stats.original_prompt_count, 3);
        assert_eq!(analysis.stats.semantic_variation_count, 4);
        // The merged "a lion in shades" cluster holds 2 of 7 entries
        assert!((analysis.stats.duplicate_rate - 2.0 / 7.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_llm_failure_reports_no_duplicates() {
        let (analyzer, _) = analyzer(MockLlmProvider::new().with_error("llm down"), seeded_cache().await);

        let analysis = analyzer.analyze().await.unwrap();

        assert_eq!(analysis.clusters.len(), 3);
        assert!(analysis.duplicates.is_empty());
        assert_eq!(analysis.stats.duplicate_rate, 0.0);
    }

    #[tokio::test]
    async fn test_malformed_reply_reports_no_duplicates() {
        let (analyzer, _) = analyzer(
            MockLlmProvider::new().with_response("Prompts 0 and 7 look alike: [[0, 7], [42]]"),
            seeded_cache().await,
        );

        let analysis = analyzer.analyze().await.unwrap();

        assert!(analysis.duplicates.is_empty());
    }

    #[tokio::test]
    async fn test_single_cluster_skips_duplicate_detection() {
        let service = Arc::new(ImageCacheService::new(Arc::new(MockCache::new()), None));
        let entry = CacheEntry::canonical(
            "a cat",
            &StoredImage {
                id: "img-1".into(),
                url: "https://cdn.example.com/img-1.png".into(),
                degraded: false,
            },
            GenerationQuality::Final,
        );
        service.store_canonical(&entry).await.unwrap();
        let (analyzer, llm) = analyzer(MockLlmProvider::new().with_response("[[0, 1]]"), service);

        let analysis = analyzer.analyze().await.unwrap();

        assert_eq!(analysis.clusters.len(), 1);
        assert_eq!(llm.call_count(), 0);
    }

    #[tokio::test]
    async fn test_empty_cache() {
        let service = Arc::new(ImageCacheService::new(Arc::new(MockCache::new()), None));
        let (analyzer, _) = analyzer(MockLlmProvider::new(), service);

        let analysis = analyzer.analyze().await.unwrap();

        assert_eq!(analysis, ClusterAnalysis::default());
    }

    #[tokio::test]
    async fn test_backend_failure_is_an_error() {
        let service = Arc::new(ImageCacheService::new(
            Arc::new(MockCache::new().with_failing_reads()),
            None,
        ));
        let (analyzer, _) = analyzer(MockLlmProvider::new(), service);

        assert!(matches!(analyzer.analyze().await, Err(DomainError::Cache { .. })));
    }
}
