//! User analytics - anonymized session tracking and behaviour aggregation

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeDelta, Utc};
use futures::future::join_all;
use tracing::{debug, info, warn};

use crate::config::AnalyticsConfig;
use crate::domain::analytics::{AnalyticsParams, AnalyticsReport, aggregate_sessions};
use crate::domain::cache::{SESSION_NAMESPACE, namespace_prefix};
use crate::domain::session::{PredictionRecord, validate_session_id};
use crate::domain::{Cache, CacheExt, DomainError, Session, TypingPattern, session_key};

/// Read-modify-write store for `Session` records.
///
/// Every write refreshes the record's expiry; records are never deleted here.
/// Concurrent events for one session race last-write-wins.
#[derive(Debug)]
pub struct UserAnalytics {
    cache: Arc<dyn Cache>,
    config: AnalyticsConfig,
}

impl UserAnalytics {
    pub fn new(cache: Arc<dyn Cache>, config: AnalyticsConfig) -> Self {
        Self { cache, config }
    }

    pub async fn session(&self, session_id: &str) -> Result<Option<Session>, DomainError> {
        self.cache.get(&session_key(session_id)).await
    }

    /// Records a submitted prompt and whether it was served from the cache
    pub async fn track_session(
        &self,
        session_id: &str,
        prompt: &str,
        cache_hit: bool,
        user_agent: Option<&str>,
    ) -> Result<(), DomainError> {
        self.update(session_id, |session| {
            session.set_user_agent(user_agent);
            session.record_prompt(prompt);
            session.record_cache_outcome(cache_hit);
        })
        .await
    }

    /// Records a typing burst; a final prompt also resolves pending predictions
    pub async fn track_typing_pattern(
        &self,
        session_id: &str,
        pattern: TypingPattern,
        user_agent: Option<&str>,
    ) -> Result<(), DomainError> {
        self.update(session_id, |session| {
            session.set_user_agent(user_agent);
            session.record_typing(pattern);
        })
        .await
    }

    /// Records predictions offered for a partial input, unresolved until the
    /// user submits a final prompt
    pub async fn track_prediction(
        &self,
        session_id: &str,
        partial: &str,
        predictions: &[String],
        confidence: f32,
        user_agent: Option<&str>,
    ) -> Result<(), DomainError> {
        let record = PredictionRecord {
            partial: partial.trim().to_string(),
            predictions: predictions.to_vec(),
            actual_choice: None,
            accuracy: 0.0,
            confidence,
            timestamp: Utc::now(),
        };

        self.update(session_id, |session| {
            session.set_user_agent(user_agent);
            session.record_prediction(record);
        })
        .await
    }

    /// Latest prompts of a session, oldest first; unreadable sessions yield none
    pub async fn recent_prompts(&self, session_id: &str, window: usize) -> Vec<String> {
        match self.session(session_id).await {
            Ok(Some(session)) => session.recent_prompts(window),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(error = %e, "Failed to read session history");
                Vec::new()
            }
        }
    }

    /// Aggregates a bounded sample of sessions into a behaviour report
    pub async fn analyze(&self, current_threshold: f32) -> Result<AnalyticsReport, DomainError> {
        let keys = self
            .cache
            .list_keys(
                Some(&namespace_prefix(SESSION_NAMESPACE)),
                self.config.key_sample,
            )
            .await?;

        let sessions = self.load_sessions(&keys).await;
        let params = AnalyticsParams {
            top_prompts: self.config.top_prompts,
            recent_window: TimeDelta::days(self.config.recent_window_days),
            current_threshold,
        };

        let report = aggregate_sessions(&sessions, params, Utc::now());

        info!(
            sessions = report.total_sessions,
            insights = report.insights.len(),
            suggested_threshold = report.suggested_threshold,
            "User behaviour analysis finished"
        );

        Ok(report)
    }

    fn ttl(&self) -> Option<Duration> {
        Some(self.config.session_ttl())
    }

    async fn update<F>(&self, session_id: &str, mutate: F) -> Result<(), DomainError>
    where
        F: FnOnce(&mut Session),
    {
        validate_session_id(session_id)?;
        let key = session_key(session_id);

        let mut session = match self.cache.get::<Session>(&key).await? {
            Some(session) => session,
            None => {
                debug!(session_id = %session_id, "Creating session record");
                Session::new(session_id)
            }
        };

        mutate(&mut session);
        session.touch();

        self.cache.set(&key, &session, self.ttl()).await
    }

    async fn load_sessions(&self, keys: &[String]) -> Vec<Session> {
        let mut sessions = Vec::with_capacity(keys.len());

        for batch in keys.chunks(self.config.batch_size.max(1)) {
            let results = join_all(batch.iter().map(|key| self.cache.get::<Session>(key))).await;

            for (key, result) in batch.iter().zip(results) {
                match result {
                    Ok(Some(session)) => sessions.push(session),
                    Ok(None) => {}
                    Err(e) => warn!(key = %key, error = %e, "Skipping unreadable session"),
                }
            }
        }

        sessions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cache::MockCache;
    use crate::domain::{BrowserFamily, analytics::InsightKind};

    const CHROME_UA: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

    fn analytics() -> (UserAnalytics, Arc<MockCache>) {
        let cache = Arc::new(MockCache::new());
        (
            UserAnalytics::new(cache.clone(), AnalyticsConfig::default()),
            cache,
        )
    }

    fn typing(partial: &str, final_prompt: Option<&str>, abandoned: bool) -> TypingPattern {
        TypingPattern {
            partial: partial.to_string(),
            final_prompt: final_prompt.map(str::to_string),
            duration: 1200,
            abandoned,
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_track_session_creates_record_with_ttl() {
        let (analytics, cache) = analytics();

        analytics
            .track_session("s-1", "a lion", false, Some(CHROME_UA))
            .await
            .unwrap();
        analytics
            .track_session("s-1", "a lion in a suit", true, None)
            .await
            .unwrap();

        let session = analytics.session("s-1").await.unwrap().unwrap();
        assert_eq!(session.prompts, vec!["a lion", "a lion in a suit"]);
        assert_eq!(session.cache_hits, 1);
        assert_eq!(session.cache_misses, 1);
        assert_eq!(session.user_agent, Some(BrowserFamily::Chrome));

        assert_eq!(
            cache.ttl_of("session:s-1"),
            Some(Duration::from_secs(30 * 24 * 60 * 60))
        );
    }

    #[tokio::test]
    async fn test_invalid_session_id_is_rejected() {
        let (analytics, cache) = analytics();

        let result = analytics
            .track_session("bad id!", "a lion", false, None)
            .await;

        assert!(matches!(result, Err(DomainError::Validation { .. })));
        assert_eq!(cache.write_count(), 0);
    }

    #[tokio::test]
    async fn test_final_prompt_resolves_prediction() {
        let (analytics, _) = analytics();
        let predictions = vec![
            "a lion wearing sunglasses".to_string(),
            "a lion wearing a crown".to_string(),
        ];

        analytics
            .track_prediction("s-1", "a lion wear", &predictions, 0.6, None)
            .await
            .unwrap();
        analytics
            .track_typing_pattern(
                "s-1",
                typing("a lion wear", Some("A lion wearing sunglasses"), false),
                None,
            )
            .await
            .unwrap();

        let session = analytics.session("s-1").await.unwrap().unwrap();
        let record = &session.predictions[0];
        assert_eq!(record.actual_choice.as_deref(), Some("A lion wearing sunglasses"));
        assert_eq!(record.accuracy, 1.0);
        assert_eq!(session.typing_patterns.len(), 1);
    }

    #[tokio::test]
    async fn test_recent_prompts() {
        let (analytics, _) = analytics();

        for i in 1..=4 {
            analytics
                .track_session("s-1", &format!("scene {}", i), false, None)
                .await
                .unwrap();
        }

        assert_eq!(
            analytics.recent_prompts("s-1", 2).await,
            vec!["scene 3", "scene 4"]
        );
        assert!(analytics.recent_prompts("unknown", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_recent_prompts_survives_read_failure() {
        let analytics = UserAnalytics::new(
            Arc::new(MockCache::new().with_failing_reads()),
            AnalyticsConfig::default(),
        );

        assert!(analytics.recent_prompts("s-1", 5).await.is_empty());
    }

    #[tokio::test]
    async fn test_analyze_aggregates_sessions() {
        let (analytics, _) = analytics();

        for (session, prompts) in [("s-1", 7), ("s-2", 5)] {
            for i in 0..prompts {
                analytics
                    .track_session(session, &format!("shot {}", i % 3), i % 2 == 0, Some(CHROME_UA))
                    .await
                    .unwrap();
            }
        }
        analytics
            .track_typing_pattern("s-2", typing("a dr", None, true), None)
            .await
            .unwrap();
        analytics
            .track_typing_pattern("s-2", typing("a dragon", Some("a dragon"), false), None)
            .await
            .unwrap();

        let report = analytics.analyze(0.4).await.unwrap();

        assert_eq!(report.total_sessions, 2);
        assert!((report.average_prompts_per_session - 6.0).abs() < 1e-9);
        assert_eq!(report.top_prompts[0].prompt, "shot 0");
        assert_eq!(report.browser_distribution.get("chrome"), Some(&2));
        assert!((report.abandonment_rate - 0.5).abs() < 1e-9);
        assert!(
            report
                .insights
                .iter()
                .any(|i| i.kind == InsightKind::MultiPromptWarmCache)
        );
        assert!(
            report
                .insights
                .iter()
                .any(|i| i.kind == InsightKind::UxSimplification)
        );
        assert_eq!(report.suggested_threshold, 0.4);
    }

    #[tokio::test]
    async fn test_analyze_skips_unreadable_sessions() {
        let cache = Arc::new(MockCache::new().with_entry("session:broken", &"not a session", None));
        let analytics = UserAnalytics::new(cache, AnalyticsConfig::default());
        analytics
            .track_session("s-1", "a lion", true, None)
            .await
            .unwrap();

        let report = analytics.analyze(0.4).await.unwrap();

        assert_eq!(report.total_sessions, 1);
        assert_eq!(report.cache_hit_rate, 1.0);
    }

    #[tokio::test]
    async fn test_analyze_ignores_prompt_entries() {
        let cache = Arc::new(MockCache::new().with_entry("prompt:a cat", &"entry", None));
        let analytics = UserAnalytics::new(cache, AnalyticsConfig::default());

        let report = analytics.analyze(0.4).await.unwrap();

        assert_eq!(report.total_sessions, 0);
    }
}
