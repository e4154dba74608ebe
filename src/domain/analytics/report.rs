//! Aggregation of session records into behaviour insights

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::cache::normalize_prompt;
use crate::domain::session::Session;

/// Sessions averaging more prompts than this benefit from multi-prompt warming
pub const MULTI_PROMPT_SESSION_LENGTH: f64 = 5.0;
/// Recent accuracy below this calls for prediction tuning
pub const LOW_ACCURACY: f64 = 0.4;
/// Recent accuracy above this allows a more eager prediction threshold
pub const HIGH_ACCURACY: f64 = 0.7;
/// Abandonment rate above this calls for a simpler input UX
pub const HIGH_ABANDONMENT: f64 = 0.2;

pub const THRESHOLD_RAISE: f32 = 0.1;
pub const THRESHOLD_LOWER: f32 = 0.05;
pub const MIN_THRESHOLD: f32 = 0.2;
pub const MAX_THRESHOLD: f32 = 0.9;

/// Rule-based recommendation kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    MultiPromptWarmCache,
    PredictionTuning,
    UxSimplification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Insight {
    pub kind: InsightKind,
    pub message: String,
}

impl Insight {
    fn new(kind: InsightKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFrequency {
    pub prompt: String,
    pub count: usize,
}

/// Tunables for one aggregation run
#[derive(Debug, Clone, Copy)]
pub struct AnalyticsParams {
    pub top_prompts: usize,
    pub recent_window: Duration,
    pub current_threshold: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub total_sessions: usize,
    pub average_prompts_per_session: f64,
    pub top_prompts: Vec<PromptFrequency>,
    /// Mean accuracy over every resolved prediction
    pub average_prediction_accuracy: f64,
    /// Mean accuracy over predictions resolved inside the recent window
    pub recent_prediction_accuracy: Option<f64>,
    pub resolved_predictions: usize,
    pub cache_hit_rate: f64,
    pub abandonment_rate: f64,
    pub browser_distribution: BTreeMap<String, usize>,
    pub insights: Vec<Insight>,
    pub current_threshold: f32,
    pub suggested_threshold: f32,
}

/// Aggregates session records as of `now`
pub fn aggregate_sessions(
    sessions: &[Session],
    params: AnalyticsParams,
    now: DateTime<Utc>,
) -> AnalyticsReport {
    let total_sessions = sessions.len();
    let total_prompts: usize = sessions.iter().map(|s| s.prompts.len()).sum();
    let average_prompts_per_session = mean_of(total_prompts as f64, total_sessions);

    let mut frequency: HashMap<String, usize> = HashMap::new();
    for prompt in sessions.iter().flat_map(|s| s.prompts.iter()) {
        *frequency.entry(normalize_prompt(prompt)).or_default() += 1;
    }
    let mut top_prompts: Vec<PromptFrequency> = frequency
        .into_iter()
        .map(|(prompt, count)| PromptFrequency { prompt, count })
        .collect();
    top_prompts.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.prompt.cmp(&b.prompt)));
    top_prompts.truncate(params.top_prompts);

    let recent_cutoff = now - params.recent_window;
    let resolved: Vec<_> = sessions
        .iter()
        .flat_map(|s| s.predictions.iter())
        .filter(|p| p.is_resolved())
        .collect();
    let recent: Vec<f64> = resolved
        .iter()
        .filter(|p| p.timestamp >= recent_cutoff)
        .map(|p| p.accuracy as f64)
        .collect();

    let average_prediction_accuracy = mean_of(
        resolved.iter().map(|p| p.accuracy as f64).sum(),
        resolved.len(),
    );
    let recent_prediction_accuracy =
        (!recent.is_empty()).then(|| recent.iter().sum::<f64>() / recent.len() as f64);

    let hits: u64 = sessions.iter().map(|s| s.cache_hits).sum();
    let misses: u64 = sessions.iter().map(|s| s.cache_misses).sum();
    let cache_hit_rate = mean_of(hits as f64, (hits + misses) as usize);

    let patterns: Vec<_> = sessions.iter().flat_map(|s| s.typing_patterns.iter()).collect();
    let abandoned = patterns.iter().filter(|p| p.abandoned).count();
    let abandonment_rate = mean_of(abandoned as f64, patterns.len());

    let mut browser_distribution = BTreeMap::new();
    for session in sessions {
        if let Some(family) = session.user_agent {
            *browser_distribution
                .entry(family.as_str().to_string())
                .or_default() += 1;
        }
    }

    let mut insights = Vec::new();
    if average_prompts_per_session > MULTI_PROMPT_SESSION_LENGTH {
        insights.push(Insight::new(
            InsightKind::MultiPromptWarmCache,
            format!(
                "Sessions average {:.1} prompts; warm the cache for several follow-up prompts",
                average_prompts_per_session
            ),
        ));
    }
    if let Some(accuracy) = recent_prediction_accuracy.filter(|a| *a < LOW_ACCURACY) {
        insights.push(Insight::new(
            InsightKind::PredictionTuning,
            format!(
                "Recent prediction accuracy is {:.2}; tune the completion model or widen its context",
                accuracy
            ),
        ));
    }
    if abandonment_rate > HIGH_ABANDONMENT {
        insights.push(Insight::new(
            InsightKind::UxSimplification,
            format!(
                "{:.0}% of typing sessions are abandoned; simplify prompt entry",
                abandonment_rate * 100.0
            ),
        ));
    }

    AnalyticsReport {
        total_sessions,
        average_prompts_per_session,
        top_prompts,
        average_prediction_accuracy,
        recent_prediction_accuracy,
        resolved_predictions: resolved.len(),
        cache_hit_rate,
        abandonment_rate,
        browser_distribution,
        insights,
        current_threshold: params.current_threshold,
        suggested_threshold: suggested_threshold(
            params.current_threshold,
            recent_prediction_accuracy,
        ),
    }
}

/// Next prediction confidence threshold given recent accuracy.
///
/// Raised when predictions miss, lowered when they land; unchanged without data.
pub fn suggested_threshold(current: f32, recent_accuracy: Option<f64>) -> f32 {
    let next = match recent_accuracy {
        Some(a) if a < LOW_ACCURACY => current + THRESHOLD_RAISE,
        Some(a) if a > HIGH_ACCURACY => current - THRESHOLD_LOWER,
        _ => current,
    };

    next.clamp(MIN_THRESHOLD, MAX_THRESHOLD)
}

fn mean_of(total: f64, count: usize) -> f64 {
    if count == 0 { 0.0 } else { total / count as f64 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::{PredictionRecord, TypingPattern};

    fn params() -> AnalyticsParams {
        AnalyticsParams {
            top_prompts: 2,
            recent_window: Duration::days(7),
            current_threshold: 0.4,
        }
    }

    fn prediction(accuracy: f32, age_days: i64) -> PredictionRecord {
        PredictionRecord {
            partial: "a li".to_string(),
            predictions: vec!["a lion".to_string()],
            actual_choice: Some("a lion".to_string()),
            accuracy,
            confidence: 0.5,
            timestamp: Utc::now() - Duration::days(age_days),
        }
    }

    fn typing(abandoned: bool) -> TypingPattern {
        TypingPattern {
            partial: "a".to_string(),
            final_prompt: None,
            duration: 100,
            abandoned,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_empty_report() {
        let report = aggregate_sessions(&[], params(), Utc::now());

        assert_eq!(report.total_sessions, 0);
        assert_eq!(report.cache_hit_rate, 0.0);
        assert!(report.recent_prediction_accuracy.is_none());
        assert!(report.insights.is_empty());
        assert_eq!(report.suggested_threshold, 0.4);
    }

    #[test]
    fn test_aggregates_counts_and_rates() {
        let mut a = Session::new("a");
        for p in ["A cat", "a cat ", "a dog"] {
            a.record_prompt(p);
        }
        a.cache_hits = 3;
        a.cache_misses = 1;
        a.set_user_agent(Some("Mozilla/5.0 Gecko/20100101 Firefox/120.0"));
        a.typing_patterns.push(typing(false));

        let mut b = Session::new("b");
        b.record_prompt("a bird");
        b.cache_misses = 4;
        b.typing_patterns.push(typing(false));

        let report = aggregate_sessions(&[a, b], params(), Utc::now());

        assert_eq!(report.total_sessions, 2);
        assert_eq!(report.average_prompts_per_session, 2.0);
        assert_eq!(report.top_prompts[0].prompt, "a cat");
        assert_eq!(report.top_prompts[0].count, 2);
        assert_eq!(report.top_prompts.len(), 2);
        assert!((report.cache_hit_rate - 3.0 / 8.0).abs() < 1e-9);
        assert_eq!(report.abandonment_rate, 0.0);
        assert_eq!(report.browser_distribution.get("firefox"), Some(&1));
    }

    #[test]
    fn test_insight_rules() {
        let mut session = Session::new("heavy");
        for i in 0..6 {
            session.record_prompt(&format!("scene {}", i));
        }
        session.predictions.push(prediction(0.1, 1));
        session.predictions.push(prediction(0.9, 30));
        session.typing_patterns.push(typing(true));
        session.typing_patterns.push(typing(false));

        let report = aggregate_sessions(&[session], params(), Utc::now());
        let kinds: Vec<InsightKind> = report.insights.iter().map(|i| i.kind).collect();

        assert_eq!(
            kinds,
            vec![
                InsightKind::MultiPromptWarmCache,
                InsightKind::PredictionTuning,
                InsightKind::UxSimplification,
            ]
        );
        assert_eq!(report.resolved_predictions, 2);
        assert!((report.average_prediction_accuracy - 0.5).abs() < 1e-6);
        assert!((report.recent_prediction_accuracy.unwrap() - 0.1).abs() < 1e-6);
        assert!((report.suggested_threshold - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_unresolved_predictions_are_ignored() {
        let mut session = Session::new("s");
        let mut pending = prediction(0.0, 0);
        pending.actual_choice = None;
        session.predictions.push(pending);

        let report = aggregate_sessions(&[session], params(), Utc::now());
        assert_eq!(report.resolved_predictions, 0);
        assert!(report.recent_prediction_accuracy.is_none());
    }

    #[test]
    fn test_suggested_threshold_is_clamped() {
        assert!((suggested_threshold(0.4, Some(0.2)) - 0.5).abs() < 1e-6);
        assert!((suggested_threshold(0.4, Some(0.8)) - 0.35).abs() < 1e-6);
        assert_eq!(suggested_threshold(0.4, Some(0.5)), 0.4);
        assert_eq!(suggested_threshold(0.85, Some(0.1)), MAX_THRESHOLD);
        assert_eq!(suggested_threshold(0.22, Some(0.9)), MIN_THRESHOLD);
        assert_eq!(suggested_threshold(0.4, None), 0.4);
    }
}
