//! Predictive engine - completes partial prompts and warms the cache ahead
//! of submission

use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::Serialize;
use tracing::{debug, info, warn};

use super::TierResolver;
use crate::config::PredictionConfig;
use crate::domain::analytics::{MAX_THRESHOLD, MIN_THRESHOLD};
use crate::domain::cache::normalize_prompt;
use crate::domain::llm::parse_string_list;
use crate::domain::{LlmProvider, LlmRequest, prediction_confidence};
use crate::infrastructure::background::BackgroundTasks;

const SYSTEM_PROMPT: &str = "You predict how a user will finish typing an image prompt \
for a storyboard. Reply with a JSON array of complete prompts, most likely first, \
and nothing else.";

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PredictionResult {
    pub predictions: Vec<String>,
    pub confidence: f32,
    /// Predictions handed to background warming
    pub warming: usize,
}

#[derive(Debug)]
pub struct PredictiveEngine {
    llm: Arc<dyn LlmProvider>,
    resolver: Arc<TierResolver>,
    tasks: BackgroundTasks,
    config: PredictionConfig,
    /// Warming threshold as `f32` bits, retunable at runtime
    threshold: AtomicU32,
}

impl PredictiveEngine {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        resolver: Arc<TierResolver>,
        tasks: BackgroundTasks,
        config: PredictionConfig,
    ) -> Self {
        let threshold = AtomicU32::new(config.confidence_threshold.to_bits());

        Self {
            llm,
            resolver,
            tasks,
            config,
            threshold,
        }
    }

    pub fn threshold(&self) -> f32 {
        f32::from_bits(self.threshold.load(Ordering::Relaxed))
    }

    /// Replaces the warming threshold, clamped to the tunable range
    pub fn set_threshold(&self, value: f32) -> f32 {
        let clamped = value.clamp(MIN_THRESHOLD, MAX_THRESHOLD);
        self.threshold.store(clamped.to_bits(), Ordering::Relaxed);
        info!(threshold = clamped, "Prediction threshold updated");
        clamped
    }

    /// Predicts completions for `partial`, warming the cache when confident.
    ///
    /// Never fails: short input, a disabled engine or a language-model error
    /// all yield an empty result.
    pub async fn predict(
        &self,
        partial: &str,
        recent_prompts: &[String],
        request_id: &str,
    ) -> PredictionResult {
        let partial = partial.trim();

        if !self.config.enabled || partial.chars().count() < self.config.min_partial_len {
            return PredictionResult::default();
        }

        let response = match self.llm.complete(self.build_request(partial, recent_prompts)).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Prediction request failed");
                return PredictionResult::default();
            }
        };

        let predictions = self.usable_predictions(parse_string_list(&response.content));
        let confidence =
            prediction_confidence(partial, &predictions, self.config.prediction_count);
        let threshold = self.threshold();

        let warming = if confidence > threshold {
            self.schedule_warming(&predictions, request_id)
        } else {
            debug!(confidence, threshold, "Prediction below warming threshold");
            0
        };

        info!(
            returned = predictions.len(),
            confidence,
            warming,
            "Typing prediction finished"
        );

        PredictionResult {
            predictions,
            confidence,
            warming,
        }
    }

    fn build_request(&self, partial: &str, recent_prompts: &[String]) -> LlmRequest {
        let start = recent_prompts
            .len()
            .saturating_sub(self.config.context_window);
        let context = &recent_prompts[start..];

        let mut text = String::new();
        if !context.is_empty() {
            text.push_str("Recent prompts from this user:\n");
            for prompt in context {
                text.push_str(&format!("- {}\n", prompt));
            }
            text.push('\n');
        }
        text.push_str(&format!(
            "Give exactly {} likely completions of: \"{}\"",
            self.config.prediction_count, partial
        ));

        LlmRequest::builder().system(SYSTEM_PROMPT).user(text).build()
    }

    fn usable_predictions(&self, candidates: Vec<String>) -> Vec<String> {
        let mut seen = HashSet::new();

        candidates
            .into_iter()
            .filter(|p| seen.insert(normalize_prompt(p)))
            .take(self.config.prediction_count)
            .collect()
    }

    /// Schedules one warm-up per prediction, the i-th delayed by
    /// `i * stagger` to spread load on the image provider
    fn schedule_warming(&self, predictions: &[String], request_id: &str) -> usize {
        let stagger = self.config.stagger();

        for (index, prediction) in predictions.iter().enumerate() {
            let resolver = self.resolver.clone();
            let prompt = prediction.clone();
            let rid = request_id.to_string();
            let delay = stagger * index as u32;

            self.tasks.spawn("predictive_warming", request_id, async move {
                tokio::time::sleep(delay).await;

                if resolver.warm(&prompt, &rid).await? {
                    info!(prompt = %prompt, "Warmed predicted prompt");
                }
                Ok(())
            });
        }

        predictions.len()
    }
}
