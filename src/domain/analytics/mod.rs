//! Analytics domain - session aggregation and threshold feedback

mod report;

pub use report::{
    AnalyticsParams, AnalyticsReport, Insight, InsightKind, MAX_THRESHOLD, MIN_THRESHOLD,
    PromptFrequency, aggregate_sessions, suggested_threshold,
};
