//! Cluster analysis report types

use serde::{Deserialize, Serialize};

/// Entries sharing one generated image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterGroup {
    /// Normalized canonical prompt
    pub id: String,
    pub original_prompt: String,
    /// Keys (normalized paraphrases) of the variation entries
    pub variations: Vec<String>,
    pub image_url: String,
    /// Canonical entries plus variations seen in the sample
    pub size: usize,
    pub efficiency: f64,
}

impl ClusterGroup {
    pub fn variation_count(&self) -> usize {
        self.variations.len()
    }
}

/// Distinct clusters the language model judged to depict the same concept
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicateGroup {
    pub concepts: Vec<String>,
    pub image_urls: Vec<String>,
    /// Canonical prompt of the cluster to keep
    pub recommended_merge: String,
    /// Generated images that merging would make redundant
    pub savings_estimate: usize,
    /// Cluster ids in the group, kept cluster first
    #[serde(default)]
    pub cluster_ids: Vec<String>,
}

/// Cleanup, merge and expansion recommendations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OptimizationReport {
    /// Under-paraphrased clusters (efficiency < 0.5, size > 1)
    pub expansion_opportunities: Vec<String>,
    /// Clusters never reused (size == 1)
    pub cleanup_candidates: Vec<String>,
    pub merge_recommendations: Vec<String>,
    pub total_estimated_savings: usize,
}

/// Aggregate cache shape
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterStats {
    pub total_entries: usize,
    pub total_clusters: usize,
    pub original_prompt_count: usize,
    pub semantic_variation_count: usize,
    pub average_cluster_size: f64,
    pub average_efficiency: f64,
    /// semanticVariationCount / originalPromptCount
    pub storage_utilization: f64,
    /// duplicateEntryCount / totalEntries
    pub duplicate_rate: f64,
}

/// Full output of a cluster analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterAnalysis {
    pub clusters: Vec<ClusterGroup>,
    pub duplicates: Vec<DuplicateGroup>,
    pub optimization: OptimizationReport,
    pub stats: ClusterStats,
}
