//! Cluster domain - grouping of cache entries by shared image

mod analysis;
mod entity;

pub use analysis::{
    EXPANSION_EFFICIENCY_FLOOR, build_optimization, cluster_efficiency, compute_stats,
    group_entries, resolve_duplicate_groups,
};
pub use entity::{ClusterAnalysis, ClusterGroup, ClusterStats, DuplicateGroup, OptimizationReport};
