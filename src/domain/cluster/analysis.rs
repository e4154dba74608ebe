//! Pure cluster grouping, duplicate mapping and statistics

use std::collections::{HashMap, HashSet};

use super::entity::{ClusterGroup, ClusterStats, DuplicateGroup, OptimizationReport};
use crate::domain::image::CacheEntry;

/// Clusters below this efficiency (with more than one entry) need more paraphrases
pub const EXPANSION_EFFICIENCY_FLOOR: f64 = 0.5;

/// Paraphrase entries per canonical entry: `variations / max(1, size - variations)`
pub fn cluster_efficiency(size: usize, variations: usize) -> f64 {
    let canonical = size.saturating_sub(variations).max(1);
    variations as f64 / canonical as f64
}

/// Groups `(key, entry)` pairs by semantic cluster.
///
/// Clusters come back largest first, ties broken by id.
pub fn group_entries(entries: &[(String, CacheEntry)]) -> Vec<ClusterGroup> {
    let mut groups: HashMap<String, ClusterGroup> = HashMap::new();
    let mut has_canonical: HashSet<String> = HashSet::new();

    for (key, entry) in entries {
        let cluster_id = entry.cluster_id();
        let group = groups
            .entry(cluster_id.clone())
            .or_insert_with(|| ClusterGroup {
                id: cluster_id.clone(),
                original_prompt: entry.original_prompt.clone(),
                variations: Vec::new(),
                image_url: entry.persistent_url.clone(),
                size: 0,
                efficiency: 0.0,
            });

        group.size += 1;

        if entry.is_semantic_variation {
            group.variations.push(key.clone());
        } else if has_canonical.insert(cluster_id) {
            group.original_prompt = entry.original_prompt.clone();
            group.image_url = entry.persistent_url.clone();
        }
    }

    let mut clusters: Vec<ClusterGroup> = groups
        .into_values()
        .map(|mut group| {
            group.variations.sort();
            group.efficiency = cluster_efficiency(group.size, group.variations.len());
            group
        })
        .collect();

    clusters.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.id.cmp(&b.id)));
    clusters
}

/// Maps index groups returned by the language model onto clusters.
///
/// Out-of-range, repeated and already-claimed indices are dropped; groups
/// left with fewer than two clusters are discarded. The largest cluster of
/// each group is the one to keep.
pub fn resolve_duplicate_groups(
    sample: &[ClusterGroup],
    index_groups: &[Vec<usize>],
) -> Vec<DuplicateGroup> {
    let mut claimed: HashSet<usize> = HashSet::new();
    let mut duplicates = Vec::new();

    for indices in index_groups {
        let mut members: Vec<usize> = Vec::new();

        for &index in indices {
            if index < sample.len() && !claimed.contains(&index) && !members.contains(&index) {
                members.push(index);
            }
        }

        if members.len() < 2 {
            continue;
        }

        claimed.extend(members.iter().copied());

        // Keep the largest cluster; earliest index wins ties
        let keep_pos = members
            .iter()
            .enumerate()
            .max_by(|(pa, a), (pb, b)| {
                sample[**a]
                    .size
                    .cmp(&sample[**b].size)
                    .then_with(|| pb.cmp(pa))
            })
            .map(|(pos, _)| pos)
            .unwrap_or(0);
        members.swap(0, keep_pos);

        let clusters: Vec<&ClusterGroup> = members.iter().map(|&i| &sample[i]).collect();

        duplicates.push(DuplicateGroup {
            concepts: clusters.iter().map(|c| c.original_prompt.clone()).collect(),
            image_urls: clusters.iter().map(|c| c.image_url.clone()).collect(),
            recommended_merge: clusters[0].original_prompt.clone(),
            savings_estimate: clusters.len() - 1,
            cluster_ids: clusters.iter().map(|c| c.id.clone()).collect(),
        });
    }

    duplicates
}

/// Derives recommendations from clusters and duplicate groups
pub fn build_optimization(
    clusters: &[ClusterGroup],
    duplicates: &[DuplicateGroup],
) -> OptimizationReport {
    let expansion_opportunities = clusters
        .iter()
        .filter(|c| c.size > 1 && c.efficiency < EXPANSION_EFFICIENCY_FLOOR)
        .map(|c| c.id.clone())
        .collect();

    let cleanup_candidates = clusters
        .iter()
        .filter(|c| c.size == 1)
        .map(|c| c.id.clone())
        .collect();

    let merge_recommendations = duplicates
        .iter()
        .map(|d| {
            format!(
                "Merge {} clusters into '{}'",
                d.concepts.len(),
                d.recommended_merge
            )
        })
        .collect();

    OptimizationReport {
        expansion_opportunities,
        cleanup_candidates,
        merge_recommendations,
        total_estimated_savings: duplicates.iter().map(|d| d.savings_estimate).sum(),
    }
}

/// Aggregate statistics over the sampled clusters
pub fn compute_stats(clusters: &[ClusterGroup], duplicates: &[DuplicateGroup]) -> ClusterStats {
    let total_entries: usize = clusters.iter().map(|c| c.size).sum();
    let semantic_variation_count: usize = clusters.iter().map(|c| c.variation_count()).sum();
    let original_prompt_count = total_entries - semantic_variation_count;
    let total_clusters = clusters.len();

    let sizes: HashMap<&str, usize> = clusters.iter().map(|c| (c.id.as_str(), c.size)).collect();

    // Entries in clusters that a merge would retire (every member but the kept one)
    let duplicate_entry_count: usize = duplicates
        .iter()
        .flat_map(|d| d.cluster_ids.iter().skip(1))
        .filter_map(|id| sizes.get(id.as_str()))
        .sum();

    ClusterStats {
        total_entries,
        total_clusters,
        original_prompt_count,
        semantic_variation_count,
        average_cluster_size: ratio(total_entries, total_clusters),
        average_efficiency: if total_clusters == 0 {
            0.0
        } else {
            clusters.iter().map(|c| c.efficiency).sum::<f64>() / total_clusters as f64
        },
        storage_utilization: ratio(semantic_variation_count, original_prompt_count),
        duplicate_rate: ratio(duplicate_entry_count, total_entries),
    }
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::{GenerationQuality, StoredImage};

    fn canonical(prompt: &str, url: &str) -> (String, CacheEntry) {
        let image = StoredImage {
            id: url.to_string(),
            url: url.to_string(),
            degraded: false,
        };
        let entry = CacheEntry::canonical(prompt, &image, GenerationQuality::Final);
        (entry.semantic_cluster.clone(), entry)
    }

    fn variation(of: &(String, CacheEntry), key: &str) -> (String, CacheEntry) {
        (key.to_string(), of.1.variation(0.9))
    }

    fn cluster(id: &str, size: usize, variations: usize) -> ClusterGroup {
        ClusterGroup {
            id: id.to_string(),
            original_prompt: id.to_uppercase(),
            variations: (0..variations).map(|i| format!("{}-{}", id, i)).collect(),
            image_url: format!("https://cdn/{}.png", id),
            size,
            efficiency: cluster_efficiency(size, variations),
        }
    }

    #[test]
    fn test_efficiency_examples() {
        assert_eq!(cluster_efficiency(1, 0), 0.0);
        assert_eq!(cluster_efficiency(4, 3), 3.0);
        // Only variations sampled: denominator floors at one
        assert_eq!(cluster_efficiency(2, 2), 2.0);
    }

    #[test]
    fn test_group_entries_by_cluster() {
        let lion = canonical("A lion wearing sunglasses", "https://cdn/lion.png");
        let car = canonical("A red car", "https://cdn/car.png");
        let entries = vec![
            variation(&lion, "a lion with sunglasses"),
            lion.clone(),
            variation(&lion, "lion wearing shades"),
            variation(&lion, "sunglasses on a lion"),
            car.clone(),
        ];

        let clusters = group_entries(&entries);

        assert_eq!(clusters.len(), 2);
        let first = &clusters[0];
        assert_eq!(first.id, "a lion wearing sunglasses");
        assert_eq!(first.original_prompt, "A lion wearing sunglasses");
        assert_eq!(first.size, 4);
        assert_eq!(first.variation_count(), 3);
        assert_eq!(first.efficiency, 3.0);
        assert_eq!(first.image_url, "https://cdn/lion.png");

        let second = &clusters[1];
        assert_eq!(second.size, 1);
        assert_eq!(second.efficiency, 0.0);
    }

    #[test]
    fn test_group_entries_falls_back_to_original_prompt() {
        let mut orphan = canonical("A Blue Bird", "https://cdn/bird.png");
        orphan.1.semantic_cluster.clear();

        let clusters = group_entries(&[orphan]);
        assert_eq!(clusters[0].id, "a blue bird");
    }

    #[test]
    fn test_resolve_duplicates_guards_indices() {
        let sample = vec![cluster("a", 3, 2), cluster("b", 5, 4), cluster("c", 1, 0)];
        let groups = vec![
            vec![0, 1, 99],  // out of range index dropped
            vec![1, 2],      // 1 already claimed → single member, discarded
            vec![2, 2],      // repeated index → single member, discarded
        ];

        let duplicates = resolve_duplicate_groups(&sample, &groups);

        assert_eq!(duplicates.len(), 1);
        let dup = &duplicates[0];
        assert_eq!(dup.recommended_merge, "B");
        assert_eq!(dup.cluster_ids, vec!["b", "a"]);
        assert_eq!(dup.savings_estimate, 1);
        assert_eq!(dup.image_urls.len(), 2);
    }

    #[test]
    fn test_resolve_duplicates_empty_sample() {
        assert!(resolve_duplicate_groups(&[], &[vec![0, 1]]).is_empty());
    }

    #[test]
    fn test_build_optimization() {
        let clusters = vec![cluster("big", 4, 3), cluster("thin", 3, 1), cluster("single", 1, 0)];
        let duplicates = vec![DuplicateGroup {
            concepts: vec!["BIG".into(), "THIN".into()],
            image_urls: vec![],
            recommended_merge: "BIG".into(),
            savings_estimate: 1,
            cluster_ids: vec!["big".into(), "thin".into()],
        }];

        let report = build_optimization(&clusters, &duplicates);

        assert_eq!(report.expansion_opportunities, vec!["thin"]);
        assert_eq!(report.cleanup_candidates, vec!["single"]);
        assert_eq!(report.total_estimated_savings, 1);
        assert_eq!(report.merge_recommendations.len(), 1);
    }

    #[test]
    fn test_compute_stats() {
        let clusters = vec![cluster("big", 4, 3), cluster("thin", 3, 1), cluster("single", 1, 0)];
        let duplicates = vec![DuplicateGroup {
            concepts: vec![],
            image_urls: vec![],
            recommended_merge: "BIG".into(),
            savings_estimate: 1,
            cluster_ids: vec!["big".into(), "single".into()],
        }];

        let stats = compute_stats(&clusters, &duplicates);

        assert_eq!(stats.total_entries, 8);
        assert_eq!(stats.total_clusters, 3);
        assert_eq!(stats.semantic_variation_count, 4);
        assert_eq!(stats.original_prompt_count, 4);
        assert!((stats.average_cluster_size - 8.0 / 3.0).abs() < 1e-9);
        assert!((stats.storage_utilization - 1.0).abs() < 1e-9);
        assert!((stats.duplicate_rate - 1.0 / 8.0).abs() < 1e-9);
        // (3.0 + 0.5 + 0.0) / 3
        assert!((stats.average_efficiency - 3.5 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_compute_stats_empty() {
        let stats = compute_stats(&[], &[]);
        assert_eq!(stats, ClusterStats::default());
    }
}
