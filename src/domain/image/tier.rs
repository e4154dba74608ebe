//! Delivery tiers and the request plan built from them

use serde::{Deserialize, Serialize};

use super::entry::CacheEntry;
use crate::domain::DomainError;

/// Quality/latency class of a response, in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Instant,
    Fast,
    Final,
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instant => write!(f, "instant"),
            Self::Fast => write!(f, "fast"),
            Self::Final => write!(f, "final"),
        }
    }
}

/// Which instant-confidence floor applies to a lookup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LookupContext {
    /// Suggest-as-you-go lookups, accept lower-confidence paraphrase hits
    QuickSuggest,
    #[default]
    Default,
}

/// Ordered, de-duplicated set of tiers a caller allows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierPlan {
    tiers: Vec<Tier>,
}

impl TierPlan {
    /// Builds a plan from caller input.
    ///
    /// Tiers are sorted into priority order (instant, fast, final) and
    /// truncated to `max_tiers`. An empty tier list means all three.
    pub fn new(tiers: &[Tier], max_tiers: Option<usize>) -> Result<Self, DomainError> {
        let mut tiers: Vec<Tier> = if tiers.is_empty() {
            vec![Tier::Instant, Tier::Fast, Tier::Final]
        } else {
            tiers.to_vec()
        };

        tiers.sort();
        tiers.dedup();

        if let Some(max) = max_tiers {
            if max == 0 {
                return Err(DomainError::validation("maxTiers must be at least 1"));
            }
            tiers.truncate(max);
        }

        Ok(Self { tiers })
    }

    pub fn instant_only() -> Self {
        Self {
            tiers: vec![Tier::Instant],
        }
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn contains(&self, tier: Tier) -> bool {
        self.tiers.contains(&tier)
    }
}

/// Outcome of resolving a prompt through a tier plan
#[derive(Debug, Clone)]
pub struct TierResolution {
    pub tier: Tier,
    pub url: String,
    pub confidence: f32,
    /// True when served from the cache without generating
    pub cached: bool,
    pub entry: CacheEntry,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_sorts_and_dedups() {
        let plan = TierPlan::new(&[Tier::Final, Tier::Instant, Tier::Final], None).unwrap();
        assert_eq!(plan.tiers(), &[Tier::Instant, Tier::Final]);
    }

    #[test]
    fn test_plan_empty_means_all() {
        let plan = TierPlan::new(&[], None).unwrap();
        assert_eq!(plan.tiers(), &[Tier::Instant, Tier::Fast, Tier::Final]);
    }

    #[test]
    fn test_plan_truncates_to_max_tiers() {
        let plan = TierPlan::new(&[Tier::Final, Tier::Fast, Tier::Instant], Some(2)).unwrap();
        assert_eq!(plan.tiers(), &[Tier::Instant, Tier::Fast]);
    }

    #[test]
    fn test_plan_rejects_zero_max() {
        assert!(TierPlan::new(&[Tier::Instant], Some(0)).is_err());
    }

    #[test]
    fn test_tier_serialization() {
        assert_eq!(serde_json::to_string(&Tier::Instant).unwrap(), "\"instant\"");
        let tier: Tier = serde_json::from_str("\"final\"").unwrap();
        assert_eq!(tier, Tier::Final);
    }
}
