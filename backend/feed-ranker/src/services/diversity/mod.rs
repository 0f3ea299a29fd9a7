use crate::models::CandidateItem;
use std::collections::HashMap;
use tracing::debug;

/// Lists at or below this size pass through untouched.
const MIN_LIST_SIZE: usize = 10;

/// Exposure Balancer - per-creator exposure floor
///
/// Guarantees every creator present in the ranked list its first
/// `min_exposure` items ahead of any creator's remaining items:
///
/// ```text
/// min_exposure = max(1, floor(total * min_pct))
/// output       = guaranteed(c1) ++ guaranteed(c2) ++ ... ++ excess(c1) ++ excess(c2) ++ ...
/// ```
///
/// Creators are ordered by first appearance in the ranked list, and each
/// creator's items keep their ranked order. Global score order is therefore
/// not preserved across creators.
pub struct ExposureBalancer {
    min_pct: f64,
}

impl Default for ExposureBalancer {
    fn default() -> Self {
        Self::new(0.02)
    }
}

impl ExposureBalancer {
    pub fn new(min_pct: f64) -> Self {
        Self { min_pct }
    }

    pub fn min_exposure(&self, total: usize) -> usize {
        ((total as f64 * self.min_pct).floor() as usize).max(1)
    }

    pub fn balance(&self, ranked: Vec<CandidateItem>) -> Vec<CandidateItem> {
        let total = ranked.len();
        if total <= MIN_LIST_SIZE {
            return ranked;
        }

        let min_exposure = self.min_exposure(total);

        // Group by creator in first-seen order
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<Vec<CandidateItem>> = Vec::new();
        for item in ranked {
            let idx = *slots.entry(item.creator_id.clone()).or_insert_with(|| {
                groups.push(Vec::new());
                groups.len() - 1
            });
            groups[idx].push(item);
        }

        let creator_count = groups.len();
        let mut guaranteed = Vec::with_capacity(total);
        let mut excess = Vec::new();
        for mut group in groups {
            let rest = group.split_off(group.len().min(min_exposure));
            guaranteed.extend(group);
            excess.extend(rest);
        }

        debug!(
            total = total,
            creators = creator_count,
            min_exposure = min_exposure,
            guaranteed = guaranteed.len(),
            "Exposure balancing applied"
        );

        guaranteed.extend(excess);
        guaranteed
    }
}
