use crate::models::CandidateItem;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

/// Cold-start prior for one zero-engagement item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColdStartAnnotation {
    pub item_id: String,
    /// Assumed engagement rate before any data arrives
    pub prior: f64,
    /// Extra freshness weight, already scaled by the item's age
    pub freshness_weight: f64,
}

impl ColdStartAnnotation {
    pub fn boost(&self) -> f64 {
        self.prior + self.freshness_weight
    }
}

/// Computes cold-start priors for candidates without engagement.
#[derive(Debug, Clone)]
pub struct ColdStartAnnotator {
    prior: f64,
    extra_freshness_weight: f64,
    /// Age after which the freshness weight reaches zero
    freshness_window: Duration,
}

impl Default for ColdStartAnnotator {
    fn default() -> Self {
        Self {
            prior: 0.05,
            extra_freshness_weight: 0.1,
            freshness_window: Duration::hours(48),
        }
    }
}

impl ColdStartAnnotator {
    pub fn new(prior: f64, extra_freshness_weight: f64) -> Self {
        Self {
            prior,
            extra_freshness_weight,
            ..Default::default()
        }
    }

    pub fn with_freshness_window(mut self, window: Duration) -> Self {
        self.freshness_window = window;
        self
    }

    /// `None` when the item already has engagement.
    pub fn annotate(&self, item: &CandidateItem, now: DateTime<Utc>) -> Option<ColdStartAnnotation> {
        if !item.has_zero_engagement() {
            return None;
        }

        let published = item.metadata.as_ref().and_then(|m| m.freshness);
        let decay = match published {
            Some(ts) => {
                let window = self.freshness_window.num_milliseconds().max(1) as f64;
                let age = (now - ts).num_milliseconds().max(0) as f64;
                (1.0 - age / window).max(0.0)
            }
            // Unknown publish time: treat as brand new
            None => 1.0,
        };

        Some(ColdStartAnnotation {
            item_id: item.id.clone(),
            prior: self.prior,
            freshness_weight: self.extra_freshness_weight * decay,
        })
    }

    pub fn annotate_all(&self, items: &[CandidateItem], now: DateTime<Utc>) -> Vec<ColdStartAnnotation> {
        items
            .iter()
            .filter_map(|item| self.annotate(item, now))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Engagement, ItemMetadata};

    #[test]
    fn test_only_zero_engagement_items_are_annotated() {
        let annotator = ColdStartAnnotator::default();
        let now = Utc::now();
        let items = vec![
            CandidateItem::new("new", "c1", "m1"),
            CandidateItem::new("seen", "c2", "m2").with_engagement(Engagement {
                impressions: 3,
                ..Default::default()
            }),
            CandidateItem::new("empty", "c3", "m3").with_engagement(Engagement::default()),
        ];

        let annotations = annotator.annotate_all(&items, now);
        let ids: Vec<_> = annotations.iter().map(|a| a.item_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "empty"]);
    }

    #[test]
    fn test_freshness_weight_decays_with_age() {
        let annotator = ColdStartAnnotator::new(0.05, 0.1);
        let now = Utc::now();
        let fresh = CandidateItem::new("a", "c", "m").with_metadata(ItemMetadata {
            freshness: Some(now),
            ..Default::default()
        });
        let day_old = CandidateItem::new("b", "c", "m").with_metadata(ItemMetadata {
            freshness: Some(now - Duration::hours(24)),
            ..Default::default()
        });
        let stale = CandidateItem::new("c", "c", "m").with_metadata(ItemMetadata {
            freshness: Some(now - Duration::days(7)),
            ..Default::default()
        });

        let fresh = annotator.annotate(&fresh, now).unwrap();
        let day_old = annotator.annotate(&day_old, now).unwrap();
        let stale = annotator.annotate(&stale, now).unwrap();

        assert!((fresh.freshness_weight - 0.1).abs() < 1e-9);
        assert!((day_old.freshness_weight - 0.05).abs() < 1e-9);
        assert_eq!(stale.freshness_weight, 0.0);
        assert!((stale.boost() - 0.05).abs() < 1e-12);
    }
}
