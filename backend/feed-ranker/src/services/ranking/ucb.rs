// ============================================
// UCB1 Strategy (business-weighted)
// ============================================
//
// Multi-armed bandit score per candidate, plus business adjustments:
//
//   views       = max(views || impressions, 1)
//   exploration = sqrt(2 * ln(max(N, 1)) / views)
//   ucb         = clicks / views + sqrt(2) * exploration
//
//   final = ucb
//         + commission_rate    * min_commission_rate
//         + max(0, 1 - age/1d) * freshness_boost
//         - repetition_penalty * max_repetition
//         + boost_priority
//         + 0.05 (sponsored)
//         + tier_weights[tier]
//
// Where N is the view total across the candidate set.
//
// The commission and repetition terms multiply the item metric by the
// constraint value rather than comparing against it as a threshold.
// Kept as-is pending a product decision.

use super::{ScoringContext, ScoringStrategy};
use crate::models::{Algorithm, CandidateItem, ResolvedConstraints};
use crate::services::exploration::ColdStartAnnotator;
use chrono::{DateTime, Utc};
use std::f64::consts::SQRT_2;
use tracing::debug;

const DAY_MILLIS: f64 = 86_400_000.0;

/// Per-item score components. Kept beside the items, never on them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub click_rate: f64,
    pub exploration: f64,
    pub ucb_score: f64,
    pub commission_boost: f64,
    pub freshness_boost: f64,
    pub repetition_penalty: f64,
    pub business_boost: f64,
    pub sponsored_boost: f64,
    pub tier_boost: f64,
    pub cold_start_boost: f64,
    pub final_score: f64,
}

pub struct Ucb1Strategy {
    /// c in `rate + c * exploration`
    exploration_constant: f64,
    sponsored_boost: f64,
    /// Log every breakdown at debug level
    debug: bool,
    /// Merge point for cold-start priors. `None` leaves them inert.
    cold_start: Option<ColdStartAnnotator>,
}

impl Default for Ucb1Strategy {
    fn default() -> Self {
        Self {
            exploration_constant: SQRT_2,
            sponsored_boost: 0.05,
            debug: false,
            cold_start: None,
        }
    }
}

impl Ucb1Strategy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Fold cold-start priors into the final score of zero-engagement items.
    pub fn with_cold_start(mut self, annotator: ColdStartAnnotator) -> Self {
        self.cold_start = Some(annotator);
        self
    }

    /// Sum of raw view counts across the candidate set.
    pub fn total_views(items: &[CandidateItem]) -> u64 {
        items.iter().map(CandidateItem::raw_views).sum()
    }

    /// Exploration bonus for an item seen `views` times out of `total_views`.
    pub fn exploration(views: u64, total_views: u64) -> f64 {
        let views = views.max(1) as f64;
        let total = total_views.max(1) as f64;
        ((2.0 * total.ln()) / views).sqrt()
    }

    pub fn score(
        &self,
        item: &CandidateItem,
        total_views: u64,
        constraints: &ResolvedConstraints,
        now: DateTime<Utc>,
    ) -> ScoreBreakdown {
        let views = item.raw_views().max(1);
        let click_rate = item.clicks() as f64 / views as f64;
        let exploration = Self::exploration(views, total_views);
        let ucb_score = click_rate + self.exploration_constant * exploration;

        let (commission_boost, freshness_boost, repetition_penalty, tier_boost) =
            match &item.metadata {
                Some(meta) => (
                    meta.commission_rate * constraints.min_commission_rate,
                    freshness_factor(meta.freshness, now) * constraints.freshness_boost,
                    meta.repetition_penalty * constraints.max_repetition,
                    constraints.tier_weight(meta.creator_tier),
                ),
                None => (0.0, 0.0, 0.0, 0.0),
            };

        let (business_boost, sponsored_boost) = match &item.business {
            Some(b) => (
                b.boost_priority,
                if b.sponsored { self.sponsored_boost } else { 0.0 },
            ),
            None => (0.0, 0.0),
        };

        let cold_start_boost = self
            .cold_start
            .as_ref()
            .and_then(|annotator| annotator.annotate(item, now))
            .map(|a| a.boost())
            .unwrap_or(0.0);

        let final_score = ucb_score + commission_boost + freshness_boost - repetition_penalty
            + business_boost
            + sponsored_boost
            + tier_boost
            + cold_start_boost;

        ScoreBreakdown {
            click_rate,
            exploration,
            ucb_score,
            commission_boost,
            freshness_boost,
            repetition_penalty,
            business_boost,
            sponsored_boost,
            tier_boost,
            cold_start_boost,
            final_score,
        }
    }

    /// Score every item, returning breakdowns in input order.
    pub fn score_all(
        &self,
        items: &[CandidateItem],
        ctx: &ScoringContext<'_>,
    ) -> Vec<ScoreBreakdown> {
        let total_views = Self::total_views(items);
        items
            .iter()
            .map(|item| self.score(item, total_views, ctx.constraints, ctx.now))
            .collect()
    }
}

impl ScoringStrategy for Ucb1Strategy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Ucb1
    }

    fn rank(&self, items: &[CandidateItem], ctx: &ScoringContext<'_>) -> Vec<CandidateItem> {
        let breakdowns = self.score_all(items, ctx);

        let mut order: Vec<usize> = (0..items.len()).collect();
        // Stable: equal scores keep input order. NaN sinks to the bottom.
        order.sort_by(|&a, &b| {
            sortable(breakdowns[b].final_score).total_cmp(&sortable(breakdowns[a].final_score))
        });

        if self.debug {
            for (rank, &idx) in order.iter().enumerate() {
                let s = &breakdowns[idx];
                debug!(
                    rank = rank,
                    item_id = %items[idx].id,
                    final_score = s.final_score,
                    ucb = s.ucb_score,
                    exploration = s.exploration,
                    commission = s.commission_boost,
                    freshness = s.freshness_boost,
                    repetition = s.repetition_penalty,
                    tier = s.tier_boost,
                    "UCB1 score breakdown"
                );
            }
        }

        debug!(candidates = items.len(), "UCB1 ranking completed");

        order.into_iter().map(|idx| items[idx].clone()).collect()
    }
}

/// Linear decay from 1 (just published) to 0 (a day old). Future
/// timestamps count as age zero.
fn freshness_factor(published: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    match published {
        Some(ts) => {
            let age_millis = (now - ts).num_milliseconds().max(0) as f64;
            (1.0 - age_millis / DAY_MILLIS).max(0.0)
        }
        None => 0.0,
    }
}

fn sortable(score: f64) -> f64 {
    if score.is_nan() {
        f64::NEG_INFINITY
    } else {
        score
    }
}
