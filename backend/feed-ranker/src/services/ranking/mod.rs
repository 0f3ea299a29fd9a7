/// Ranking Module
///
/// Pure client-side scoring strategies for the feed.
///
/// # Strategies
/// - **Identity**: returns candidates untouched. Safe default and the
///   universal fallback.
/// - **UCB1**: bandit score (click-rate + exploration bonus) augmented with
///   business terms (commission, freshness, repetition, boosts, creator tier).
///
/// Strategies never mutate the caller's items and never expose internal
/// scores on the items they return.
pub mod identity;
pub mod ucb;

pub use identity::IdentityStrategy;
pub use ucb::{ScoreBreakdown, Ucb1Strategy};

use crate::models::{Algorithm, CandidateItem, ResolvedConstraints};
use chrono::{DateTime, Utc};

/// Inputs shared by every strategy for one ranking pass.
#[derive(Debug, Clone)]
pub struct ScoringContext<'a> {
    pub constraints: &'a ResolvedConstraints,
    pub now: DateTime<Utc>,
}

pub trait ScoringStrategy: Send + Sync {
    fn algorithm(&self) -> Algorithm;

    /// Produce a new ordering of `items`. Output has the same length.
    fn rank(&self, items: &[CandidateItem], ctx: &ScoringContext<'_>) -> Vec<CandidateItem>;
}

/// Dispatches to the strategy selected by a bucket assignment.
pub struct ScoringEngine {
    identity: IdentityStrategy,
    ucb1: Ucb1Strategy,
}

impl Default for ScoringEngine {
    fn default() -> Self {
        Self::new(Ucb1Strategy::default())
    }
}

impl ScoringEngine {
    pub fn new(ucb1: Ucb1Strategy) -> Self {
        Self {
            identity: IdentityStrategy,
            ucb1,
        }
    }

    pub fn strategy(&self, algorithm: Algorithm) -> &dyn ScoringStrategy {
        match algorithm {
            Algorithm::Identity => &self.identity,
            Algorithm::Ucb1 => &self.ucb1,
        }
    }

    pub fn rank(
        &self,
        algorithm: Algorithm,
        items: &[CandidateItem],
        ctx: &ScoringContext<'_>,
    ) -> Vec<CandidateItem> {
        self.strategy(algorithm).rank(items, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_dispatch() {
        let engine = ScoringEngine::default();
        assert_eq!(engine.strategy(Algorithm::Identity).algorithm(), Algorithm::Identity);
        assert_eq!(engine.strategy(Algorithm::Ucb1).algorithm(), Algorithm::Ucb1);
    }
}
