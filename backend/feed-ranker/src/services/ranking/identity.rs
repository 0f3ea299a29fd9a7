use super::{ScoringContext, ScoringStrategy};
use crate::models::{Algorithm, CandidateItem};

/// No-op ranking: same items, same order.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityStrategy;

impl ScoringStrategy for IdentityStrategy {
    fn algorithm(&self) -> Algorithm {
        Algorithm::Identity
    }

    fn rank(&self, items: &[CandidateItem], _ctx: &ScoringContext<'_>) -> Vec<CandidateItem> {
        items.to_vec()
    }
}
