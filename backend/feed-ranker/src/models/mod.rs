use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A feed item offered for ranking. Never mutated by the ranker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateItem {
    pub id: String,
    pub creator_id: String,
    pub media_ref: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engagement: Option<Engagement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<ItemMetadata>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business: Option<BusinessInfo>,
}

impl CandidateItem {
    pub fn new(id: impl Into<String>, creator_id: impl Into<String>, media_ref: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            creator_id: creator_id.into(),
            media_ref: media_ref.into(),
            engagement: None,
            metadata: None,
            business: None,
        }
    }

    pub fn with_engagement(mut self, engagement: Engagement) -> Self {
        self.engagement = Some(engagement);
        self
    }

    pub fn with_metadata(mut self, metadata: ItemMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_business(mut self, business: BusinessInfo) -> Self {
        self.business = Some(business);
        self
    }

    /// View count used by the bandit: `views`, falling back to `impressions`
    /// when views are absent or zero.
    pub fn raw_views(&self) -> u64 {
        match &self.engagement {
            Some(e) if e.views > 0 => e.views,
            Some(e) => e.impressions,
            None => 0,
        }
    }

    pub fn clicks(&self) -> u64 {
        self.engagement.as_ref().map(|e| e.clicks).unwrap_or(0)
    }

    /// No impressions, views, clicks or purchases recorded.
    pub fn has_zero_engagement(&self) -> bool {
        match &self.engagement {
            None => true,
            Some(e) => e.impressions == 0 && e.views == 0 && e.clicks == 0 && e.purchases == 0,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Engagement {
    #[serde(default)]
    pub impressions: u64,
    #[serde(default)]
    pub clicks: u64,
    #[serde(default)]
    pub purchases: u64,
    #[serde(default)]
    pub views: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub freshness: Option<DateTime<Utc>>,
    /// In [0, 1]
    #[serde(default)]
    pub commission_rate: f64,
    /// In [0, 1]
    #[serde(default)]
    pub repetition_penalty: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator_tier: Option<CreatorTier>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CreatorTier {
    Gold,
    Blue,
    Grey,
    Unverified,
}

impl CreatorTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CreatorTier::Gold => "gold",
            CreatorTier::Blue => "blue",
            CreatorTier::Grey => "grey",
            CreatorTier::Unverified => "unverified",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessInfo {
    /// Manual boost in [0, 1]
    #[serde(default)]
    pub boost_priority: f64,
    #[serde(default)]
    pub sponsored: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
}

/// Per-request ranking context. Not persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankerContext {
    pub user_id: String,
    #[serde(default)]
    pub session_id: String,
    #[serde(default)]
    pub previously_shown: Vec<String>,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub business_constraints: Option<BusinessConstraints>,
    #[serde(default)]
    pub preferences: Option<UserPreferences>,
}

impl RankerContext {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            session_id: String::new(),
            previously_shown: Vec::new(),
            timestamp: Utc::now(),
            business_constraints: None,
            preferences: None,
        }
    }

    pub fn with_constraints(mut self, constraints: BusinessConstraints) -> Self {
        self.business_constraints = Some(constraints);
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Caller-supplied constraint overrides. Missing fields take the defaults
/// in [`ResolvedConstraints::default`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BusinessConstraints {
    #[serde(default)]
    pub min_commission_rate: Option<f64>,
    #[serde(default)]
    pub max_repetition: Option<f64>,
    #[serde(default)]
    pub freshness_boost: Option<f64>,
    #[serde(default)]
    pub diversity_weight: Option<f64>,
    #[serde(default)]
    pub tier_weights: Option<HashMap<CreatorTier, f64>>,
}

/// Constraints after merging caller overrides over defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConstraints {
    pub min_commission_rate: f64,
    pub max_repetition: f64,
    pub freshness_boost: f64,
    /// Accepted and carried; no scoring term reads it yet.
    pub diversity_weight: f64,
    pub tier_weights: HashMap<CreatorTier, f64>,
}

impl Default for ResolvedConstraints {
    fn default() -> Self {
        Self {
            min_commission_rate: 0.1,
            max_repetition: 0.3,
            freshness_boost: 0.2,
            diversity_weight: 0.1,
            tier_weights: HashMap::from([
                (CreatorTier::Gold, 0.10),
                (CreatorTier::Blue, 0.05),
                (CreatorTier::Grey, 0.02),
                (CreatorTier::Unverified, 0.0),
            ]),
        }
    }
}

impl ResolvedConstraints {
    pub fn merge(overrides: Option<&BusinessConstraints>) -> Self {
        let mut resolved = Self::default();
        let Some(o) = overrides else {
            return resolved;
        };

        if let Some(v) = o.min_commission_rate {
            resolved.min_commission_rate = v;
        }
        if let Some(v) = o.max_repetition {
            resolved.max_repetition = v;
        }
        if let Some(v) = o.freshness_boost {
            resolved.freshness_boost = v;
        }
        if let Some(v) = o.diversity_weight {
            resolved.diversity_weight = v;
        }
        if let Some(weights) = &o.tier_weights {
            for (tier, weight) in weights {
                resolved.tier_weights.insert(*tier, *weight);
            }
        }
        resolved
    }

    pub fn tier_weight(&self, tier: Option<CreatorTier>) -> f64 {
        tier.and_then(|t| self.tier_weights.get(&t).copied())
            .unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UserPreferences {
    #[serde(default)]
    pub category_affinities: HashMap<String, f64>,
    #[serde(default)]
    pub price_affinities: HashMap<String, f64>,
}

/// Client-side scoring strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Algorithm {
    Identity,
    Ucb1,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Identity => "identity",
            Algorithm::Ucb1 => "ucb1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RankingSource {
    Client,
    Server,
}

impl RankingSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankingSource::Client => "client",
            RankingSource::Server => "server",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketAssignment {
    pub algorithm: Algorithm,
    pub in_canary: bool,
}

/// Final ordering handed back to the feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedFeed {
    pub items: Vec<CandidateItem>,
    /// `identity`/`ucb1` on the client path; whatever the backend reported
    /// on the server path.
    pub algorithm: String,
    pub in_canary: bool,
    pub user_id: String,
    pub source: RankingSource,
}

/// Payload of the `ranker_assignment` telemetry event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignmentEvent {
    pub user_id: String,
    pub algorithm: String,
    pub in_canary: bool,
    pub source: RankingSource,
    pub item_count: usize,
    pub timestamp: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngagementEventType {
    Impression,
    Cta,
    Purchase,
    Share,
}

impl EngagementEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EngagementEventType::Impression => "impression",
            EngagementEventType::Cta => "cta",
            EngagementEventType::Purchase => "purchase",
            EngagementEventType::Share => "share",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_views_falls_back_to_impressions() {
        let item = CandidateItem::new("a", "c", "m").with_engagement(Engagement {
            impressions: 40,
            views: 0,
            ..Default::default()
        });
        assert_eq!(item.raw_views(), 40);

        let item = item.with_engagement(Engagement {
            impressions: 40,
            views: 12,
            ..Default::default()
        });
        assert_eq!(item.raw_views(), 12);
    }

    #[test]
    fn test_merge_constraints_over_defaults() {
        let overrides = BusinessConstraints {
            freshness_boost: Some(0.5),
            tier_weights: Some(HashMap::from([(CreatorTier::Gold, 0.3)])),
            ..Default::default()
        };

        let resolved = ResolvedConstraints::merge(Some(&overrides));
        assert_eq!(resolved.freshness_boost, 0.5);
        assert_eq!(resolved.min_commission_rate, 0.1);
        assert_eq!(resolved.tier_weight(Some(CreatorTier::Gold)), 0.3);
        assert_eq!(resolved.tier_weight(Some(CreatorTier::Blue)), 0.05);
        assert_eq!(resolved.tier_weight(None), 0.0);
    }

    #[test]
    fn test_missing_constraints_use_defaults() {
        assert_eq!(ResolvedConstraints::merge(None), ResolvedConstraints::default());
    }

    #[test]
    fn test_candidate_deserializes_from_sparse_json() {
        let item: CandidateItem = serde_json::from_str(
            r#"{"id":"s1","creator_id":"c1","media_ref":"https://cdn/x.mp4",
                "metadata":{"creator_tier":"gold","commission_rate":0.2}}"#,
        )
        .unwrap();

        assert_eq!(item.metadata.unwrap().creator_tier, Some(CreatorTier::Gold));
        assert!(item.engagement.is_none());
    }
}
