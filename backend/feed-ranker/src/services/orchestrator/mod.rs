// ============================================
// Ranker Orchestrator
// ============================================
//
// Entry point for the feed. Picks one of four paths per request:
//
//   Disabled       ranking switched off → input as-is (identity, client)
//   ServerAttempt  server preferred + backend configured → one bounded call
//   ClientFallback server attempt failed → client pipeline
//   ClientDirect   server not preferred → client pipeline
//
// Client pipeline: bucket → strategy → exposure balancing → telemetry.
//
// Nothing in here returns an error. Every failure lands on the client
// pipeline, whose identity branch always yields a renderable feed.

use crate::config::RankingConfig;
use crate::error::{RankerError, Result};
use crate::models::{
    Algorithm, AssignmentEvent, CandidateItem, EngagementEventType, RankedFeed, RankerContext,
    RankingSource, ResolvedConstraints,
};
use crate::services::bucketing::BucketAssigner;
use crate::services::diversity::ExposureBalancer;
use crate::services::exploration::ColdStartAnnotator;
use crate::services::ranking::{ScoringContext, ScoringEngine, Ucb1Strategy};
use crate::services::remote::{HttpRemoteRanker, RemoteRanker, RemoteRanking};
use crate::services::telemetry::{Telemetry, RANKER_ASSIGNMENT_EVENT};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankingPath {
    Disabled,
    ServerAttempt,
    ClientFallback,
    ClientDirect,
}

impl RankingPath {
    pub fn as_str(&self) -> &'static str {
        match self {
            RankingPath::Disabled => "disabled",
            RankingPath::ServerAttempt => "server_attempt",
            RankingPath::ClientFallback => "client_fallback",
            RankingPath::ClientDirect => "client_direct",
        }
    }
}

pub struct RankerOrchestrator {
    config: RankingConfig,
    assigner: BucketAssigner,
    engine: ScoringEngine,
    balancer: ExposureBalancer,
    remote: Option<Arc<dyn RemoteRanker>>,
    telemetry: Option<Arc<dyn Telemetry>>,
}

impl RankerOrchestrator {
    pub fn new(config: RankingConfig) -> Self {
        let assigner = BucketAssigner::new(config.canary_percentage)
            .with_default_algorithm(config.default_algorithm);
        let engine = ScoringEngine::new(Ucb1Strategy::new().with_debug(config.debug));
        let balancer = ExposureBalancer::new(config.min_exposure_pct);

        Self {
            config,
            assigner,
            engine,
            balancer,
            remote: None,
            telemetry: None,
        }
    }

    /// Build from config, wiring the HTTP backend when a URL is configured.
    pub fn from_config(config: RankingConfig) -> Result<Self> {
        config.validate()?;

        let remote = match &config.backend_url {
            Some(url) => Some(Arc::new(HttpRemoteRanker::new(url, config.remote_timeout)?)
                as Arc<dyn RemoteRanker>),
            None => None,
        };

        let mut orchestrator = Self::new(config);
        orchestrator.remote = remote;
        Ok(orchestrator)
    }

    pub fn with_remote(mut self, remote: Arc<dyn RemoteRanker>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn with_telemetry(mut self, telemetry: Arc<dyn Telemetry>) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Let UCB1 read cold-start priors for zero-engagement items.
    pub fn with_cold_start(mut self, annotator: ColdStartAnnotator) -> Self {
        self.engine = ScoringEngine::new(
            Ucb1Strategy::new()
                .with_debug(self.config.debug)
                .with_cold_start(annotator),
        );
        self
    }

    pub fn config(&self) -> &RankingConfig {
        &self.config
    }

    /// Path chosen before any work is done.
    pub fn initial_path(&self) -> RankingPath {
        if !self.ranking_enabled() {
            RankingPath::Disabled
        } else if self.server_preferred() {
            RankingPath::ServerAttempt
        } else {
            RankingPath::ClientDirect
        }
    }

    fn ranking_enabled(&self) -> bool {
        self.config.enabled
    }

    fn server_preferred(&self) -> bool {
        self.config.wants_server() && self.remote.is_some()
    }

    pub async fn rank(&self, items: &[CandidateItem], ctx: &RankerContext) -> RankedFeed {
        match self.initial_path() {
            RankingPath::Disabled => self.passthrough(items, ctx),
            RankingPath::ServerAttempt => match self.rank_server(items, ctx).await {
                Ok(feed) => feed,
                Err(err) => {
                    if err.triggers_fallback() {
                        warn!(
                            user_id = %ctx.user_id,
                            error = %err,
                            "Server ranking failed, falling back to client ranking"
                        );
                    } else {
                        error!(
                            user_id = %ctx.user_id,
                            error = %err,
                            "Unexpected server ranking error, falling back to client ranking"
                        );
                    }
                    self.rank_client(items, ctx, RankingPath::ClientFallback)
                }
            },
            path => self.rank_client(items, ctx, path),
        }
    }

    /// Forward an engagement signal to telemetry.
    pub fn track_event(&self, item_id: &str, event_type: EngagementEventType) {
        match &self.telemetry {
            Some(telemetry) => telemetry.track_event(item_id, event_type),
            None => debug!(
                item_id = %item_id,
                event_type = event_type.as_str(),
                "Engagement event dropped, no telemetry configured"
            ),
        }
    }

    fn passthrough(&self, items: &[CandidateItem], ctx: &RankerContext) -> RankedFeed {
        debug!(user_id = %ctx.user_id, "Ranking disabled, returning input order");

        RankedFeed {
            items: items.to_vec(),
            algorithm: Algorithm::Identity.as_str().to_string(),
            in_canary: false,
            user_id: ctx.user_id.clone(),
            source: RankingSource::Client,
        }
    }

    async fn rank_server(&self, items: &[CandidateItem], ctx: &RankerContext) -> Result<RankedFeed> {
        let remote = self
            .remote
            .as_ref()
            .ok_or_else(|| RankerError::Internal("No remote ranker configured".to_string()))?;

        let ranking = remote.rank(&ctx.user_id, items.len()).await?;
        let ordered = apply_server_order(items, &ranking);
        let in_canary = self.assigner.assign_treatment(&ctx.user_id).in_canary;

        info!(
            user_id = %ctx.user_id,
            algo = %ranking.algo,
            returned = ranking.items.len(),
            item_count = ordered.len(),
            "Feed ranked by server"
        );

        Ok(RankedFeed {
            items: ordered,
            algorithm: ranking.algo,
            in_canary,
            user_id: ctx.user_id.clone(),
            source: RankingSource::Server,
        })
    }

    fn rank_client(
        &self,
        items: &[CandidateItem],
        ctx: &RankerContext,
        path: RankingPath,
    ) -> RankedFeed {
        let assignment = self.assigner.assign_treatment(&ctx.user_id);
        let constraints = ResolvedConstraints::merge(ctx.business_constraints.as_ref());
        let scoring_ctx = ScoringContext {
            constraints: &constraints,
            now: ctx.timestamp,
        };

        let ranked = self.engine.rank(assignment.algorithm, items, &scoring_ctx);
        let balanced = self.balancer.balance(ranked);

        info!(
            user_id = %ctx.user_id,
            path = path.as_str(),
            algorithm = assignment.algorithm.as_str(),
            in_canary = assignment.in_canary,
            item_count = balanced.len(),
            "Feed ranked on client"
        );

        if let Some(telemetry) = &self.telemetry {
            let event = AssignmentEvent {
                user_id: ctx.user_id.clone(),
                algorithm: assignment.algorithm.as_str().to_string(),
                in_canary: assignment.in_canary,
                source: RankingSource::Client,
                item_count: balanced.len(),
                timestamp: Utc::now().timestamp_millis(),
            };
            match serde_json::to_value(&event) {
                Ok(payload) => telemetry.track(RANKER_ASSIGNMENT_EVENT, payload),
                Err(e) => warn!("Failed to encode assignment event: {}", e),
            }
        }

        RankedFeed {
            items: balanced,
            algorithm: assignment.algorithm.as_str().to_string(),
            in_canary: assignment.in_canary,
            user_id: ctx.user_id.clone(),
            source: RankingSource::Client,
        }
    }
}

/// Reorder `items` to follow the server's id order. Unknown and duplicate
/// ids in the response are ignored; candidates the server left out are
/// appended in their original order.
pub fn apply_server_order(items: &[CandidateItem], ranking: &RemoteRanking) -> Vec<CandidateItem> {
    let positions: HashMap<&str, usize> = items
        .iter()
        .enumerate()
        .rev()
        .map(|(idx, item)| (item.id.as_str(), idx))
        .collect();

    let mut used = vec![false; items.len()];
    let mut ordered = Vec::with_capacity(items.len());

    for ranked in &ranking.items {
        if let Some(&idx) = positions.get(ranked.story_id.as_str()) {
            if !used[idx] {
                used[idx] = true;
                ordered.push(items[idx].clone());
            }
        }
    }

    for (idx, item) in items.iter().enumerate() {
        if !used[idx] {
            ordered.push(item.clone());
        }
    }

    ordered
}
