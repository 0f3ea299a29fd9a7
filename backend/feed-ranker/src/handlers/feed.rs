/// Feed ranking API handlers
///
/// Thin HTTP surface over the ranker orchestrator.
use actix_web::{post, web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info_span, Instrument};

use crate::error::{RankerError, Result};
use crate::models::{CandidateItem, EngagementEventType, RankerContext};
use crate::services::RankerOrchestrator;
use crate::utils::{correlation_id, CORRELATION_HEADER};

/// Upper bound on candidates per request
const MAX_CANDIDATES: usize = 500;

pub struct FeedHandlerState {
    pub orchestrator: Arc<RankerOrchestrator>,
}

/// Request body for POST /api/v1/feed/rank
#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub context: RankerContext,
    #[serde(default)]
    pub candidates: Vec<CandidateItem>,
}

/// Request body for POST /api/v1/feed/events
#[derive(Debug, Deserialize)]
pub struct EngagementRequest {
    pub item_id: String,
    pub event_type: EngagementEventType,
}

#[derive(Debug, Serialize)]
struct EventAccepted {
    accepted: bool,
}

/// Rank a candidate list for a user. Always answers with a renderable feed
/// once the request itself is valid.
#[post("/api/v1/feed/rank")]
pub async fn rank_feed(
    req: HttpRequest,
    body: web::Json<RankRequest>,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    let request_id = correlation_id(&req);
    let RankRequest {
        context,
        candidates,
    } = body.into_inner();

    if context.user_id.trim().is_empty() {
        return Err(RankerError::Validation("user_id is required".to_string()));
    }

    if candidates.len() > MAX_CANDIDATES {
        return Err(RankerError::Validation(format!(
            "At most {} candidates per request, got {}",
            MAX_CANDIDATES,
            candidates.len()
        )));
    }

    let span = info_span!("rank_feed", correlation_id = %request_id, user_id = %context.user_id);
    let feed = async {
        debug!(candidates = candidates.len(), "Ranking request received");
        state.orchestrator.rank(&candidates, &context).await
    }
    .instrument(span)
    .await;

    Ok(HttpResponse::Ok()
        .insert_header((CORRELATION_HEADER, request_id))
        .json(feed))
}

/// Record an engagement event (impression, cta, purchase, share).
#[post("/api/v1/feed/events")]
pub async fn track_event(
    body: web::Json<EngagementRequest>,
    state: web::Data<FeedHandlerState>,
) -> Result<HttpResponse> {
    if body.item_id.trim().is_empty() {
        return Err(RankerError::Validation("item_id is required".to_string()));
    }

    state
        .orchestrator
        .track_event(&body.item_id, body.event_type);

    Ok(HttpResponse::Accepted().json(EventAccepted { accepted: true }))
}
