/// Media cache diagnostics
use actix_web::{get, web, HttpResponse};
use serde::Serialize;

use crate::config::MediaConfig;
use crate::services::media::{CacheStats, SharedMediaCache};

pub struct MediaHandlerState {
    pub cache: SharedMediaCache,
    pub lookahead: usize,
}

impl MediaHandlerState {
    pub fn from_config(config: &MediaConfig) -> Self {
        Self {
            cache: SharedMediaCache::new(config.cache_max_bytes),
            lookahead: config.lookahead,
        }
    }
}

#[derive(Debug, Serialize)]
struct CacheReport {
    lookahead: usize,
    #[serde(flatten)]
    stats: CacheStats,
}

/// Current media cache occupancy.
#[get("/api/v1/feed/cache")]
pub async fn cache_stats(state: web::Data<MediaHandlerState>) -> HttpResponse {
    HttpResponse::Ok().json(CacheReport {
        lookahead: state.lookahead,
        stats: state.cache.stats(),
    })
}
