pub mod feed;
pub mod media;

pub use feed::{rank_feed, track_event, FeedHandlerState};
pub use media::{cache_stats, MediaHandlerState};

use actix_web::{web, HttpResponse};

/// Register every route on an actix app.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health))
        .route("/api/v1/health", web::get().to(health))
        .service(rank_feed)
        .service(track_event)
        .service(cache_stats);
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().body("OK")
}
