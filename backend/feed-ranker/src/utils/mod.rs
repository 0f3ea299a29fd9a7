// Utility functions for feed-ranker

use actix_web::HttpRequest;
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

/// Correlation id from the request header, or a fresh one.
pub fn correlation_id(req: &HttpRequest) -> String {
    req.headers()
        .get(CORRELATION_HEADER)
        .and_then(|val| val.to_str().ok())
        .filter(|val| !val.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}
