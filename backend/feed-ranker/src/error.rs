use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RankerError>;

/// Failure modes inside the ranking core.
///
/// None of these reach a feed consumer: the orchestrator converts every
/// variant into a client-side fallback and the prefetch coordinator drops
/// them after logging.
#[derive(Debug, Error)]
pub enum RankerError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("Prefetch failed: {0}")]
    Prefetch(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for RankerError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            RankerError::Timeout(err.to_string())
        } else if err.is_decode() {
            RankerError::MalformedResponse(err.to_string())
        } else {
            RankerError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for RankerError {
    fn from(err: serde_json::Error) -> Self {
        RankerError::MalformedResponse(err.to_string())
    }
}

impl From<config::ConfigError> for RankerError {
    fn from(err: config::ConfigError) -> Self {
        RankerError::Configuration(err.to_string())
    }
}

// Convert to HTTP responses for the actix handlers
impl ResponseError for RankerError {
    fn status_code(&self) -> StatusCode {
        match self {
            RankerError::Validation(_) => StatusCode::BAD_REQUEST,
            RankerError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            RankerError::Network(_) | RankerError::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

impl RankerError {
    /// Whether this failure should send the orchestrator down the client path.
    pub fn triggers_fallback(&self) -> bool {
        matches!(
            self,
            RankerError::Network(_) | RankerError::MalformedResponse(_) | RankerError::Timeout(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_failures_trigger_fallback() {
        assert!(RankerError::Network("refused".into()).triggers_fallback());
        assert!(RankerError::MalformedResponse("no items".into()).triggers_fallback());
        assert!(RankerError::Timeout("800ms".into()).triggers_fallback());
        assert!(!RankerError::Prefetch("404".into()).triggers_fallback());
    }

    #[test]
    fn test_serde_error_is_malformed() {
        let err: RankerError = serde_json::from_str::<serde_json::Value>("{")
            .unwrap_err()
            .into();
        assert!(matches!(err, RankerError::MalformedResponse(_)));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            RankerError::Validation("user_id".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            RankerError::Internal("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
