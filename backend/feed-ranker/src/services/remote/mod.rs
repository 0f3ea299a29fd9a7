//! Server-side ranking client
//!
//! The backend ranks stories for a user and returns an id order:
//!
//! ```text
//! POST {backend}/api/rank   {"user_id": "...", "limit": 20}
//! 200 OK                    {"algo": "...", "items": [{"story_id", "score", "creator_id"}], "ttl": 60}
//! ```
//!
//! Any non-2xx status, a body without `items`, or an elapsed timeout is an
//! error here; the orchestrator turns every error into a client fallback.

use crate::error::{RankerError, Result};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

#[derive(Debug, Clone, Serialize)]
pub struct RemoteRankRequest {
    pub user_id: String,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteRankedItem {
    pub story_id: String,
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub creator_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RemoteRanking {
    #[serde(default = "default_algo")]
    pub algo: String,
    pub items: Vec<RemoteRankedItem>,
    #[serde(default)]
    pub ttl: Option<i64>,
}

fn default_algo() -> String {
    "server".to_string()
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteRanker: Send + Sync {
    async fn rank(&self, user_id: &str, limit: usize) -> Result<RemoteRanking>;
}

/// [`RemoteRanker`] over HTTP/JSON.
pub struct HttpRemoteRanker {
    client: HttpClient,
    endpoint: String,
    timeout: Duration,
}

impl HttpRemoteRanker {
    pub fn new(backend_url: &str, timeout: Duration) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RankerError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: format!("{}/api/rank", backend_url.trim_end_matches('/')),
            timeout,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn send(&self, request: &RemoteRankRequest) -> Result<RemoteRanking> {
        let response = self.client.post(&self.endpoint).json(request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RankerError::Network(format!(
                "Ranking backend returned {}",
                status
            )));
        }

        let body = response.bytes().await?;
        let ranking: RemoteRanking = serde_json::from_slice(&body)?;
        Ok(ranking)
    }
}

#[async_trait]
impl RemoteRanker for HttpRemoteRanker {
    async fn rank(&self, user_id: &str, limit: usize) -> Result<RemoteRanking> {
        let request = RemoteRankRequest {
            user_id: user_id.to_string(),
            limit,
        };

        // Bounds connect + body read even if the client timeout is bypassed
        let ranking = tokio::time::timeout(self.timeout, self.send(&request))
            .await
            .map_err(|_| {
                RankerError::Timeout(format!("Remote ranking exceeded {:?}", self.timeout))
            })??;

        debug!(
            user_id = %user_id,
            algo = %ranking.algo,
            returned = ranking.items.len(),
            "Remote ranking received"
        );

        Ok(ranking)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_endpoint_normalizes_trailing_slash() {
        let ranker = HttpRemoteRanker::new("http://backend:8080/", Duration::from_millis(500)).unwrap();
        assert_eq!(ranker.endpoint(), "http://backend:8080/api/rank");
    }

    #[tokio::test]
    async fn test_rank_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rank"))
            .and(body_json(json!({"user_id": "u1", "limit": 3})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "algo": "ucb1-server",
                "items": [
                    {"story_id": "s2", "score": 0.9, "creator_id": "c2"},
                    {"story_id": "s1", "score": 0.4, "creator_id": "c1"}
                ],
                "ttl": 60
            })))
            .mount(&server)
            .await;

        let ranker = HttpRemoteRanker::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let ranking = ranker.rank("u1", 3).await.unwrap();

        assert_eq!(ranking.algo, "ucb1-server");
        assert_eq!(ranking.items.len(), 2);
        assert_eq!(ranking.items[0].story_id, "s2");
        assert_eq!(ranking.ttl, Some(60));
    }

    #[tokio::test]
    async fn test_non_success_status_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rank"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let ranker = HttpRemoteRanker::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let err = ranker.rank("u1", 3).await.unwrap_err();
        assert!(matches!(err, RankerError::Network(_)));
    }

    #[tokio::test]
    async fn test_missing_items_is_malformed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rank"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"algo": "x", "ttl": 5})))
            .mount(&server)
            .await;

        let ranker = HttpRemoteRanker::new(&server.uri(), Duration::from_secs(2)).unwrap();
        let err = ranker.rank("u1", 3).await.unwrap_err();
        assert!(matches!(err, RankerError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_slow_backend_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/rank"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"algo": "x", "items": []}))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let ranker = HttpRemoteRanker::new(&server.uri(), Duration::from_millis(50)).unwrap();
        let err = ranker.rank("u1", 3).await.unwrap_err();
        assert!(matches!(err, RankerError::Timeout(_)));
    }
}
