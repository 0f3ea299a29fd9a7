//! Media cache and lookahead prefetch
//!
//! The feed reports focus changes; the prefetch coordinator fetches the
//! next few items' media and records them in a byte-bounded cache so the
//! same reference is not fetched twice while it stays resident.

pub mod cache;
pub mod prefetch;

pub use cache::{CacheStats, MediaCache, SharedMediaCache, DEFAULT_ENTRY_BYTES};
pub use prefetch::{PrefetchCoordinator, SweepOutcome};

use crate::error::{RankerError, Result};
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use std::time::Duration;

/// Host capability that pulls a media resource into the platform cache.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    async fn fetch(&self, media_ref: &str) -> Result<()>;
}

/// Fetches media over HTTP and drains the body.
pub struct HttpMediaFetcher {
    client: HttpClient,
}

impl HttpMediaFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| RankerError::Configuration(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl MediaFetcher for HttpMediaFetcher {
    async fn fetch(&self, media_ref: &str) -> Result<()> {
        let response = self
            .client
            .get(media_ref)
            .send()
            .await
            .map_err(|e| RankerError::Prefetch(format!("{}: {}", media_ref, e)))?;

        if !response.status().is_success() {
            return Err(RankerError::Prefetch(format!(
                "{} returned {}",
                media_ref,
                response.status()
            )));
        }

        response
            .bytes()
            .await
            .map_err(|e| RankerError::Prefetch(format!("{}: {}", media_ref, e)))?;
        Ok(())
    }
}
