use crate::error::{RankerError, Result};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub service: ServiceConfig,
    pub ranking: RankingConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub http_host: String,
    pub http_port: u16,
    pub service_name: String,
}

/// Recognized ranking options.
#[derive(Debug, Clone, PartialEq)]
pub struct RankingConfig {
    pub enabled: bool,
    pub default_algorithm: AlgorithmPreference,
    pub prefer_server: bool,
    /// Fraction of users in the canary, in [0, 1]
    pub canary_percentage: f64,
    pub debug: bool,
    pub backend_url: Option<String>,
    pub remote_timeout: Duration,
    pub min_exposure_pct: f64,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_algorithm: AlgorithmPreference::Identity,
            prefer_server: false,
            canary_percentage: 0.05,
            debug: false,
            backend_url: None,
            remote_timeout: Duration::from_millis(800),
            min_exposure_pct: 0.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MediaConfig {
    pub lookahead: usize,
    pub cache_max_bytes: u64,
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            lookahead: 3,
            cache_max_bytes: 100_000_000,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlgorithmPreference {
    Identity,
    Ucb1,
    Server,
}

/// Flat environment view, mapped into the nested [`Config`].
#[derive(Debug, Deserialize)]
struct EnvConfig {
    http_host: String,
    http_port: u16,
    service_name: String,
    ranking_enabled: bool,
    ranking_algorithm: AlgorithmPreference,
    prefer_server_ranking: bool,
    canary_percentage: f64,
    debug_mode: bool,
    ranking_backend_url: Option<String>,
    remote_timeout_ms: u64,
    min_exposure_pct: f64,
    lookahead_depth: usize,
    media_cache_max_bytes: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let raw: EnvConfig = config::Config::builder()
            .set_default("http_host", "0.0.0.0")?
            .set_default("http_port", 8012)?
            .set_default("service_name", "feed-ranker")?
            .set_default("ranking_enabled", true)?
            .set_default("ranking_algorithm", "identity")?
            .set_default("prefer_server_ranking", false)?
            .set_default("canary_percentage", 0.05)?
            .set_default("debug_mode", false)?
            .set_default("remote_timeout_ms", 800)?
            .set_default("min_exposure_pct", 0.02)?
            .set_default("lookahead_depth", 3)?
            .set_default("media_cache_max_bytes", 100_000_000_i64)?
            .add_source(config::Environment::default().try_parsing(true))
            .build()?
            .try_deserialize()?;

        let config = Config {
            service: ServiceConfig {
                http_host: raw.http_host,
                http_port: raw.http_port,
                service_name: raw.service_name,
            },
            ranking: RankingConfig {
                enabled: raw.ranking_enabled,
                default_algorithm: raw.ranking_algorithm,
                prefer_server: raw.prefer_server_ranking,
                canary_percentage: raw.canary_percentage,
                debug: raw.debug_mode,
                backend_url: raw.ranking_backend_url.filter(|url| !url.is_empty()),
                remote_timeout: Duration::from_millis(raw.remote_timeout_ms),
                min_exposure_pct: raw.min_exposure_pct,
            },
            media: MediaConfig {
                lookahead: raw.lookahead_depth,
                cache_max_bytes: raw.media_cache_max_bytes,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.service.http_port == 0 {
            return Err(RankerError::Configuration(
                "HTTP port must be greater than 0".to_string(),
            ));
        }

        self.ranking.validate()?;

        if self.media.cache_max_bytes == 0 {
            return Err(RankerError::Configuration(
                "Media cache size must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

impl RankingConfig {
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.canary_percentage) {
            return Err(RankerError::Configuration(format!(
                "Canary percentage must be in [0, 1], got {}",
                self.canary_percentage
            )));
        }

        if !(0.0..=1.0).contains(&self.min_exposure_pct) {
            return Err(RankerError::Configuration(format!(
                "Minimum exposure percentage must be in [0, 1], got {}",
                self.min_exposure_pct
            )));
        }

        if self.remote_timeout.is_zero() {
            return Err(RankerError::Configuration(
                "Remote ranking timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether the orchestrator should try the backend before scoring locally.
    pub fn wants_server(&self) -> bool {
        self.prefer_server || self.default_algorithm == AlgorithmPreference::Server
    }
}
