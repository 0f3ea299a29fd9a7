use actix_web::{web, App, HttpServer};
use anyhow::Context;
use feed_ranker::{
    handlers::{self, FeedHandlerState, MediaHandlerState},
    services::LogTelemetry,
    Config, RankerOrchestrator,
};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    // Load config
    let config = Config::from_env().context("Failed to load config")?;

    info!(
        "Starting {} on {}:{}",
        config.service.service_name, config.service.http_host, config.service.http_port
    );
    info!(
        enabled = config.ranking.enabled,
        prefer_server = config.ranking.prefer_server,
        canary_percentage = config.ranking.canary_percentage,
        backend = config.ranking.backend_url.as_deref().unwrap_or("none"),
        "Ranking configuration loaded"
    );
    info!(
        lookahead = config.media.lookahead,
        cache_max_bytes = config.media.cache_max_bytes,
        "Media cache configured"
    );

    let orchestrator = RankerOrchestrator::from_config(config.ranking.clone())
        .context("Failed to build ranker")?
        .with_telemetry(Arc::new(LogTelemetry));

    let state = web::Data::new(FeedHandlerState {
        orchestrator: Arc::new(orchestrator),
    });

    let media_state = web::Data::new(MediaHandlerState::from_config(&config.media));

    let bind_addr = (config.service.http_host.clone(), config.service.http_port);

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .app_data(media_state.clone())
            .configure(handlers::configure)
    })
    .bind(bind_addr)
    .with_context(|| format!("Failed to bind {}:{}", config.service.http_host, config.service.http_port))?
    .run()
    .await
    .context("HTTP server error")?;

    Ok(())
}
