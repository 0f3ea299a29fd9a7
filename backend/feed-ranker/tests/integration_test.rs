use actix_web::{http::StatusCode, test, web, App};
use feed_ranker::{
    config::{MediaConfig, RankingConfig},
    handlers::{self, FeedHandlerState, MediaHandlerState},
    models::{CandidateItem, Engagement, RankedFeed, RankerContext, RankingSource},
    services::telemetry::RecordingTelemetry,
    RankerOrchestrator,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn candidates(n: usize) -> Vec<CandidateItem> {
    (0..n)
        .map(|i| {
            CandidateItem::new(format!("s{}", i), format!("c{}", i % 3), format!("m{}", i))
                .with_engagement(Engagement {
                    views: 50,
                    clicks: (i as u64 * 3) % 50,
                    ..Default::default()
                })
        })
        .collect()
}

fn server_config(backend: &str, timeout: Duration) -> RankingConfig {
    RankingConfig {
        prefer_server: true,
        canary_percentage: 0.0,
        backend_url: Some(backend.to_string()),
        remote_timeout: timeout,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_server_ranking_end_to_end() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rank"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "algo": "server-bandit",
            "items": [
                {"story_id": "s4", "score": 0.9, "creator_id": "c1"},
                {"story_id": "s0", "score": 0.5, "creator_id": "c0"}
            ],
            "ttl": 120
        })))
        .expect(1)
        .mount(&server)
        .await;

    let orchestrator =
        RankerOrchestrator::from_config(server_config(&server.uri(), Duration::from_secs(2)))
            .unwrap();
    let feed = orchestrator
        .rank(&candidates(5), &RankerContext::new("user-42"))
        .await;

    let ids: Vec<_> = feed.items.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(ids, vec!["s4", "s0", "s1", "s2", "s3"]);
    assert_eq!(feed.source, RankingSource::Server);
    assert_eq!(feed.algorithm, "server-bandit");
}

#[tokio::test]
async fn test_backend_down_still_renders_feed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rank"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let telemetry = Arc::new(RecordingTelemetry::new());
    let orchestrator =
        RankerOrchestrator::from_config(server_config(&server.uri(), Duration::from_secs(2)))
            .unwrap()
            .with_telemetry(telemetry.clone());

    let input = candidates(15);
    let feed = orchestrator.rank(&input, &RankerContext::new("user-42")).await;

    assert_eq!(feed.source, RankingSource::Client);
    assert_eq!(feed.algorithm, "identity");
    assert_eq!(feed.items.len(), input.len());

    let events = telemetry.assignments();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].item_count, 15);
}

#[tokio::test]
async fn test_backend_timeout_falls_back() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/rank"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"algo": "slow", "items": []}))
                .set_delay(Duration::from_secs(2)),
        )
        .mount(&server)
        .await;

    let orchestrator =
        RankerOrchestrator::from_config(server_config(&server.uri(), Duration::from_millis(100)))
            .unwrap();
    let feed = orchestrator
        .rank(&candidates(3), &RankerContext::new("user-42"))
        .await;

    assert_eq!(feed.source, RankingSource::Client);
    assert_eq!(feed.items.len(), 3);
}

#[actix_web::test]
async fn test_rank_endpoint() {
    let orchestrator = RankerOrchestrator::new(RankingConfig {
        canary_percentage: 1.0,
        ..Default::default()
    });
    let state = web::Data::new(FeedHandlerState {
        orchestrator: Arc::new(orchestrator),
    });
    let app = test::init_service(
        App::new()
            .app_data(state)
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/feed/rank")
        .insert_header(("x-correlation-id", "req-1"))
        .set_json(json!({
            "context": {"user_id": "user-1", "session_id": "sess-1"},
            "candidates": candidates(4),
        }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        resp.headers().get("x-correlation-id").unwrap().to_str().unwrap(),
        "req-1"
    );

    let feed: RankedFeed = test::read_body_json(resp).await;
    assert_eq!(feed.algorithm, "ucb1");
    assert!(feed.in_canary);
    assert_eq!(feed.user_id, "user-1");
    assert_eq!(feed.items.len(), 4);
}

#[actix_web::test]
async fn test_rank_endpoint_rejects_missing_user() {
    let state = web::Data::new(FeedHandlerState {
        orchestrator: Arc::new(RankerOrchestrator::new(RankingConfig::default())),
    });
    let app = test::init_service(
        App::new()
            .app_data(state)
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/feed/rank")
        .set_json(json!({"context": {"user_id": "  "}, "candidates": []}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_events_endpoint_records_engagement() {
    let telemetry = Arc::new(RecordingTelemetry::new());
    let orchestrator =
        RankerOrchestrator::new(RankingConfig::default()).with_telemetry(telemetry.clone());
    let state = web::Data::new(FeedHandlerState {
        orchestrator: Arc::new(orchestrator),
    });
    let app = test::init_service(
        App::new()
            .app_data(state)
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/feed/events")
        .set_json(json!({"item_id": "s9", "event_type": "share"}))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::ACCEPTED);

    let engagements = telemetry.engagements();
    assert_eq!(engagements.len(), 1);
    assert_eq!(engagements[0].0, "s9");

    let req = test::TestRequest::get().uri("/health").to_request();
    let resp = test::call_service(&app, req).await;
    assert!(resp.status().is_success());
}

#[actix_web::test]
async fn test_cache_stats_endpoint_reports_shared_cache() {
    let media_state = web::Data::new(MediaHandlerState::from_config(&MediaConfig {
        lookahead: 4,
        cache_max_bytes: 5_000_000,
    }));
    // Writes through any clone of the handle are visible to the route
    let cache = media_state.cache.clone();
    cache.put("https://cdn/a.mp4", 1_000_000);
    cache.put("https://cdn/b.mp4", 2_000_000);

    let app = test::init_service(
        App::new()
            .app_data(media_state)
            .configure(handlers::configure),
    )
    .await;

    let req = test::TestRequest::get().uri("/api/v1/feed/cache").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["lookahead"], 4);
    assert_eq!(body["entries"], 2);
    assert_eq!(body["usage_bytes"], 3_000_000);
    assert_eq!(body["usage_mb"], 3);
    assert_eq!(body["max_bytes"], 5_000_000);
}
