// tests/api_http.rs
//
// HTTP-level tests for the public API Router without opening sockets.
// We exercise the router directly via tower::ServiceExt::oneshot.
//
// Covered:
// - GET /api/v1/health
// - GET /api/v1/sources
// - GET /api/v1/news (validation, limit parsing, stub-backed aggregation)
// - POST /api/scrape + GET /api/jobs/{id}

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use serde_json::Value as Json;
use shuttle_axum::axum::{
    body::{self, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::ServiceExt as _; // for `oneshot`

use finnews_aggregator::api::{create_router, AppState};
use finnews_aggregator::config::ServiceConfig;
use finnews_aggregator::error::ScrapeError;
use finnews_aggregator::ingest::page::FixturePageDriver;
use finnews_aggregator::ingest::types::{RawItem, SourceExtractor};
use finnews_aggregator::interactive::InteractiveRunner;
use finnews_aggregator::sources::SourceRegistry;
use finnews_aggregator::Orchestrator;

const BODY_LIMIT: usize = 1024 * 1024; // 1MB, safe for tests

struct Canned(&'static str, usize);

#[async_trait]
impl SourceExtractor for Canned {
    async fn extract(&self, keyword: &str, _count: usize) -> Result<Vec<RawItem>, ScrapeError> {
        Ok((0..self.1)
            .map(|i| {
                RawItem::new(self.0, format!("{keyword} {} 新闻第{i}条", self.0))
                    .with_time_text(format!("2026-01-16 1{i}:00:00"))
            })
            .collect())
    }

    fn source_id(&self) -> &str {
        self.0
    }
}

fn router_with(registry: SourceRegistry) -> Router {
    let config = ServiceConfig::default();
    let runner = InteractiveRunner {
        program: "/nonexistent/scrape_source".into(),
        report_dir: std::env::temp_dir().join("finnews-api-test-reports"),
        timeout: Duration::from_secs(5),
    };
    let orchestrator = Orchestrator::new(registry, config.dedup_prefix_chars);
    create_router(AppState::new(orchestrator, runner, config))
}

/// Every source wired, none reachable.
fn test_router() -> Router {
    router_with(SourceRegistry::in_process(Arc::new(FixturePageDriver::unreachable())))
}

fn stub_router() -> Router {
    router_with(SourceRegistry::from_extractors([
        Arc::new(Canned("eastmoney", 3)) as Arc<dyn SourceExtractor>,
        Arc::new(Canned("gelonghui", 2)) as Arc<dyn SourceExtractor>,
    ]))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Json) {
    let req = Request::builder()
        .method("GET")
        .uri(uri)
        .body(Body::empty())
        .expect("build GET");
    let resp = app.oneshot(req).await.expect("oneshot GET");
    let status = resp.status();
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.expect("read body");
    (status, serde_json::from_slice(&bytes).expect("json body"))
}

#[tokio::test]
async fn health_reports_wired_scrapers() {
    let (status, v) = get(test_router(), "/api/v1/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["status"], "ok");
    assert_eq!(v["service"], "finnews-aggregator");
    assert_eq!(v["scrapersCount"], 8);
}

#[tokio::test]
async fn sources_lists_registry_in_priority_order() {
    let (status, v) = get(test_router(), "/api/v1/sources").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["success"], true);
    let sources = v["sources"].as_array().expect("sources array");
    assert_eq!(sources.len(), 8);
    assert_eq!(sources[0], json!({"id": "toutiao", "name": "今日头条", "estimatedDuration": "~65s"}));
    assert_eq!(v["default"], json!(["eastmoney", "gelonghui", "zhitong"]));
}

#[tokio::test]
async fn news_requires_keyword() {
    for uri in ["/api/v1/news", "/api/v1/news?keyword=%20%20"] {
        let (status, v) = get(test_router(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(v, json!({"success": false, "error": "missing keyword parameter"}));
    }
}

#[tokio::test]
async fn news_rejects_unknown_sources() {
    let (status, v) = get(test_router(), "/api/v1/news?keyword=abc&sources=bogus,nope").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(v["error"], "no valid sources");
}

#[tokio::test]
async fn news_rejects_blank_sources() {
    for uri in ["/api/v1/news?keyword=abc&sources=", "/api/v1/news?keyword=abc&sources=%20"] {
        let (status, v) = get(test_router(), uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert_eq!(v, json!({"success": false, "error": "no valid sources"}));
    }
}

#[tokio::test]
async fn news_with_unreachable_sources_is_still_a_success() {
    let (status, v) = get(test_router(), "/api/v1/news?keyword=abc&sources=cls,eastmoney").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["success"], true);
    assert_eq!(v["data"], json!([]));
    assert_eq!(v["metadata"]["totalCount"], 0);
    assert_eq!(v["metadata"]["sourcesUsed"], json!(["cls", "eastmoney"]));
}

#[tokio::test]
async fn news_merges_stub_sources() {
    let (status, v) = get(stub_router(), "/api/v1/news?keyword=%E5%B0%8F%E7%B1%B3&limit=abc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(v["keyword"], "小米");
    assert_eq!(v["metadata"]["totalCount"], 5);
    assert_eq!(v["metadata"]["sourcesUsed"], json!(["gelonghui", "eastmoney"]));

    let first = &v["data"][0];
    assert_eq!(first["publishTime"], "2026-01-16 12:00:00");
    assert_eq!(first["sourceName"], "东方财富");
    assert_eq!(first["sourceType"], "scraper");
    assert_eq!(first["tags"], json!(["小米"]));

    let (_, v) = get(stub_router(), "/api/v1/news?keyword=%E5%B0%8F%E7%B1%B3&limit=2&sources=eastmoney").await;
    assert_eq!(v["metadata"]["totalCount"], 2);
    assert_eq!(v["metadata"]["sourcesUsed"], json!(["eastmoney"]));
}

#[tokio::test]
async fn unknown_job_is_404() {
    for id in ["not-a-uuid", "3f1c2b7e-9a4d-4c1e-8f00-000000000000"] {
        let (status, v) = get(test_router(), &format!("/api/jobs/{id}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(v["success"], false);
    }
}

#[tokio::test]
async fn scrape_reports_per_source_outcome_and_records_job() {
    let app = test_router();

    let payload = json!({ "keyword": "小米集团", "count": 5, "sources": ["bogus"] });
    let req = Request::builder()
        .method("POST")
        .uri("/api/scrape")
        .header("content-type", "application/json")
        .body(Body::from(payload.to_string()))
        .expect("build POST /api/scrape");

    let resp = app.clone().oneshot(req).await.expect("oneshot /api/scrape");
    assert_eq!(resp.status(), StatusCode::OK);
    let job_id = resp
        .headers()
        .get("x-job-id")
        .and_then(|h| h.to_str().ok())
        .map(str::to_string)
        .expect("x-job-id header");
    let bytes = body::to_bytes(resp.into_body(), BODY_LIMIT).await.expect("read body");
    let v: Json = serde_json::from_slice(&bytes).expect("json");
    assert_eq!(v, json!({"bogus": {"status": "error", "message": "unknown source"}}));

    let (status, job) = get(app, &format!("/api/jobs/{job_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(job["state"], "done");
    assert_eq!(job["keyword"], "小米集团");
    assert_eq!(job["results"]["bogus"]["status"], "error");
}

#[tokio::test]
async fn scrape_requires_keyword() {
    let req = Request::builder()
        .method("POST")
        .uri("/api/scrape")
        .header("content-type", "application/json")
        .body(Body::from(json!({ "sources": ["cls"] }).to_string()))
        .expect("build POST /api/scrape");
    let resp = test_router().oneshot(req).await.expect("oneshot");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}
