use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use shuttle_axum::axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use tower_http::cors::CorsLayer;
use tracing::{info, warn};
use uuid::Uuid;

use crate::aggregate::{AggregateResponse, Orchestrator, ScrapeJob};
use crate::config::{ExtractionMode, ServiceConfig};
use crate::ingest::page::HttpPageDriver;
use crate::interactive::InteractiveRunner;
use crate::jobs::{JobRecord, JobRegistry};
use crate::sources::{SourceDescriptor, SourceRegistry, DEFAULT_SOURCES};

pub const SERVICE_NAME: &str = env!("CARGO_PKG_NAME");
pub const SERVICE_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Clone)]
pub struct AppState {
    orchestrator: Arc<Orchestrator>,
    runner: Arc<InteractiveRunner>,
    jobs: Arc<JobRegistry>,
    config: Arc<ServiceConfig>,
}

impl AppState {
    pub fn new(orchestrator: Orchestrator, runner: InteractiveRunner, config: ServiceConfig) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            runner: Arc::new(runner),
            jobs: Arc::new(JobRegistry::with_capacity(config.max_jobs)),
            config: Arc::new(config),
        }
    }

    /// Wire extractors for the configured extraction mode.
    pub fn from_config(config: ServiceConfig) -> anyhow::Result<Self> {
        let registry = match config.extraction_mode {
            ExtractionMode::InProcess => {
                let driver = HttpPageDriver::new(&config.user_agent, config.navigation_timeout())?;
                SourceRegistry::in_process(Arc::new(driver))
            }
            ExtractionMode::Subprocess => SourceRegistry::subprocess(config.scraper_bin.clone()),
        };
        let runner = InteractiveRunner {
            program: config.scraper_bin.clone(),
            report_dir: config.report_dir.clone(),
            timeout: config.source_timeout(),
        };
        let orchestrator = Orchestrator::new(registry, config.dedup_prefix_chars);
        Ok(Self::new(orchestrator, runner, config))
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/sources", get(list_sources))
        .route("/api/v1/news", get(news))
        .route("/api/scrape", post(scrape))
        .route("/api/jobs/{id}", get(job_status))
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("missing keyword parameter")]
    MissingKeyword,
    #[error("no valid sources")]
    NoSources,
    #[error("job not found")]
    UnknownJob,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::MissingKeyword | ApiError::NoSources => StatusCode::BAD_REQUEST,
            ApiError::UnknownJob => StatusCode::NOT_FOUND,
        };
        (status, Json(json!({ "success": false, "error": self.to_string() }))).into_response()
    }
}

/// `limit` arrives as text; anything unparsable or non-positive means the default.
pub fn parse_limit(raw: Option<&str>, default: usize) -> usize {
    raw.and_then(|s| s.trim().parse::<i64>().ok())
        .filter(|n| *n > 0)
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(default)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct HealthResp {
    status: &'static str,
    service: &'static str,
    version: &'static str,
    scrapers_count: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResp> {
    Json(HealthResp {
        status: "ok",
        service: SERVICE_NAME,
        version: SERVICE_VERSION,
        scrapers_count: state.orchestrator.registry().len(),
    })
}

#[derive(Serialize)]
struct SourcesResp {
    success: bool,
    sources: Vec<&'static SourceDescriptor>,
    default: [&'static str; 3],
}

async fn list_sources(State(state): State<AppState>) -> Json<SourcesResp> {
    Json(SourcesResp {
        success: true,
        sources: state.orchestrator.registry().descriptors().collect(),
        default: DEFAULT_SOURCES,
    })
}

#[derive(Deserialize)]
struct NewsQuery {
    keyword: Option<String>,
    sources: Option<String>,
    limit: Option<String>,
}

async fn news(
    State(state): State<AppState>,
    Query(q): Query<NewsQuery>,
) -> Result<Json<AggregateResponse>, ApiError> {
    let keyword = q.keyword.as_deref().map(str::trim).unwrap_or_default();
    if keyword.is_empty() {
        return Err(ApiError::MissingKeyword);
    }
    let selected = state
        .orchestrator
        .registry()
        .resolve(q.sources.as_deref().unwrap_or("all"));
    if selected.is_empty() {
        return Err(ApiError::NoSources);
    }
    let limit = parse_limit(q.limit.as_deref(), state.config.default_limit);
    let ids = selected.iter().map(|d| d.id.to_string()).collect();

    let job = ScrapeJob::new(keyword, limit, ids, state.config.source_timeout());
    Ok(Json(state.orchestrator.run(job).await))
}

#[derive(Deserialize)]
struct ScrapeReq {
    #[serde(default)]
    keyword: String,
    #[serde(default)]
    count: Option<usize>,
    #[serde(default)]
    sources: Vec<String>,
}

async fn scrape(State(state): State<AppState>, Json(body): Json<ScrapeReq>) -> Result<Response, ApiError> {
    let keyword = body.keyword.trim();
    if keyword.is_empty() {
        return Err(ApiError::MissingKeyword);
    }
    let count = body
        .count
        .filter(|c| *c > 0)
        .unwrap_or(state.config.default_limit);

    let id = state.jobs.create(keyword, &body.sources);
    state.jobs.mark_running(id);
    info!(job = %id, keyword, sources = body.sources.len(), "interactive scrape started");

    let runner = state.runner.clone();
    let (kw, sources) = (keyword.to_string(), body.sources.clone());
    let results = match tokio::spawn(async move { runner.run(&kw, count, &sources).await }).await {
        Ok(results) => {
            state.jobs.finish(id, results.clone());
            results
        }
        Err(e) => {
            warn!(job = %id, error = %e, "interactive scrape aborted");
            state.jobs.fail(id, &e.to_string());
            BTreeMap::new()
        }
    };

    Ok(([("x-job-id", id.to_string())], Json(results)).into_response())
}

async fn job_status(State(state): State<AppState>, Path(id): Path<String>) -> Result<Json<JobRecord>, ApiError> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::UnknownJob)?;
    state.jobs.get(id).map(Json).ok_or(ApiError::UnknownJob)
}
