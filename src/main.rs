//! Finnews aggregation service: binary entrypoint.
//! Boots the Axum HTTP server, wiring config, extractors, routes and metrics.

use finnews_aggregator::api::{create_router, AppState};
use finnews_aggregator::config::ServiceConfig;
use finnews_aggregator::metrics::Metrics;
use shuttle_axum::ShuttleAxum;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Enable compact tracing logs in development only.
/// Activation requires BOTH:
///   - dev environment (debug build OR SHUTTLE_ENV in {local, development, dev})
///   - FINNEWS_DEV_LOG=1
fn enable_dev_tracing() {
    let dev_flag = std::env::var("FINNEWS_DEV_LOG")
        .ok()
        .is_some_and(|v| v == "1");

    let is_dev_env = cfg!(debug_assertions)
        || matches!(
            std::env::var("SHUTTLE_ENV")
                .unwrap_or_default()
                .to_ascii_lowercase()
                .as_str(),
            "local" | "development" | "dev"
        );

    if !(dev_flag && is_dev_env) {
        return;
    }

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("finnews_aggregator=debug,info"));

    // Shuttle may already have installed a subscriber; keep theirs in that case.
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .try_init();
}

#[shuttle_runtime::main]
async fn axum() -> ShuttleAxum {
    // Load .env in local/dev; no-op in prod environments.
    let _ = dotenvy::dotenv();

    enable_dev_tracing();

    let config = ServiceConfig::load_default()?;
    info!(
        mode = ?config.extraction_mode,
        source_timeout_secs = config.source_timeout_secs,
        default_limit = config.default_limit,
        "service config loaded"
    );

    let metrics = Metrics::init(config.source_timeout_secs)?;
    let state = AppState::from_config(config)?;

    let router = create_router(state).merge(metrics.router());

    Ok(router.into())
}
