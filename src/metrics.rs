use axum::{routing::get, Router};
use metrics::{describe_counter, describe_histogram, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;

pub struct Metrics {
    pub handle: PrometheusHandle,
}

/// Register descriptions once so series show up on `/metrics` before first use.
pub fn ensure_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "scrape_source_runs_total",
            "Per-source extraction runs by outcome (success, timeout, error)."
        );
        describe_histogram!("scrape_source_duration_ms", "Per-source extraction wall time in milliseconds.");
        describe_counter!("aggregate_items_total", "Items returned by aggregate jobs.");
        describe_counter!("aggregate_dedup_dropped_total", "Items removed as title-prefix duplicates.");
    });
}

impl Metrics {
    /// Install the Prometheus recorder and publish the configured source deadline.
    pub fn init(source_timeout_secs: u64) -> anyhow::Result<Self> {
        // Use default buckets to avoid API differences across crate versions.
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| anyhow::anyhow!("prometheus: install recorder: {e}"))?;

        ensure_described();
        gauge!("scrape_source_timeout_secs").set(source_timeout_secs as f64);

        Ok(Self { handle })
    }

    /// Returns a router exposing `/metrics` with the Prometheus exposition format.
    pub fn router(&self) -> Router {
        let handle = self.handle.clone();
        Router::new().route(
            "/metrics",
            get(move || {
                let h = handle.clone();
                async move { h.render() }
            }),
        )
    }
}
