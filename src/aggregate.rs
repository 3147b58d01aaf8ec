// src/aggregate.rs
//! Aggregation orchestrator.
//!
//! Fans one job out to every selected source as its own tokio task, each under
//! an independent deadline, waits for all of them, then merges successful
//! output in registry priority order and runs normalize → dedup → rank. A
//! source that fails, times out, or panics only contributes an error line.

use std::any::Any;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;
use futures::future::join_all;
use metrics::{counter, histogram};
use serde::Serialize;
use tokio::task::{AbortHandle, JoinError};
use tracing::{info, instrument, warn};

use crate::dedup::dedup_items;
use crate::error::ScrapeError;
use crate::ingest::time::source_now;
use crate::ingest::types::{RawItem, SourceExtractor};
use crate::metrics::ensure_described;
use crate::rank::rank_and_truncate;
use crate::schema::{normalize_items, CanonicalNewsItem, JobContext};
use crate::sources::{SourceDescriptor, SourceRegistry};

/// One aggregate request.
#[derive(Debug, Clone)]
pub struct ScrapeJob {
    pub keyword: String,
    pub limit: usize,
    pub source_ids: Vec<String>,
    pub per_source_timeout: Duration,
    /// Source wall clock at job start; reference for relative times and `createdAt`.
    pub started_at: NaiveDateTime,
}

impl ScrapeJob {
    pub fn new(keyword: &str, limit: usize, source_ids: Vec<String>, per_source_timeout: Duration) -> Self {
        Self {
            keyword: keyword.trim().to_string(),
            limit,
            source_ids,
            per_source_timeout,
            started_at: source_now(),
        }
    }

    pub fn context(&self) -> JobContext {
        JobContext {
            keyword: self.keyword.clone(),
            source_name: String::new(),
            now: self.started_at,
            created_at: self.started_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ScrapeStatus {
    Success,
    Timeout,
    Error,
}

impl ScrapeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScrapeStatus::Success => "success",
            ScrapeStatus::Timeout => "timeout",
            ScrapeStatus::Error => "error",
        }
    }
}

/// Outcome of one source within a job. Successful results never carry an
/// error message; failed ones never carry items.
#[derive(Debug, Clone)]
pub struct ScrapeResult {
    status: ScrapeStatus,
    items: Vec<RawItem>,
    error_message: String,
    elapsed: Duration,
}

impl ScrapeResult {
    pub fn success(items: Vec<RawItem>, elapsed: Duration) -> Self {
        Self {
            status: ScrapeStatus::Success,
            items,
            error_message: String::new(),
            elapsed,
        }
    }

    pub fn failed(err: &ScrapeError, elapsed: Duration) -> Self {
        let status = match err {
            ScrapeError::Timeout(_) => ScrapeStatus::Timeout,
            _ => ScrapeStatus::Error,
        };
        Self {
            status,
            items: Vec::new(),
            error_message: err.to_string(),
            elapsed,
        }
    }

    pub fn status(&self) -> ScrapeStatus {
        self.status
    }

    pub fn items(&self) -> &[RawItem] {
        &self.items
    }

    pub fn error_message(&self) -> &str {
        &self.error_message
    }

    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }
}

/// Lifecycle of an aggregate job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Created,
    FannedOut,
    Collecting,
    Merged,
    Done,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateMetadata {
    pub total_count: usize,
    pub sources_used: Vec<String>,
    pub duration_seconds: f64,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AggregateResponse {
    pub success: bool,
    pub keyword: String,
    pub data: Vec<CanonicalNewsItem>,
    pub metadata: AggregateMetadata,
}

#[derive(Clone)]
pub struct Orchestrator {
    registry: SourceRegistry,
    dedup_prefix_chars: usize,
}

impl Orchestrator {
    pub fn new(registry: SourceRegistry, dedup_prefix_chars: usize) -> Self {
        ensure_described();
        Self {
            registry,
            dedup_prefix_chars,
        }
    }

    pub fn registry(&self) -> &SourceRegistry {
        &self.registry
    }

    /// Run every selected source and return per-source outcomes in priority order.
    pub async fn collect(&self, job: &ScrapeJob) -> Vec<(&'static SourceDescriptor, ScrapeResult)> {
        let selected: Vec<(&'static SourceDescriptor, Arc<dyn SourceExtractor>)> = self
            .registry
            .descriptors()
            .filter(|d| job.source_ids.iter().any(|id| id == d.id))
            .filter_map(|d| self.registry.extractor(d.id).map(|x| (d, x)))
            .collect();

        // deadline is enforced inside each task; waiters only observe it
        let deadline = job.per_source_timeout;
        let spawned: Vec<_> = selected
            .into_iter()
            .map(|(desc, extractor)| {
                let keyword = job.keyword.clone();
                let limit = job.limit;
                let handle = tokio::spawn(async move {
                    tokio::time::timeout(deadline, extractor.extract(&keyword, limit)).await
                });
                (desc, handle)
            })
            .collect();
        log_phase(JobPhase::FannedOut, &job.keyword, spawned.len());

        let waits = spawned.into_iter().map(|(desc, handle)| {
            let abort = AbortOnDrop(handle.abort_handle());
            async move {
                let _abort = abort;
                let started = Instant::now();
                let outcome = match handle.await {
                    Ok(Ok(Ok(items))) => Ok(items),
                    Ok(Ok(Err(e))) => Err(e),
                    Ok(Err(_elapsed)) => Err(ScrapeError::Timeout(deadline)),
                    Err(join_err) => Err(ScrapeError::Crash(join_error_message(join_err))),
                };
                let elapsed = started.elapsed();
                let result = match outcome {
                    Ok(items) => ScrapeResult::success(items, elapsed),
                    Err(e) => {
                        warn!(
                            source = desc.id,
                            kind = e.kind(),
                            elapsed_ms = elapsed.as_millis() as u64,
                            error = %e,
                            "source failed"
                        );
                        ScrapeResult::failed(&e, elapsed)
                    }
                };
                record_source(desc.id, &result);
                (desc, result)
            }
        });
        log_phase(JobPhase::Collecting, &job.keyword, job.source_ids.len());
        join_all(waits).await
    }

    #[instrument(skip(self, job), fields(keyword = %job.keyword, limit = job.limit))]
    pub async fn run(&self, job: ScrapeJob) -> AggregateResponse {
        let t0 = Instant::now();
        log_phase(JobPhase::Created, &job.keyword, job.source_ids.len());

        let outcomes = self.collect(&job).await;

        let ctx = job.context();
        let mut merged: Vec<CanonicalNewsItem> = Vec::new();
        let mut errors: Vec<String> = Vec::new();
        let mut sources_used: Vec<String> = Vec::with_capacity(outcomes.len());
        for (desc, result) in &outcomes {
            sources_used.push(desc.id.to_string());
            if result.status() == ScrapeStatus::Success {
                let take = result.items().len().min(job.limit);
                merged.extend(normalize_items(&result.items()[..take], &ctx.for_source(desc.display_name)));
            } else {
                errors.push(format!("{}: {}", desc.id, result.error_message()));
            }
        }
        log_phase(JobPhase::Merged, &job.keyword, merged.len());

        let (unique, dropped) = dedup_items(merged, self.dedup_prefix_chars);
        let data = rank_and_truncate(unique, job.limit);

        counter!("aggregate_items_total").increment(data.len() as u64);
        counter!("aggregate_dedup_dropped_total").increment(dropped as u64);

        let duration_seconds = (t0.elapsed().as_secs_f64() * 100.0).round() / 100.0;
        info!(
            phase = ?JobPhase::Done,
            items = data.len(),
            dropped,
            failed = errors.len(),
            duration_seconds,
            "aggregate job finished"
        );

        AggregateResponse {
            success: true,
            keyword: job.keyword,
            metadata: AggregateMetadata {
                total_count: data.len(),
                sources_used,
                duration_seconds,
                errors: (!errors.is_empty()).then_some(errors),
            },
            data,
        }
    }
}

/// Aborts a source task when its waiter is dropped before it finishes.
struct AbortOnDrop(AbortHandle);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

fn log_phase(phase: JobPhase, keyword: &str, n: usize) {
    info!(?phase, keyword, n, "aggregate phase");
}

fn record_source(source: &'static str, result: &ScrapeResult) {
    counter!("scrape_source_runs_total", "source" => source, "status" => result.status().as_str()).increment(1);
    histogram!("scrape_source_duration_ms", "source" => source).record(result.elapsed().as_secs_f64() * 1_000.0);
}

fn join_error_message(err: JoinError) -> String {
    if err.is_cancelled() {
        return "task cancelled".to_string();
    }
    let payload: Box<dyn Any + Send> = err.into_panic();
    let msg = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    format!("task panicked: {msg}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failed_results_never_carry_items() {
        let r = ScrapeResult::failed(&ScrapeError::Timeout(Duration::from_secs(5)), Duration::from_secs(5));
        assert_eq!(r.status(), ScrapeStatus::Timeout);
        assert!(r.items().is_empty());
        assert_eq!(r.error_message(), "scrape timed out after 5s");

        let ok = ScrapeResult::success(vec![RawItem::new("cls", "t")], Duration::ZERO);
        assert!(ok.error_message().is_empty());
    }
}
