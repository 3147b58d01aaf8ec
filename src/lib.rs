// src/lib.rs
// Public library surface for the service binary, the per-source entrypoint,
// and integration tests.

pub mod aggregate;
pub mod api;
pub mod config;
pub mod dedup;
pub mod error;
pub mod ingest;
pub mod interactive;
pub mod jobs;
pub mod metrics;
pub mod rank;
pub mod report;
pub mod schema;
pub mod sources;

// ---- Re-exports for stable public API ----
pub use crate::aggregate::{AggregateResponse, Orchestrator, ScrapeJob};
pub use crate::api::{create_router, AppState};
pub use crate::error::ScrapeError;
pub use crate::schema::CanonicalNewsItem;
