// src/error.rs
//! Failure taxonomy for one source's extraction path.
//!
//! An empty result is not an error: extractors return `Ok(vec![])` when no
//! strategy matched. Navigation failures are logged inside the extractor and
//! also end as an empty result; the variant exists so page drivers can report
//! them with a classification.

use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScrapeError {
    /// Target unreachable, non-success HTTP status, or load timeout.
    #[error("navigation failed for {url}: {reason}")]
    Navigation { url: String, reason: String },

    /// Orchestrator-enforced deadline exceeded.
    #[error("scrape timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Non-zero exit code, panic, or unexpected termination.
    #[error("scraper crashed: {0}")]
    Crash(String),

    /// Machine-readable mode produced output that does not parse.
    #[error("malformed scraper output: {0}")]
    MalformedOutput(String),

    #[error("io error: {0}")]
    Io(String),
}

impl ScrapeError {
    /// Short classification used as a metrics label and log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ScrapeError::Navigation { .. } => "navigation",
            ScrapeError::Timeout(_) => "timeout",
            ScrapeError::Crash(_) => "crash",
            ScrapeError::MalformedOutput(_) => "malformed_output",
            ScrapeError::Io(_) => "io",
        }
    }

    pub fn navigation(url: impl Into<String>, reason: impl ToString) -> Self {
        ScrapeError::Navigation {
            url: url.into(),
            reason: reason.to_string(),
        }
    }
}

impl From<std::io::Error> for ScrapeError {
    fn from(e: std::io::Error) -> Self {
        ScrapeError::Io(e.to_string())
    }
}
