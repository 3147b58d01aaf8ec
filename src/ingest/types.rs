// src/ingest/types.rs
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::error::ScrapeError;
use crate::ingest::time::normalize_time;

/// Time as a source reports it, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawTime {
    Text(String),         // e.g. "3小时前", "01-16 17:40"
    Instant(NaiveDateTime), // already parsed by the extractor
    Epoch(i64),           // unix seconds (or ms) from JSON payloads
}

/// One item as produced by a source extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawItem {
    pub source_id: String,
    pub title: String,
    pub summary: Option<String>,
    pub content: Option<String>,
    pub url: Option<String>,
    pub time: Option<RawTime>,
    // research-report sources only
    pub org: Option<String>,
    pub rating: Option<String>,
}

impl RawItem {
    pub fn new(source_id: &str, title: impl Into<String>) -> Self {
        Self {
            source_id: source_id.to_string(),
            title: title.into(),
            summary: None,
            content: None,
            url: None,
            time: None,
            org: None,
            rating: None,
        }
    }

    pub fn with_time_text(mut self, text: impl Into<String>) -> Self {
        let t = text.into();
        self.time = (!t.trim().is_empty()).then_some(RawTime::Text(t));
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        let u = url.into();
        self.url = (!u.trim().is_empty()).then_some(u);
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        let s = summary.into();
        self.summary = (!s.trim().is_empty()).then_some(s);
        self
    }
}

/// Line format of the per-source entrypoint in machine-readable mode.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WireItem {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub url: String,
}

impl WireItem {
    /// Time is resolved against `now`; unknown times go out as "".
    pub fn from_raw(raw: &RawItem, now: NaiveDateTime) -> Self {
        Self {
            title: raw.title.clone(),
            summary: raw.summary.clone(),
            time: normalize_time(raw.time.as_ref(), now).known_text().unwrap_or_default(),
            url: raw.url.clone().unwrap_or_default(),
        }
    }

    pub fn into_raw(self, source_id: &str) -> RawItem {
        let mut raw = RawItem::new(source_id, self.title)
            .with_time_text(self.time)
            .with_url(self.url);
        raw.summary = self.summary.filter(|s| !s.trim().is_empty());
        raw
    }
}

/// Produces raw items for one external source.
///
/// Returns an empty vector when nothing was found; errors are reserved for
/// failures the orchestrator must record against the source.
#[async_trait::async_trait]
pub trait SourceExtractor: Send + Sync {
    async fn extract(&self, keyword: &str, count: usize) -> Result<Vec<RawItem>, ScrapeError>;
    fn source_id(&self) -> &str;
}
