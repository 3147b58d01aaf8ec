// src/schema.rs
//! Canonical news record and the RawItem → CanonicalNewsItem mapping.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::ingest::normalize_text;
use crate::ingest::strategy::{truncate_chars, MAX_TITLE_CHARS};
use crate::ingest::time::{normalize_time, PublishTime};
use crate::ingest::types::RawItem;

pub const SOURCE_TYPE: &str = "scraper";
pub const DEFAULT_SENTIMENT: &str = "neutral";
pub const DEFAULT_RELEVANCE: f64 = 0.8;

/// Everything the normalizer needs besides the item itself. Fixed per job and
/// source, so normalization is deterministic.
#[derive(Debug, Clone)]
pub struct JobContext {
    pub keyword: String,
    /// Display name of the source the items came from.
    pub source_name: String,
    /// Reference instant for relative times, in the sources' wall clock.
    pub now: NaiveDateTime,
    /// Job start; stamped on every item as `createdAt`.
    pub created_at: NaiveDateTime,
}

impl JobContext {
    pub fn for_source(&self, source_name: &str) -> Self {
        Self {
            source_name: source_name.to_string(),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalNewsItem {
    pub keyword: String,
    pub title: String,
    pub summary: String,
    pub content: String,
    pub source_name: String,
    pub source_type: String,
    pub url: String,
    pub publish_time: PublishTime,
    pub sentiment: String,
    pub relevance_score: f64,
    pub tags: Vec<String>,
    pub created_at: NaiveDateTime,
}

/// Map one raw item; `None` when the title is empty after normalization.
pub fn normalize_item(raw: &RawItem, ctx: &JobContext) -> Option<CanonicalNewsItem> {
    let title = truncate_chars(&normalize_text(&raw.title), MAX_TITLE_CHARS);
    if title.is_empty() {
        return None;
    }
    let summary = raw.summary.as_deref().map(normalize_text).unwrap_or_default();
    let content = raw
        .content
        .as_deref()
        .map(normalize_text)
        .filter(|c| !c.is_empty())
        .unwrap_or_else(|| summary.clone());

    Some(CanonicalNewsItem {
        keyword: ctx.keyword.clone(),
        title,
        summary,
        content,
        source_name: ctx.source_name.clone(),
        source_type: SOURCE_TYPE.to_string(),
        url: raw.url.as_deref().map(str::trim).unwrap_or_default().to_string(),
        publish_time: normalize_time(raw.time.as_ref(), ctx.now),
        sentiment: DEFAULT_SENTIMENT.to_string(),
        relevance_score: DEFAULT_RELEVANCE,
        tags: vec![ctx.keyword.clone()],
        created_at: ctx.created_at,
    })
}

/// Normalize a batch, dropping items that fail, preserving order.
pub fn normalize_items(raws: &[RawItem], ctx: &JobContext) -> Vec<CanonicalNewsItem> {
    raws.iter().filter_map(|r| normalize_item(r, ctx)).collect()
}
