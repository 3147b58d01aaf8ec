// src/sources.rs
//! Static source registry: ids, display names, priority order, and the
//! extractor wired to each source for the current extraction mode.

use std::path::PathBuf;
use std::sync::Arc;

use serde::Serialize;

use crate::ingest::page::PageDriver;
use crate::ingest::providers::{profile, ProfileExtractor};
use crate::ingest::subprocess::SubprocessExtractor;
use crate::ingest::types::SourceExtractor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceDescriptor {
    pub id: &'static str,
    #[serde(rename = "name")]
    pub display_name: &'static str,
    /// Typical wall time of one run, informational.
    #[serde(rename = "estimatedDuration", serialize_with = "as_seconds_label")]
    pub estimated_secs: u32,
}

fn as_seconds_label<S: serde::Serializer>(secs: &u32, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(&format_args!("~{secs}s"))
}

/// Registry order doubles as merge priority.
pub static SOURCES: [SourceDescriptor; 8] = [
    SourceDescriptor { id: "toutiao", display_name: "今日头条", estimated_secs: 65 },
    SourceDescriptor { id: "cls", display_name: "财联社", estimated_secs: 8 },
    SourceDescriptor { id: "wallstreet", display_name: "华尔街见闻", estimated_secs: 13 },
    SourceDescriptor { id: "futu", display_name: "富途新闻", estimated_secs: 17 },
    SourceDescriptor { id: "futu_report", display_name: "富途研报", estimated_secs: 13 },
    SourceDescriptor { id: "gelonghui", display_name: "格隆汇", estimated_secs: 7 },
    SourceDescriptor { id: "eastmoney", display_name: "东方财富", estimated_secs: 10 },
    SourceDescriptor { id: "zhitong", display_name: "智通财经", estimated_secs: 24 },
];

/// Subset suggested to API clients.
pub const DEFAULT_SOURCES: [&str; 3] = ["eastmoney", "gelonghui", "zhitong"];

pub fn descriptor(id: &str) -> Option<&'static SourceDescriptor> {
    SOURCES.iter().find(|d| d.id == id)
}

fn priority(id: &str) -> usize {
    SOURCES.iter().position(|d| d.id == id).unwrap_or(usize::MAX)
}

/// Sources with a wired extractor.
#[derive(Clone)]
pub struct SourceRegistry {
    entries: Vec<(&'static SourceDescriptor, Arc<dyn SourceExtractor>)>,
}

impl SourceRegistry {
    /// Extractors whose `source_id` matches a known descriptor; others are ignored.
    pub fn from_extractors(extractors: impl IntoIterator<Item = Arc<dyn SourceExtractor>>) -> Self {
        let mut entries: Vec<_> = extractors
            .into_iter()
            .filter_map(|x| descriptor(x.source_id()).map(|d| (d, x)))
            .collect();
        entries.sort_by_key(|(d, _)| priority(d.id));
        entries.dedup_by_key(|(d, _)| d.id);
        Self { entries }
    }

    /// Every source scraped in-process through `driver`.
    pub fn in_process(driver: Arc<dyn PageDriver>) -> Self {
        Self::from_extractors(SOURCES.iter().filter_map(|d| {
            profile(d.id).map(|p| Arc::new(ProfileExtractor::new(p, driver.clone())) as Arc<dyn SourceExtractor>)
        }))
    }

    /// Every source scraped by spawning `program` per run.
    pub fn subprocess(program: impl Into<PathBuf>) -> Self {
        let program = program.into();
        Self::from_extractors(
            SOURCES
                .iter()
                .map(|d| Arc::new(SubprocessExtractor::new(d.id, program.clone())) as Arc<dyn SourceExtractor>),
        )
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &'static SourceDescriptor> + '_ {
        self.entries.iter().map(|(d, _)| *d)
    }

    pub fn extractor(&self, id: &str) -> Option<Arc<dyn SourceExtractor>> {
        self.entries.iter().find(|(d, _)| d.id == id).map(|(_, x)| x.clone())
    }

    /// Resolve a `sources` request parameter: `all` selects every source,
    /// otherwise a comma list filtered to known ids. A blank list selects
    /// nothing. Result is in priority order without repeats.
    pub fn resolve(&self, param: &str) -> Vec<&'static SourceDescriptor> {
        let param = param.trim();
        if param.eq_ignore_ascii_case("all") {
            return self.descriptors().collect();
        }
        let wanted: Vec<&str> = param.split(',').map(str::trim).collect();
        self.descriptors().filter(|d| wanted.contains(&d.id)).collect()
    }
}
