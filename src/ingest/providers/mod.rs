// src/ingest/providers/mod.rs
//! Per-source extraction profiles and the extractor that drives them.

pub mod cls;
pub mod eastmoney;
pub mod futu;
pub mod futu_report;
pub mod gelonghui;
pub mod toutiao;
pub mod wallstreet;
pub mod zhitong;

use std::sync::Arc;

use async_trait::async_trait;
use tracing::instrument;

use crate::error::ScrapeError;
use crate::ingest::page::PageDriver;
use crate::ingest::strategy::{collect, SourceProfile};
use crate::ingest::types::{RawItem, SourceExtractor};

/// Every known profile, in registry priority order.
pub static PROFILES: [&SourceProfile; 8] = [
    &toutiao::PROFILE,
    &cls::PROFILE,
    &wallstreet::PROFILE,
    &futu::PROFILE,
    &futu_report::PROFILE,
    &gelonghui::PROFILE,
    &eastmoney::PROFILE,
    &zhitong::PROFILE,
];

pub fn profile(id: &str) -> Option<&'static SourceProfile> {
    PROFILES.iter().copied().find(|p| p.id == id)
}

/// Search URL with the keyword percent-encoded into the query.
pub(crate) fn search_url(prefix: &str, keyword: &str, suffix: &str) -> String {
    format!("{prefix}{}{suffix}", urlencoding::encode(keyword))
}

/// Runs one profile's strategies through a page driver.
#[derive(Clone)]
pub struct ProfileExtractor {
    profile: &'static SourceProfile,
    driver: Arc<dyn PageDriver>,
}

impl ProfileExtractor {
    pub fn new(profile: &'static SourceProfile, driver: Arc<dyn PageDriver>) -> Self {
        Self { profile, driver }
    }

    pub fn profile(&self) -> &'static SourceProfile {
        self.profile
    }
}

#[async_trait]
impl SourceExtractor for ProfileExtractor {
    #[instrument(skip(self), fields(source = self.profile.id))]
    async fn extract(&self, keyword: &str, count: usize) -> Result<Vec<RawItem>, ScrapeError> {
        Ok(collect(self.profile, self.driver.as_ref(), keyword, count).await)
    }

    fn source_id(&self) -> &str {
        self.profile.id
    }
}
