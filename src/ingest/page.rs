// src/ingest/page.rs
//! Remote document access. Extractors only see HTML snapshots: round 0 is the
//! entry page, every later round is the document after one more interaction
//! (next page, load-more click, scroll). How a driver performs that
//! interaction is its own business.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use crate::error::ScrapeError;

/// How a source exposes more results after the first scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Numbered pages addressable through a query parameter.
    PageNumber { param: &'static str },
    /// A "load more" button.
    LoadMore,
    /// Infinite scroll.
    Scroll,
    /// Single page only.
    None,
}

#[derive(Debug, Clone)]
pub struct PageRequest<'a> {
    pub url: &'a str,
    pub round: u32,
    pub advance: Advance,
}

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Document after `req.round` interactions, or `None` when no further
    /// interaction is possible.
    async fn load(&self, req: &PageRequest<'_>) -> Result<Option<String>, ScrapeError>;
}

/// Plain HTTP driver. Only numbered pages can be advanced; script-driven
/// loading (load-more, scroll) ends after the entry page.
#[derive(Clone)]
pub struct HttpPageDriver {
    client: Client,
}

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

impl HttpPageDriver {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ScrapeError> {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ScrapeError::Io(format!("http client: {e}")))?;
        Ok(Self { client })
    }

    async fn get(&self, url: &str) -> Result<String, ScrapeError> {
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScrapeError::navigation(url, e))?;
        let resp = resp
            .error_for_status()
            .map_err(|e| ScrapeError::navigation(url, e))?;
        resp.text().await.map_err(|e| ScrapeError::navigation(url, e))
    }
}

/// Append `param=page` to `url`.
pub fn page_url(url: &str, param: &str, page: u32) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!("{url}{sep}{param}={page}")
}

#[async_trait]
impl PageDriver for HttpPageDriver {
    async fn load(&self, req: &PageRequest<'_>) -> Result<Option<String>, ScrapeError> {
        let target = match (req.round, req.advance) {
            (0, _) => req.url.to_string(),
            (n, Advance::PageNumber { param }) => page_url(req.url, param, n + 1),
            _ => return Ok(None),
        };
        debug!(url = %target, round = req.round, "fetching page");
        self.get(&target).await.map(Some)
    }
}

/// Serves pre-recorded snapshots by round. Used by tests and offline replays.
#[derive(Debug, Default)]
pub struct FixturePageDriver {
    snapshots: Vec<String>,
    unreachable: bool,
    visited: Mutex<Vec<String>>,
}

impl FixturePageDriver {
    pub fn new<S: Into<String>>(snapshots: impl IntoIterator<Item = S>) -> Self {
        Self {
            snapshots: snapshots.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// A driver whose entry page never loads.
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    /// Entry URLs requested so far.
    pub fn visited(&self) -> Vec<String> {
        self.visited.lock().map(|v| v.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl PageDriver for FixturePageDriver {
    async fn load(&self, req: &PageRequest<'_>) -> Result<Option<String>, ScrapeError> {
        if let Ok(mut v) = self.visited.lock() {
            v.push(req.url.to_string());
        }
        if self.unreachable {
            return Err(ScrapeError::navigation(req.url, "fixture marked unreachable"));
        }
        Ok(self.snapshots.get(req.round as usize).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_url_picks_separator() {
        assert_eq!(page_url("https://a.test/s?q=x", "page", 2), "https://a.test/s?q=x&page=2");
        assert_eq!(page_url("https://a.test/s", "p", 3), "https://a.test/s?p=3");
    }

    #[tokio::test]
    async fn fixture_driver_serves_rounds_then_none() {
        let d = FixturePageDriver::new(["<p>a</p>", "<p>b</p>"]);
        let mut req = PageRequest {
            url: "https://x.test",
            round: 0,
            advance: Advance::Scroll,
        };
        assert_eq!(d.load(&req).await.unwrap().as_deref(), Some("<p>a</p>"));
        req.round = 2;
        assert_eq!(d.load(&req).await.unwrap(), None);
        assert_eq!(d.visited().len(), 2);
    }
}
