// src/ingest/strategy.rs
//! Ordered extraction strategies and the bounded scan/interaction loop.
//!
//! Each source lists strategies from most to least specific. A strategy is
//! considered only when its target matches more than `MIN_STRATEGY_MATCHES`
//! nodes, and accepted when it also yields at least one item. The first
//! accepted strategy wins; later ones are not tried.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::{debug, warn};
use url::Url;

use crate::dedup::fingerprint;
use crate::ingest::normalize_text;
use crate::ingest::page::{Advance, PageDriver, PageRequest};
use crate::ingest::types::RawItem;

pub const MIN_STRATEGY_MATCHES: usize = 2;
pub const MAX_IDLE_ROUNDS: u32 = 10;
pub const MAX_TITLE_CHARS: usize = 300;

static RE_TITLE_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\d{4}-\d{2}-\d{2}(?:T|\s+)\d{1,2}:\d{2}(?::\d{2})?(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?\s*(?:星期[一二三四五六日天])?\s*-?",
    )
    .expect("title time regex")
});
static RE_LINK: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+").expect("link regex"));

/// What a strategy scans.
#[derive(Debug, Clone, Copy)]
pub enum Target {
    /// Elements matching a CSS selector.
    Css(&'static str),
    /// Non-empty text lines of the whole `<body>`.
    TextLines,
}

/// A scanned node handed to a strategy's reader.
pub enum Node<'a> {
    Element(ElementRef<'a>),
    Line(String),
}

impl<'a> Node<'a> {
    /// Trimmed, non-empty text runs, roughly what a browser's innerText splits into.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Node::Element(el) => element_lines(el),
            Node::Line(l) => vec![l.clone()],
        }
    }

    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    pub fn element(&self) -> Option<&ElementRef<'a>> {
        match self {
            Node::Element(el) => Some(el),
            Node::Line(_) => None,
        }
    }

    pub fn attr(&self, name: &str) -> Option<&str> {
        self.element().and_then(|el| el.value().attr(name))
    }

    /// First descendant matching `css`.
    pub fn find(&self, css: &str) -> Option<ElementRef<'a>> {
        let sel = Selector::parse(css).ok()?;
        self.element().and_then(|el| el.select(&sel).next())
    }

    /// Text of the first descendant matching `css`, if non-empty.
    pub fn find_text(&self, css: &str) -> Option<String> {
        self.find(css)
            .map(|el| element_lines(&el).join("\n"))
            .filter(|t| !t.is_empty())
    }
}

pub fn element_lines(el: &ElementRef<'_>) -> Vec<String> {
    el.text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

pub struct Strategy {
    pub name: &'static str,
    pub target: Target,
    pub read: fn(&Node<'_>, &ScanContext<'_>) -> Option<RawItem>,
}

/// Static description of one source's extraction behavior.
pub struct SourceProfile {
    pub id: &'static str,
    pub base_url: &'static str,
    pub entry_url: fn(&str) -> String,
    pub strategies: &'static [Strategy],
    pub advance: Advance,
    /// Hard cap on interaction rounds after the entry page.
    pub max_rounds: u32,
    pub min_title_chars: usize,
    pub deny_list: &'static [&'static str],
    /// Title prefix used to drop repeats across rounds.
    pub seen_prefix_chars: usize,
    /// Reader for documents that arrive as JSON API payloads instead of HTML.
    pub payload: Option<fn(&serde_json::Value, &ScanContext<'_>) -> Vec<RawItem>>,
}

/// Per-scan inputs visible to readers.
pub struct ScanContext<'a> {
    pub keyword: &'a str,
    pub profile: &'a SourceProfile,
}

impl ScanContext<'_> {
    pub fn source_id(&self) -> &'static str {
        self.profile.id
    }

    /// True when `text` carries a known boilerplate phrase.
    pub fn is_chrome(&self, text: &str) -> bool {
        self.profile.deny_list.iter().any(|d| text.contains(d))
    }

    /// Clean a candidate title and apply the length and deny-list gates.
    pub fn accept_title(&self, raw: &str) -> Option<String> {
        let title = clean_title(raw);
        if title.chars().count() < self.profile.min_title_chars || self.is_chrome(&title) {
            return None;
        }
        Some(truncate_chars(&title, MAX_TITLE_CHARS))
    }

    /// Resolve a possibly relative link against the source's base URL.
    pub fn absolute(&self, href: &str) -> String {
        let href = href.trim();
        if href.is_empty() || href.starts_with("javascript:") {
            return String::new();
        }
        Url::parse(self.profile.base_url)
            .and_then(|base| base.join(href))
            .map(|u| u.to_string())
            .unwrap_or_else(|_| href.to_string())
    }
}

/// Remove embedded date/time stamps and link remnants, then normalize whitespace.
pub fn clean_title(raw: &str) -> String {
    let without_time = RE_TITLE_TIME.replace_all(raw, " ");
    let without_links = RE_LINK.replace_all(&without_time, " ");
    normalize_text(&without_links)
}

pub fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

/// Run the ordered strategies against one document snapshot.
pub fn scan_document(html: &str, ctx: &ScanContext<'_>) -> Vec<RawItem> {
    if let Some(read_payload) = ctx.profile.payload {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(html.trim()) {
            return read_payload(&value, ctx);
        }
    }
    let doc = Html::parse_document(html);
    for strategy in ctx.profile.strategies {
        let nodes: Vec<Node<'_>> = match strategy.target {
            Target::Css(css) => match Selector::parse(css) {
                Ok(sel) => doc.select(&sel).map(Node::Element).collect(),
                Err(e) => {
                    warn!(source = ctx.source_id(), strategy = strategy.name, error = ?e, "invalid selector");
                    continue;
                }
            },
            Target::TextLines => body_lines(&doc).into_iter().map(Node::Line).collect(),
        };
        if nodes.len() <= MIN_STRATEGY_MATCHES {
            continue;
        }
        let items: Vec<RawItem> = nodes.iter().filter_map(|n| (strategy.read)(n, ctx)).collect();
        if !items.is_empty() {
            debug!(
                source = ctx.source_id(),
                strategy = strategy.name,
                matched = nodes.len(),
                accepted = items.len(),
                "strategy accepted"
            );
            return items;
        }
    }
    Vec::new()
}

fn body_lines(doc: &Html) -> Vec<String> {
    let Ok(sel) = Selector::parse("body") else {
        return Vec::new();
    };
    doc.select(&sel)
        .next()
        .map(|b| element_lines(&b))
        .unwrap_or_default()
}

/// Entry page, then bounded interaction rounds until `count` unique items are
/// collected, the driver has nothing more, `max_rounds` is spent, or
/// `MAX_IDLE_ROUNDS` consecutive rounds add nothing.
///
/// A failed entry navigation is logged and yields an empty result.
pub async fn collect(
    profile: &SourceProfile,
    driver: &dyn PageDriver,
    keyword: &str,
    count: usize,
) -> Vec<RawItem> {
    let url = (profile.entry_url)(keyword);
    let ctx = ScanContext { keyword, profile };
    let mut seen = HashSet::new();
    let mut out: Vec<RawItem> = Vec::new();
    let mut idle = 0u32;

    for round in 0..=profile.max_rounds {
        let req = PageRequest {
            url: &url,
            round,
            advance: profile.advance,
        };
        let html = match driver.load(&req).await {
            Ok(Some(html)) => html,
            Ok(None) => break,
            Err(e) if round == 0 => {
                warn!(source = profile.id, kind = e.kind(), error = %e, "navigation failed; returning no items");
                return Vec::new();
            }
            Err(e) => {
                warn!(source = profile.id, round, kind = e.kind(), error = %e, "interaction round failed; keeping items so far");
                break;
            }
        };

        let before = out.len();
        for item in scan_document(&html, &ctx) {
            if seen.insert(fingerprint(&item.title, profile.seen_prefix_chars)) {
                out.push(item);
            }
        }
        debug!(source = profile.id, round, added = out.len() - before, total = out.len(), "scan round");

        if out.len() >= count || profile.advance == Advance::None {
            break;
        }
        if out.len() == before {
            idle += 1;
            if idle >= MAX_IDLE_ROUNDS {
                debug!(source = profile.id, round, "no new items for {MAX_IDLE_ROUNDS} rounds");
                break;
            }
        } else {
            idle = 0;
        }
    }

    out.truncate(count);
    out
}
