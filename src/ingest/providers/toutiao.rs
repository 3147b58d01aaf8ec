// src/ingest/providers/toutiao.rs
//! 今日头条 search. Cards come in several layouts; the headline is the first
//! `a`, heading or `[class*=title]` element with more than 20 characters, and
//! the publish time is searched anywhere in the card text.

use once_cell::sync::Lazy;
use regex::Regex;

use super::search_url;
use crate::ingest::page::Advance;
use crate::ingest::strategy::{element_lines, Node, ScanContext, SourceProfile, Strategy, Target};
use crate::ingest::types::RawItem;

static RE_CARD_TIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d+分钟前|\d+小时前|\d+天前|昨天|前天|\d{4}年\d{1,2}月\d{1,2}日|\d{1,2}月\d{1,2}日")
        .expect("card time regex")
});

const HEADLINE_SELECTORS: [&str; 5] = ["a", "h1", "h2", "h3", r#"[class*="title"]"#];
const MIN_HEADLINE_CHARS: usize = 21;

macro_rules! card {
    ($name:literal, $css:literal) => {
        Strategy {
            name: $name,
            target: Target::Css($css),
            read: read_card,
        }
    };
}

pub static PROFILE: SourceProfile = SourceProfile {
    id: "toutiao",
    base_url: "https://www.toutiao.com/",
    entry_url,
    strategies: &[
        card!("result_content", "div.result-content"),
        card!("result_class", r#"div[class*="result"]"#),
        card!("feed_card", r#"div[class*="feed-card"]"#),
        card!("card_class", r#"div[class*="card"]"#),
        card!("article", "article"),
    ],
    advance: Advance::PageNumber { param: "page_num" },
    max_rounds: 4,
    min_title_chars: 15,
    deny_list: &[],
    seen_prefix_chars: 30,
    payload: None,
};

fn entry_url(keyword: &str) -> String {
    search_url("https://so.toutiao.com/search?dvpf=pc&source=pagination&keyword=", keyword, "")
}

fn headline(node: &Node<'_>) -> Option<String> {
    HEADLINE_SELECTORS.iter().find_map(|css| {
        node.find(css)
            .map(|el| element_lines(&el).join(" "))
            .filter(|t| t.chars().count() >= MIN_HEADLINE_CHARS)
    })
}

fn read_card(node: &Node<'_>, ctx: &ScanContext<'_>) -> Option<RawItem> {
    let title = ctx.accept_title(&headline(node)?)?;
    let url = node
        .find("a")
        .and_then(|a| a.value().attr("href").map(|h| ctx.absolute(h)))
        .unwrap_or_default();
    let text = node.text();
    let time = RE_CARD_TIME.find(&text).map(|m| m.as_str().to_string()).unwrap_or_default();

    Some(RawItem::new(ctx.source_id(), title).with_time_text(time).with_url(url))
}
