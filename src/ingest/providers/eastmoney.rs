// src/ingest/providers/eastmoney.rs
//! 东方财富 full-text news search. Results are numbered pages of `.news_item`
//! blocks: title on the first line, a `YYYY-MM-DD HH:MM:SS` stamp plus snippet
//! below, and the article link printed as text in `.news_item_url`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::search_url;
use crate::ingest::page::Advance;
use crate::ingest::strategy::{clean_title, truncate_chars, Node, ScanContext, SourceProfile, Strategy, Target};
use crate::ingest::types::RawItem;

static RE_STAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}").expect("eastmoney stamp regex"));

pub static PROFILE: SourceProfile = SourceProfile {
    id: "eastmoney",
    base_url: "https://so.eastmoney.com/",
    entry_url,
    strategies: &[Strategy {
        name: "news_item",
        target: Target::Css(".news_item"),
        read: read_news_item,
    }],
    advance: Advance::PageNumber { param: "pageindex" },
    max_rounds: 10,
    min_title_chars: 10,
    deny_list: &[],
    seen_prefix_chars: 30,
    payload: None,
};

fn entry_url(keyword: &str) -> String {
    search_url("https://so.eastmoney.com/news/s?keyword=", keyword, "&type=content")
}

fn read_news_item(node: &Node<'_>, ctx: &ScanContext<'_>) -> Option<RawItem> {
    let lines = node.lines();
    let (first, rest) = lines.split_first()?;
    let title = ctx.accept_title(first)?;

    let url = node
        .find_text(".news_item_url")
        .or_else(|| node.find("a").and_then(|a| a.value().attr("href").map(str::to_string)))
        .map(|u| ctx.absolute(&u))
        .unwrap_or_default();
    let time = RE_STAMP.find(&rest.join(" ")).map(|m| m.as_str().to_string()).unwrap_or_default();
    let summary = truncate_chars(&clean_title(&rest.join(" ")), 200);

    Some(
        RawItem::new(ctx.source_id(), title)
            .with_time_text(time)
            .with_url(url)
            .with_summary(summary),
    )
}
