// src/ingest/providers/futu.rs
//! 富途 news search panel (`.web_search-news-item`).

use super::search_url;
use crate::ingest::page::Advance;
use crate::ingest::strategy::{truncate_chars, Node, ScanContext, SourceProfile, Strategy, Target};
use crate::ingest::time::find_time_text;
use crate::ingest::types::RawItem;

pub static PROFILE: SourceProfile = SourceProfile {
    id: "futu",
    base_url: "https://news.futunn.com/",
    entry_url,
    strategies: &[Strategy {
        name: "news_item",
        target: Target::Css(".web_search-news-item"),
        read: read_news_item,
    }],
    advance: Advance::LoadMore,
    max_rounds: 10,
    min_title_chars: 10,
    deny_list: &["加载更多"],
    seen_prefix_chars: 30,
    payload: None,
};

fn entry_url(keyword: &str) -> String {
    search_url("https://news.futunn.com/search?keyword=", keyword, "&tab=news")
}

fn read_news_item(node: &Node<'_>, ctx: &ScanContext<'_>) -> Option<RawItem> {
    let raw_title = node
        .find_text(".web_search-news-item-title")
        .or_else(|| node.lines().into_iter().next())?;
    let title = ctx.accept_title(&raw_title)?;

    let text = node.text();
    let time = node
        .find_text(".web_search-news-item-time")
        .or_else(|| find_time_text(&text).map(str::to_string))
        .unwrap_or_default();
    let url = node
        .attr("href")
        .map(str::to_string)
        .or_else(|| node.find("a").and_then(|a| a.value().attr("href").map(str::to_string)))
        .map(|h| ctx.absolute(&h))
        .unwrap_or_default();
    let summary = node
        .find_text(".web_search-news-item-desc")
        .map(|s| truncate_chars(&s, 200))
        .unwrap_or_default();

    Some(
        RawItem::new(ctx.source_id(), title)
            .with_time_text(time)
            .with_url(url)
            .with_summary(summary),
    )
}
