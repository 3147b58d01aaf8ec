// src/ingest/providers/wallstreet.rs
//! 华尔街见闻 live feed search. Items are `div.live-item` blocks with an exact
//! ISO stamp in `time.live-item_created[datetime]`.

use super::search_url;
use crate::ingest::page::Advance;
use crate::ingest::strategy::{truncate_chars, Node, ScanContext, SourceProfile, Strategy, Target};
use crate::ingest::types::RawItem;

pub static PROFILE: SourceProfile = SourceProfile {
    id: "wallstreet",
    base_url: "https://wallstreetcn.com/",
    entry_url,
    strategies: &[Strategy {
        name: "live_item",
        target: Target::Css("div.live-item"),
        read: read_live_item,
    }],
    advance: Advance::LoadMore,
    max_rounds: 5,
    min_title_chars: 10,
    deny_list: &[],
    seen_prefix_chars: 40,
    payload: None,
};

fn entry_url(keyword: &str) -> String {
    search_url("https://wallstreetcn.com/search?q=", keyword, "&type=live")
}

fn read_live_item(node: &Node<'_>, ctx: &ScanContext<'_>) -> Option<RawItem> {
    // undated entries are ads or pinned notices
    let stamp = node
        .find("time.live-item_created")?
        .value()
        .attr("datetime")
        .filter(|d| !d.trim().is_empty())?
        .to_string();

    let headline = node.find_text("div.live-item_title").unwrap_or_default();
    let content = node.find_text("div.live-item_html").unwrap_or_default();
    // flashes without a bracketed headline lead with their body
    let raw_title = if headline.is_empty() {
        content.lines().next().unwrap_or_default().to_string()
    } else {
        headline
    };
    let title = ctx.accept_title(&truncate_chars(&raw_title, 200))?;
    let url = node
        .find("a")
        .and_then(|a| a.value().attr("href").map(|h| ctx.absolute(h)))
        .unwrap_or_default();

    let mut item = RawItem::new(ctx.source_id(), title)
        .with_time_text(stamp)
        .with_url(url)
        .with_summary(truncate_chars(&content, 200));
    item.content = (!content.is_empty()).then(|| truncate_chars(&content, 500));
    Some(item)
}
