// src/ingest/providers/zhitong.rs
//! 智通财经 flash news. The markup has no stable item class, so any `a`, `div`
//! or `p` whose text carries a full `YYYY-MM-DD HH:MM:SS` stamp is a candidate.
//! Nested containers produce repeats; the round loop drops them by title.

use once_cell::sync::Lazy;
use regex::Regex;

use super::search_url;
use crate::ingest::page::Advance;
use crate::ingest::strategy::{truncate_chars, Node, ScanContext, SourceProfile, Strategy, Target};
use crate::ingest::types::RawItem;

static RE_STAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}").expect("zhitong stamp regex"));
static RE_YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d{4}-\d{2}").expect("year regex"));

pub static PROFILE: SourceProfile = SourceProfile {
    id: "zhitong",
    base_url: "https://www.zhitongcaijing.com/",
    entry_url,
    strategies: &[Strategy {
        name: "stamped_blocks",
        target: Target::Css("a, div, p"),
        read: read_stamped_block,
    }],
    advance: Advance::Scroll,
    max_rounds: 10,
    min_title_chars: 16,
    deny_list: &[],
    seen_prefix_chars: 30,
    payload: None,
};

fn entry_url(keyword: &str) -> String {
    search_url("https://www.zhitongcaijing.com/search/index.html?keywords=", keyword, "&type=flash")
}

fn read_stamped_block(node: &Node<'_>, ctx: &ScanContext<'_>) -> Option<RawItem> {
    let text = node.text();
    let len = text.chars().count();
    if len <= 30 || len >= 800 {
        return None;
    }
    let stamp = RE_STAMP.find(&text)?.as_str().to_string();
    let headline = node
        .lines()
        .into_iter()
        .find(|l| l.chars().count() > 15 && !RE_YEAR.is_match(l))?;
    let title = ctx.accept_title(&truncate_chars(&headline, 200))?;
    let url = node.attr("href").map(|h| ctx.absolute(h)).unwrap_or_default();

    Some(RawItem::new(ctx.source_id(), title).with_time_text(stamp).with_url(url))
}
