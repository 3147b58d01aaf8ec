// src/ingest/providers/cls.rs
//! 财联社 telegram search. The result markup changes often, so nine container
//! selectors are tried before falling back to reading the page body line by
//! line. Every accepted entry must carry a stamp; undated blocks are chrome.

use once_cell::sync::Lazy;
use regex::Regex;

use super::search_url;
use crate::ingest::page::Advance;
use crate::ingest::strategy::{Node, ScanContext, SourceProfile, Strategy, Target};
use crate::ingest::types::RawItem;

static RE_STAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}|\d{2}-\d{2}\s+\d{2}:\d{2}").expect("cls stamp regex")
});
static RE_LEADING_STAMP: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\d{4}-)?\d{2}-\d{2}\s+\d{2}:\d{2}\s*(?:星期[一二三四五六日天])?\s*").expect("cls lead regex")
});

const MIN_BLOCK_CHARS: usize = 30;
const MAX_LINE_CHARS: usize = 500;

macro_rules! block {
    ($name:literal, $css:literal) => {
        Strategy {
            name: $name,
            target: Target::Css($css),
            read: read_block,
        }
    };
}

pub static PROFILE: SourceProfile = SourceProfile {
    id: "cls",
    base_url: "https://www.cls.cn/",
    entry_url,
    strategies: &[
        block!("telegram_wrap", "div.search-telegram-wrap div"),
        block!("telegram_item", "div.search-telegram-item"),
        block!("telegraph_item", "div.telegraph-item"),
        block!("telegraph_class", r#"div[class*="telegraph"]"#),
        block!("telegram_class", r#"div[class*="telegram"]"#),
        block!("search_children", r#"div[class*="search"] div"#),
        block!("content_wrap", "div.content-wrap div"),
        block!("list_item", "div.list-item"),
        block!("article", "article"),
        Strategy {
            name: "body_lines",
            target: Target::TextLines,
            read: read_line,
        },
    ],
    advance: Advance::None,
    max_rounds: 0,
    min_title_chars: 20,
    deny_list: &["热门话题", "A股公告", "环球市场", "+关注", "加载更多"],
    seen_prefix_chars: 40,
    payload: None,
};

fn entry_url(keyword: &str) -> String {
    search_url("https://www.cls.cn/searchPage?keyword=", keyword, "&type=telegram")
}

fn dated_item(text: &str, ctx: &ScanContext<'_>) -> Option<RawItem> {
    if ctx.is_chrome(text) {
        return None;
    }
    let stamp = RE_STAMP.find(text)?.as_str().to_string();
    let body = RE_LEADING_STAMP.replace(text.trim(), "");
    let title = ctx.accept_title(&body)?;
    Some(RawItem::new(ctx.source_id(), title).with_time_text(stamp))
}

fn read_block(node: &Node<'_>, ctx: &ScanContext<'_>) -> Option<RawItem> {
    let text = node.text();
    if text.chars().count() < MIN_BLOCK_CHARS {
        return None;
    }
    dated_item(&text, ctx)
}

fn read_line(node: &Node<'_>, ctx: &ScanContext<'_>) -> Option<RawItem> {
    let line = node.text();
    let len = line.chars().count();
    if !(MIN_BLOCK_CHARS..=MAX_LINE_CHARS).contains(&len) {
        return None;
    }
    // telegram lines carry the outlet byline
    if !line.contains("财联社") && !line.contains('电') {
        return None;
    }
    dated_item(&line, ctx)
}
