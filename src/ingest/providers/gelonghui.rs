// src/ingest/providers/gelonghui.rs
//! 格隆汇 news search. Each hit is an `a[href*="/news/"]` card whose first
//! line is the headline; dates appear as `格隆汇1月16日` or `01-16 17:40`.

use once_cell::sync::Lazy;
use regex::Regex;

use super::search_url;
use crate::ingest::page::Advance;
use crate::ingest::strategy::{truncate_chars, Node, ScanContext, SourceProfile, Strategy, Target};
use crate::ingest::types::RawItem;

static RE_BYLINE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"格隆汇(\d{1,2}月\d{1,2}日)").expect("byline date regex"));
static RE_SHORT_STAMP: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d{1,2}-\d{1,2}\s+\d{1,2}:\d{1,2}").expect("short stamp regex"));

pub static PROFILE: SourceProfile = SourceProfile {
    id: "gelonghui",
    base_url: "https://www.gelonghui.com/",
    entry_url,
    strategies: &[Strategy {
        name: "news_links",
        target: Target::Css(r#"a[href*="/news/"]"#),
        read: read_news_link,
    }],
    advance: Advance::Scroll,
    max_rounds: 10,
    min_title_chars: 10,
    deny_list: &[],
    seen_prefix_chars: 30,
    payload: None,
};

fn entry_url(keyword: &str) -> String {
    search_url("https://www.gelonghui.com/search?keyword=", keyword, "&type=news")
}

fn card_time(text: &str) -> Option<String> {
    if let Some(c) = RE_BYLINE_DATE.captures(text) {
        return c.get(1).map(|m| m.as_str().to_string());
    }
    RE_SHORT_STAMP.find(text).map(|m| m.as_str().to_string())
}

fn read_news_link(node: &Node<'_>, ctx: &ScanContext<'_>) -> Option<RawItem> {
    let text = node.text();
    let len = text.chars().count();
    if len <= 20 || len >= 500 {
        return None;
    }
    let lines = node.lines();
    let title = ctx.accept_title(&truncate_chars(lines.first()?, 150))?;
    let url = node.attr("href").map(|h| ctx.absolute(h)).unwrap_or_default();
    let summary = lines.get(1).map(|s| truncate_chars(s, 200)).unwrap_or_default();

    Some(
        RawItem::new(ctx.source_id(), title)
            .with_time_text(card_time(&text).unwrap_or_default())
            .with_url(url)
            .with_summary(summary),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::providers::fixture::scan;
    use crate::ingest::types::RawTime;

    const PAGE: &str = r#"<html><body>
      <a href="/news/101"><h2>小米集团回购1200万股，耗资约4.6亿港元</h2><p>格隆汇1月16日丨小米集团公告</p></a>
      <a href="/news/102"><h2>小米汽车1月交付量突破3万辆，同比大增</h2><p>01-15 09:30 来源：格隆汇</p></a>
      <a href="/news/103"><h2>港股收评：恒指涨1.2%，科技股走强</h2><p>无日期的摘要，稍长一些的内容</p></a>
      <a href="/news/104">更多</a>
    </body></html>"#;

    #[test]
    fn reads_byline_and_short_stamps() {
        let items = scan(&PROFILE, "小米集团", PAGE);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].title, "小米集团回购1200万股，耗资约4.6亿港元");
        assert_eq!(items[0].time, Some(RawTime::Text("1月16日".into())));
        assert_eq!(items[0].url.as_deref(), Some("https://www.gelonghui.com/news/101"));
        assert_eq!(items[1].time, Some(RawTime::Text("01-15 09:30".into())));
        assert_eq!(items[2].time, None);
    }
}
