// src/ingest/providers/futu_report.rs
//! 富途 research-report search. The panel renders plain links; the backing
//! search API returns JSON with organisation and rating fields, read when the
//! driver hands over a payload instead of markup.

use serde_json::Value;

use super::search_url;
use crate::ingest::page::Advance;
use crate::ingest::strategy::{truncate_chars, Node, ScanContext, SourceProfile, Strategy, Target};
use crate::ingest::types::{RawItem, RawTime};

const REPORT_PATHS: [&str; 4] = ["/report/", "/research/", "/post/", "/notice/"];
const PAYLOAD_LISTS: [&str; 4] = ["report", "research", "list", "items"];

pub static PROFILE: SourceProfile = SourceProfile {
    id: "futu_report",
    base_url: "https://news.futunn.com/",
    entry_url,
    strategies: &[Strategy {
        name: "report_links",
        target: Target::Css("a[href]"),
        read: read_report_link,
    }],
    advance: Advance::Scroll,
    max_rounds: 100,
    min_title_chars: 10,
    deny_list: &[],
    seen_prefix_chars: 30,
    payload: Some(read_payload),
};

fn entry_url(keyword: &str) -> String {
    search_url("https://news.futunn.com/search?keyword=", keyword, "&tab=news&sub=report")
}

fn read_report_link(node: &Node<'_>, ctx: &ScanContext<'_>) -> Option<RawItem> {
    let href = node.attr("href")?;
    if !REPORT_PATHS.iter().any(|p| href.contains(p)) {
        return None;
    }
    let text = node.text();
    if !text.contains(ctx.keyword) {
        return None;
    }
    let first = node.lines().into_iter().next()?;
    let title = ctx.accept_title(&truncate_chars(&first, 200))?;
    // the panel shows no publish time; leave it unknown
    Some(RawItem::new(ctx.source_id(), title).with_url(ctx.absolute(href)))
}

fn str_field<'v>(item: &'v Value, keys: &[&str]) -> Option<&'v str> {
    keys.iter()
        .filter_map(|k| item.get(*k).and_then(Value::as_str))
        .find(|s| !s.trim().is_empty())
}

fn payload_time(item: &Value) -> Option<RawTime> {
    let v = item.get("time").or_else(|| item.get("publishTime"))?;
    match v {
        Value::Number(n) => n.as_i64().filter(|s| *s > 1_000_000_000).map(RawTime::Epoch),
        Value::String(s) if !s.trim().is_empty() => Some(RawTime::Text(s.clone())),
        _ => None,
    }
}

fn read_payload(value: &Value, ctx: &ScanContext<'_>) -> Vec<RawItem> {
    let Some(data) = value.get("data") else {
        return Vec::new();
    };
    let entries: Vec<&Value> = match data {
        Value::Array(list) => list.iter().collect(),
        Value::Object(_) => PAYLOAD_LISTS
            .iter()
            .filter_map(|k| data.get(*k).and_then(Value::as_array))
            .flatten()
            .collect(),
        _ => Vec::new(),
    };

    entries
        .into_iter()
        .filter_map(|entry| {
            let raw_title = str_field(entry, &["title"])?.replace("<em>", "").replace("</em>", "");
            if !raw_title.contains(ctx.keyword) {
                return None;
            }
            let title = ctx.accept_title(&raw_title)?;
            let mut item = RawItem::new(ctx.source_id(), title)
                .with_url(str_field(entry, &["url"]).unwrap_or_default());
            item.time = payload_time(entry);
            item.org = str_field(entry, &["orgName", "organization"]).map(str::to_string);
            item.rating = str_field(entry, &["rating", "ratingName"]).map(str::to_string);
            Some(item)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::providers::fixture::scan;

    #[test]
    fn only_report_links_mentioning_keyword() {
        let page = r#"<div>
          <a href="/report/1">小米集团：汽车业务放量，维持买入评级<br>中金公司</a>
          <a href="/research/2">小米集团深度：手机高端化持续推进</a>
          <a href="/post/3">腾讯控股：游戏业务稳健增长的研报</a>
          <a href="/quote/01810">小米集团行情页面的链接文字</a>
        </div>"#;
        let items = scan(&PROFILE, "小米集团", page);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "小米集团：汽车业务放量，维持买入评级");
        assert_eq!(items[0].url.as_deref(), Some("https://news.futunn.com/report/1"));
        assert!(items.iter().all(|i| i.time.is_none()));
    }

    #[test]
    fn payload_carries_org_rating_and_epoch() {
        let payload = r#"{"data":{"report":[
            {"title":"<em>小米集团</em>：四季度业绩前瞻与估值","url":"https://news.futunn.com/report/9",
             "publishTime":1768561111,"orgName":"中金公司","rating":"买入"},
            {"title":"无关公司的研报标题内容","url":"https://news.futunn.com/report/10","time":1768561111}
        ],"list":[{"title":"小米集团：汽车交付节奏跟踪报告","time":"2026-01-15 09:30"}]}}"#;
        let items = scan(&PROFILE, "小米集团", payload);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "小米集团：四季度业绩前瞻与估值");
        assert_eq!(items[0].time, Some(RawTime::Epoch(1_768_561_111)));
        assert_eq!(items[0].org.as_deref(), Some("中金公司"));
        assert_eq!(items[0].rating.as_deref(), Some("买入"));
        assert_eq!(items[1].time, Some(RawTime::Text("2026-01-15 09:30".into())));
        assert_eq!(items[1].url, None);
    }
}
