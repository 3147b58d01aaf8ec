// tests/time_normalize.rs
use chrono::NaiveDateTime;
use finnews_aggregator::ingest::time::{normalize_time, parse_time_text, PublishTime, CANONICAL_FORMAT};
use finnews_aggregator::ingest::types::RawTime;

fn at(s: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(s, CANONICAL_FORMAT).expect("test timestamp")
}

fn parsed(text: &str, now: &str) -> String {
    parse_time_text(text, at(now)).to_string()
}

#[test]
fn canonical_strings_are_fixed_points() {
    let now = at("2026-01-16 20:00:00");
    for s in ["2026-01-16 17:40:02", "2025-12-31 23:59:59", "2000-01-01 00:00:00"] {
        let once = parse_time_text(s, now);
        assert_eq!(once.to_string(), s);
        assert_eq!(parse_time_text(&once.to_string(), now), once);
    }
}

#[test]
fn yearless_dates_roll_back_when_month_is_ahead() {
    // late-December items seen in early January belong to last year
    assert_eq!(parsed("12-30 09:00", "2026-01-10 08:00:00"), "2025-12-30 09:00:00");
    assert_eq!(parsed("01-05 08:15", "2026-01-10 08:00:00"), "2026-01-05 08:15:00");
    assert_eq!(parsed("12月28日", "2026-01-10 08:00:00"), "2025-12-28 00:00:00");
    assert_eq!(parsed("1月9日", "2026-01-10 08:00:00"), "2026-01-09 00:00:00");
}

#[test]
fn absolute_forms() {
    let now = "2026-01-16 20:00:00";
    assert_eq!(parsed("2026-01-16T18:58:31.000+08:00", now), "2026-01-16 18:58:31");
    assert_eq!(parsed("2026-01-16T10:58:31Z", now), "2026-01-16 10:58:31");
    assert_eq!(parsed("2026/1/5 9:05", now), "2026-01-05 09:05:00");
    assert_eq!(parsed("2026年1月15日", now), "2026-01-15 00:00:00");
    assert_eq!(parsed("2026-01-12", now), "2026-01-12 00:00:00");
}

#[test]
fn relative_forms_use_supplied_now() {
    let now = "2026-01-16 20:00:00";
    assert_eq!(parsed("15分钟前", now), "2026-01-16 19:45:00");
    assert_eq!(parsed("2 hours ago", now), "2026-01-16 18:00:00");
    assert_eq!(parsed("3天前", now), "2026-01-13 20:00:00");
    assert_eq!(parsed("昨天", now), "2026-01-15 20:00:00");
    assert_eq!(parsed("刚刚", now), "2026-01-16 20:00:00");
}

#[test]
fn time_is_found_inside_surrounding_text() {
    let now = "2026-01-16 20:00:00";
    assert_eq!(parsed("来源：财联社 2026-01-16 17:40 星期五", now), "2026-01-16 17:40:00");
    assert_eq!(parsed("富途资讯 · 3小时前", now), "2026-01-16 17:00:00");
}

#[test]
fn structured_inputs() {
    let now = at("2026-01-16 20:00:00");
    let with_nanos = at("2026-01-16 17:40:02") + chrono::Duration::milliseconds(750);
    assert_eq!(
        normalize_time(Some(&RawTime::Instant(with_nanos)), now).to_string(),
        "2026-01-16 17:40:02"
    );
    assert!(normalize_time(Some(&RawTime::Epoch(0)), now).is_unknown());
    assert!(normalize_time(Some(&RawTime::Text("   ".into())), now).is_unknown());
}

#[test]
fn sentinel_sorts_before_every_real_time() {
    let real = PublishTime::at(at("2001-01-01 00:00:00"));
    assert!(PublishTime::unknown() < real);
    assert_eq!(serde_json::to_string(&PublishTime::unknown()).unwrap(), "\"2000-01-01 00:00:00\"");
}
