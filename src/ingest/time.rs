// src/ingest/time.rs
//! Time normalization: reconcile the date/time shapes the sources emit into one
//! comparable wall-clock instant.
//!
//! Sources report times in China Standard Time without an explicit zone, so the
//! canonical value is a naive wall-clock instant in that zone. Anything that
//! cannot be read becomes the unknown-sentinel (`2000-01-01 00:00:00`), which
//! the ranker sorts after every real timestamp.
//!
//! Resolution order (first match inside the text wins):
//! 1. ISO-8601 with `T` separator: fraction and offset dropped, wall clock kept.
//! 2. `YYYY-MM-DD HH:MM[:SS]` (also `/` separated).
//! 3. `YYYY年M月D日` at midnight.
//! 4. Relative: `N分钟前`, `N小时前`, `N天前`, `昨天`, `前天`, `刚刚` and the
//!    English equivalents, resolved against `now`.
//! 5. Yearless `MM-DD HH:MM` and `M月D日`: current year, minus one when the
//!    month is later than the current month.
//! 6. Bare `YYYY-MM-DD` at midnight.

use std::fmt;
use std::ops::Range;

use chrono::{DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, Timelike, Utc};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Serialize, Serializer};

use crate::ingest::types::RawTime;

/// Offset of the sources' wall clock (UTC+8).
pub const SOURCE_UTC_OFFSET_SECS: i32 = 8 * 3600;

/// Canonical text form, also what `PublishTime` serializes to.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

static RE_ISO: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})-(\d{2})-(\d{2})T(\d{2}):(\d{2}):(\d{2})(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?")
        .expect("iso regex")
});
static RE_DATETIME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{4})[-/](\d{1,2})[-/](\d{1,2})\s+(\d{1,2}):(\d{2})(?::(\d{2}))?")
        .expect("datetime regex")
});
static RE_CN_YMD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})年(\d{1,2})月(\d{1,2})日").expect("cn ymd regex"));
static RE_REL_MIN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:分钟前|(?:minutes?|mins?)\s+ago)").expect("rel min regex")
});
static RE_REL_HOUR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+)\s*(?:小时前|(?:hours?|hrs?)\s+ago)").expect("rel hour regex")
});
static RE_REL_DAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(\d+)\s*(?:天前|days?\s+ago)").expect("rel day regex"));
static RE_DAY_BEFORE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)前天|day before yesterday").expect("day before regex"));
static RE_YESTERDAY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)昨天|yesterday").expect("yesterday regex"));
static RE_JUST_NOW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)刚刚|just now").expect("just now regex"));
static RE_MD_HM: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{1,2})-(\d{1,2})\s+(\d{1,2}):(\d{2})").expect("md hm regex")
});
static RE_CN_MD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2})月(\d{1,2})日").expect("cn md regex"));
static RE_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{4})-(\d{1,2})-(\d{1,2})").expect("date regex"));

/// A canonical publish instant, or the unknown-sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublishTime(NaiveDateTime);

impl PublishTime {
    /// The unknown-sentinel.
    pub fn unknown() -> Self {
        PublishTime(sentinel())
    }

    /// Wrap an instant, truncated to whole seconds.
    pub fn at(dt: NaiveDateTime) -> Self {
        PublishTime(dt.with_nanosecond(0).unwrap_or(dt))
    }

    pub fn is_unknown(&self) -> bool {
        self.0 == sentinel()
    }

    pub fn instant(&self) -> NaiveDateTime {
        self.0
    }

    /// Canonical string, or `None` for the sentinel.
    pub fn known_text(&self) -> Option<String> {
        (!self.is_unknown()).then(|| self.to_string())
    }
}

impl fmt::Display for PublishTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl Serialize for PublishTime {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(self)
    }
}

fn sentinel() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2000, 1, 1)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MIN)
}

fn source_offset() -> FixedOffset {
    FixedOffset::east_opt(SOURCE_UTC_OFFSET_SECS).expect("source offset in range")
}

/// Current wall clock in the sources' timezone, whole seconds.
pub fn source_now() -> NaiveDateTime {
    let now = Utc::now().with_timezone(&source_offset()).naive_local();
    now.with_nanosecond(0).unwrap_or(now)
}

/// Normalize a raw time representation against `now`.
pub fn normalize_time(raw: Option<&RawTime>, now: NaiveDateTime) -> PublishTime {
    match raw {
        None => PublishTime::unknown(),
        Some(RawTime::Instant(dt)) => PublishTime::at(*dt),
        Some(RawTime::Epoch(secs)) => from_epoch(*secs),
        Some(RawTime::Text(text)) => parse_time_text(text, now),
    }
}

/// Parse source text such as `3小时前`, `01-16 17:40` or
/// `2026-01-16T18:58:31.000+08:00`.
pub fn parse_time_text(text: &str, now: NaiveDateTime) -> PublishTime {
    scan(text, now)
        .map(|(dt, _)| PublishTime::at(dt))
        .unwrap_or_else(PublishTime::unknown)
}

/// Locate the first recognizable time expression inside `text`.
pub fn find_time_text(text: &str) -> Option<&str> {
    scan(text, source_now()).map(|(_, range)| &text[range])
}

fn from_epoch(raw: i64) -> PublishTime {
    // Millisecond timestamps show up in some JSON payloads.
    let secs = if raw > 100_000_000_000 { raw / 1000 } else { raw };
    if secs <= 0 {
        return PublishTime::unknown();
    }
    DateTime::from_timestamp(secs, 0)
        .map(|dt| PublishTime::at(dt.with_timezone(&source_offset()).naive_local()))
        .unwrap_or_else(PublishTime::unknown)
}

fn num<T: std::str::FromStr>(caps: &Captures<'_>, idx: usize) -> Option<T> {
    caps.get(idx)?.as_str().parse().ok()
}

fn ymd_hms(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> Option<NaiveDateTime> {
    NaiveDate::from_ymd_opt(y, mo, d)?.and_hms_opt(h, mi, s)
}

/// Yearless dates refer to the most recent matching month.
fn rollback_year(month: u32, now: NaiveDateTime) -> i32 {
    if month > now.month() {
        now.year() - 1
    } else {
        now.year()
    }
}

fn relative(caps: &Captures<'_>, now: NaiveDateTime, unit: fn(i64) -> Duration) -> Option<NaiveDateTime> {
    let n: u32 = num(caps, 1)?;
    now.checked_sub_signed(unit(i64::from(n)))
}

fn scan(text: &str, now: NaiveDateTime) -> Option<(NaiveDateTime, Range<usize>)> {
    let span = |caps: &Captures<'_>| caps.get(0).map(|m| m.range()).unwrap_or(0..0);

    if let Some(c) = RE_ISO.captures(text) {
        let dt = ymd_hms(num(&c, 1)?, num(&c, 2)?, num(&c, 3)?, num(&c, 4)?, num(&c, 5)?, num(&c, 6)?);
        return dt.map(|dt| (dt, span(&c)));
    }
    if let Some(c) = RE_DATETIME.captures(text) {
        let secs = num(&c, 6).unwrap_or(0);
        let dt = ymd_hms(num(&c, 1)?, num(&c, 2)?, num(&c, 3)?, num(&c, 4)?, num(&c, 5)?, secs);
        return dt.map(|dt| (dt, span(&c)));
    }
    if let Some(c) = RE_CN_YMD.captures(text) {
        let dt = ymd_hms(num(&c, 1)?, num(&c, 2)?, num(&c, 3)?, 0, 0, 0);
        return dt.map(|dt| (dt, span(&c)));
    }
    if let Some(c) = RE_REL_MIN.captures(text) {
        return relative(&c, now, Duration::minutes).map(|dt| (dt, span(&c)));
    }
    if let Some(c) = RE_REL_HOUR.captures(text) {
        return relative(&c, now, Duration::hours).map(|dt| (dt, span(&c)));
    }
    if let Some(c) = RE_REL_DAY.captures(text) {
        return relative(&c, now, Duration::days).map(|dt| (dt, span(&c)));
    }
    if let Some(m) = RE_DAY_BEFORE.find(text) {
        return now.checked_sub_signed(Duration::days(2)).map(|dt| (dt, m.range()));
    }
    if let Some(m) = RE_YESTERDAY.find(text) {
        return now.checked_sub_signed(Duration::days(1)).map(|dt| (dt, m.range()));
    }
    if let Some(m) = RE_JUST_NOW.find(text) {
        return Some((now, m.range()));
    }
    if let Some(c) = RE_MD_HM.captures(text) {
        let month: u32 = num(&c, 1)?;
        let dt = ymd_hms(rollback_year(month, now), month, num(&c, 2)?, num(&c, 3)?, num(&c, 4)?, 0);
        return dt.map(|dt| (dt, span(&c)));
    }
    if let Some(c) = RE_CN_MD.captures(text) {
        let month: u32 = num(&c, 1)?;
        let dt = ymd_hms(rollback_year(month, now), month, num(&c, 2)?, 0, 0, 0);
        return dt.map(|dt| (dt, span(&c)));
    }
    if let Some(c) = RE_DATE.captures(text) {
        let dt = ymd_hms(num(&c, 1)?, num(&c, 2)?, num(&c, 3)?, 0, 0, 0);
        return dt.map(|dt| (dt, span(&c)));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, CANONICAL_FORMAT).unwrap()
    }

    #[test]
    fn relative_hours_resolve_against_now() {
        let now = at("2026-01-16 20:00:00");
        assert_eq!(parse_time_text("3小时前", now).to_string(), "2026-01-16 17:00:00");
        assert_eq!(parse_time_text("45 minutes ago", now).to_string(), "2026-01-16 19:15:00");
        assert_eq!(parse_time_text("前天", now).to_string(), "2026-01-14 20:00:00");
    }

    #[test]
    fn iso_offset_is_dropped() {
        let now = at("2026-01-16 20:00:00");
        let t = parse_time_text("2026-01-16T18:58:31.000+08:00", now);
        assert_eq!(t.to_string(), "2026-01-16 18:58:31");
    }

    #[test]
    fn garbage_is_unknown() {
        let now = at("2026-01-16 20:00:00");
        assert!(parse_time_text("sometime soon", now).is_unknown());
        assert!(parse_time_text("02-30 10:00", now).is_unknown());
        assert!(normalize_time(None, now).is_unknown());
    }

    #[test]
    fn epoch_is_read_in_source_zone() {
        // 2026-01-16 10:58:31 UTC
        let t = normalize_time(Some(&RawTime::Epoch(1_768_561_111)), source_now());
        assert_eq!(t.to_string(), "2026-01-16 18:58:31");
        let ms = normalize_time(Some(&RawTime::Epoch(1_768_561_111_000)), source_now());
        assert_eq!(ms, t);
    }

    #[test]
    fn find_time_text_returns_matched_span() {
        assert_eq!(find_time_text("格隆汇1月16日丨小米集团回购"), Some("1月16日"));
        assert_eq!(find_time_text("no time here"), None);
    }
}
