// src/ingest/mod.rs
pub mod page;
pub mod providers;
pub mod strategy;
pub mod subprocess;
pub mod time;
pub mod types;

use once_cell::sync::Lazy;
use regex::Regex;

static RE_TAGS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?is)</?[^>]+>").expect("tag regex"));
static RE_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));

/// Upper bound for any single normalized text field.
pub const MAX_TEXT_CHARS: usize = 1500;

/// Normalize scraped text: decode entities, strip tags, collapse whitespace, trim.
pub fn normalize_text(s: &str) -> String {
    // 1) HTML entity decode
    let decoded = html_escape::decode_html_entities(s);

    // 2) Strip HTML tags left in attribute-derived or API text
    let untagged = RE_TAGS.replace_all(&decoded, "");

    // 3) Collapse whitespace (includes U+3000 ideographic space)
    let out = RE_WS.replace_all(&untagged, " ").trim().to_string();

    // 4) Length cap
    if out.chars().count() > MAX_TEXT_CHARS {
        out.chars().take(MAX_TEXT_CHARS).collect()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_text_collapses_ws_and_entities() {
        let s = "  小米集团&nbsp;&nbsp;<em>回购</em>\n\u{3000}股份  ";
        assert_eq!(normalize_text(s), "小米集团 回购 股份");
    }

    #[test]
    fn normalize_text_caps_length() {
        let long = "字".repeat(MAX_TEXT_CHARS + 10);
        assert_eq!(normalize_text(&long).chars().count(), MAX_TEXT_CHARS);
    }
}
