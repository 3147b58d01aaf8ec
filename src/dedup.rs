// src/dedup.rs
//! Title-prefix deduplication.
//!
//! Two items are the same story when the first `prefix_chars` characters of
//! their trimmed, lower-cased titles match. This is a heuristic: distinct
//! stories sharing a long boilerplate lead (e.g. "【快讯】小米集团公告称...")
//! collapse into one, and rewrites that differ in the first few characters
//! survive as separate items.

use std::collections::HashSet;

use crate::schema::CanonicalNewsItem;

pub const DEFAULT_PREFIX_CHARS: usize = 30;

pub fn fingerprint(title: &str, prefix_chars: usize) -> String {
    title.trim().to_lowercase().chars().take(prefix_chars).collect()
}

/// Keep the first occurrence of each fingerprint, in input order.
/// Returns the survivors and the number of dropped items.
pub fn dedup_items(items: Vec<CanonicalNewsItem>, prefix_chars: usize) -> (Vec<CanonicalNewsItem>, usize) {
    let mut seen = HashSet::with_capacity(items.len());
    let before = items.len();
    let kept: Vec<CanonicalNewsItem> = items
        .into_iter()
        .filter(|it| seen.insert(fingerprint(&it.title, prefix_chars)))
        .collect();
    let dropped = before - kept.len();
    (kept, dropped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fingerprint_ignores_case_and_outer_whitespace() {
        assert_eq!(fingerprint("  Xiaomi BUYBACK ", 30), "xiaomi buyback");
        assert_eq!(fingerprint("小米集团回购股份", 4), "小米集团");
    }
}
