// src/rank.rs
use std::cmp::Reverse;

use crate::schema::CanonicalNewsItem;

/// Newest first; items with an unknown time go last in discovery order.
/// The sort is stable, so equal timestamps keep merge order. Never pads.
pub fn rank_and_truncate(mut items: Vec<CanonicalNewsItem>, limit: usize) -> Vec<CanonicalNewsItem> {
    items.sort_by_key(|it| (it.publish_time.is_unknown(), Reverse(it.publish_time)));
    items.truncate(limit);
    items
}
