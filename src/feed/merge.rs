use super::Item;

/// Concatenate two collections and order them newest first.
///
/// No deduplication: a URL bookmarked in both feeds shows up twice. The sort
/// is unstable, so items with equal timestamps come out in no particular order.
pub fn merge_by_date(timeline: &[Item], bookmarks: &[Item]) -> Vec<Item> {
    let mut merged = Vec::with_capacity(timeline.len() + bookmarks.len());
    merged.extend_from_slice(timeline);
    merged.extend_from_slice(bookmarks);
    merged.sort_unstable_by(|a, b| b.timestamp.cmp(&a.timestamp));
    merged
}
