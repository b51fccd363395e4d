use crate::common::FeedItem;
use crate::feed::filter::Pagination;

/// Orders a combined row set: score descending when scores are present,
/// created_at descending as the tie break and as the whole ordering for
/// unscored feeds.
pub(crate) fn order_items(items: &mut [FeedItem]) {
    items.sort_by(|a, b| {
        b.score
            .unwrap_or(i64::MIN)
            .cmp(&a.score.unwrap_or(i64::MIN))
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

/// Limit/offset over an already-ordered combined set.
pub(crate) fn paginate<T>(items: Vec<T>, pagination: Pagination) -> Vec<T> {
    items
        .into_iter()
        .skip(pagination.offset())
        .take(pagination.limit())
        .collect()
}

/// Concatenates per-source row sets without deduplication, orders the
/// combined set, and applies pagination to the whole.
pub(crate) fn merge(sets: Vec<Vec<FeedItem>>, pagination: Pagination) -> Vec<FeedItem> {
    let mut items: Vec<FeedItem> = sets.into_iter().flatten().collect();
    order_items(&mut items);
    paginate(items, pagination)
}
