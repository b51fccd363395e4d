use std::collections::HashMap;

use crate::common::{Article, ContentItem, FeedItem, ItemKind, Post, RepostEntry};
use crate::db::Database;
use crate::feed::filter::{CategoryFilter, FeedQuery, TagMatch};

/// Article source reader. Region narrows in SQL; the category clause runs
/// as a substring matcher over the free-text category field.
pub(crate) async fn read_articles(
    db: &Database,
    query: &FeedQuery,
) -> Result<Vec<FeedItem>, sqlx::Error> {
    let filter = CategoryFilter::new(&query.categories, TagMatch::Substring);
    let articles = db.fetch_articles(query.region.as_deref()).await?;

    Ok(articles
        .into_iter()
        .filter(|article| filter.matches(&article.category))
        .map(FeedItem::from_article)
        .collect())
}

/// Post source reader for the given source tags. The category clause runs
/// as exact tag membership over the comma-separated set.
pub(crate) async fn read_posts(
    db: &Database,
    query: &FeedQuery,
    sources: &[ItemKind],
) -> Result<Vec<FeedItem>, sqlx::Error> {
    if sources.is_empty() {
        return Ok(Vec::new());
    }

    let filter = CategoryFilter::new(&query.categories, TagMatch::Exact);
    let posts = db.fetch_posts(sources, query.region.as_deref()).await?;

    Ok(posts
        .into_iter()
        .filter(|post| filter.matches(&post.categories))
        .map(FeedItem::from_post)
        .collect())
}

/// Repost reader: joins the repost log back to the originals. Rows whose
/// original has since been deleted are dropped.
pub(crate) async fn read_reposts(
    db: &Database,
    usernames: &[String],
) -> Result<Vec<RepostEntry>, sqlx::Error> {
    let rows = db.repost_rows_for_users(usernames).await?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let mut article_ids: Vec<i64> = Vec::new();
    let mut post_links: Vec<String> = Vec::new();
    for row in &rows {
        match row.item_type {
            ItemKind::Article => {
                if let Ok(id) = row.item_id.parse::<i64>() {
                    article_ids.push(id);
                }
            }
            _ => post_links.push(row.item_id.clone()),
        }
    }

    let articles: HashMap<i64, Article> = db
        .get_articles_by_ids(&article_ids)
        .await?
        .into_iter()
        .map(|article| (article.id, article))
        .collect();
    let posts: HashMap<String, Post> = db
        .get_posts_by_links(&post_links)
        .await?
        .into_iter()
        .map(|post| (post.permalink.clone(), post))
        .collect();

    let entries = rows
        .into_iter()
        .filter_map(|row| {
            let original = match row.item_type {
                ItemKind::Article => row
                    .item_id
                    .parse::<i64>()
                    .ok()
                    .and_then(|id| articles.get(&id))
                    .cloned()
                    .map(ContentItem::Article),
                _ => posts.get(&row.item_id).cloned().map(ContentItem::Post),
            }?;
            Some(RepostEntry {
                reposted_by: row.username,
                reposted_at: row.reposted_at,
                content_type: original.kind(),
                original,
            })
        })
        .collect();

    Ok(entries)
}
