use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use tracing::{debug, instrument};

use super::core::{parse_kind, Database};
use crate::common::{ItemKind, Post};
use crate::db::Row;
use crate::TARGET_DB;

pub(crate) fn post_from_row(row: &SqliteRow) -> Result<Post, sqlx::Error> {
    let source: String = row.get("source");
    Ok(Post {
        permalink: row.get("permalink"),
        source: parse_kind(&source)?,
        author: row.get("author"),
        body: row.get("body"),
        created_at: row.get("created_at"),
        retweets: row.get("retweets"),
        favorites: row.get("favorites"),
        media_url: row.get("media_url"),
        explanation: row.get("explanation"),
        categories: row.get("categories"),
        region: row.get("region"),
    })
}

impl Database {
    #[instrument(target = "db", level = "info", skip(self, body, categories))]
    #[allow(clippy::too_many_arguments)]
    pub async fn add_post(
        &self,
        permalink: &str,
        source: ItemKind,
        author: &str,
        body: &str,
        created_at: DateTime<Utc>,
        retweets: i64,
        favorites: i64,
        media_url: Option<&str>,
        categories: &str,
        region: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO posts (permalink, source, author, body, created_at, retweets, favorites, media_url, categories, region)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(permalink) DO UPDATE SET
                source = excluded.source,
                author = excluded.author,
                body = excluded.body,
                created_at = excluded.created_at,
                retweets = excluded.retweets,
                favorites = excluded.favorites,
                media_url = excluded.media_url,
                categories = excluded.categories,
                region = excluded.region
            "#,
        )
        .bind(permalink)
        .bind(source.as_str())
        .bind(author)
        .bind(body)
        .bind(created_at)
        .bind(retweets)
        .bind(favorites)
        .bind(media_url)
        .bind(categories)
        .bind(region)
        .execute(self.pool())
        .await?;

        debug!(target: TARGET_DB, "Post added/updated: {}", permalink);
        Ok(())
    }

    pub async fn get_post_by_link(&self, permalink: &str) -> Result<Option<Post>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM posts WHERE permalink = ?1")
            .bind(permalink)
            .fetch_optional(self.pool())
            .await?;

        row.as_ref().map(post_from_row).transpose()
    }

    pub(crate) async fn get_posts_by_links(
        &self,
        permalinks: &[String],
    ) -> Result<Vec<Post>, sqlx::Error> {
        if permalinks.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = permalinks.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!("SELECT * FROM posts WHERE permalink IN ({})", placeholders);

        let mut query_builder = sqlx::query(&query);
        for permalink in permalinks {
            query_builder = query_builder.bind(permalink);
        }

        let rows = query_builder.fetch_all(self.pool()).await?;
        rows.iter().map(post_from_row).collect()
    }

    /// Posts from the given sources, optionally constrained to a region.
    pub(crate) async fn fetch_posts(
        &self,
        sources: &[ItemKind],
        region: Option<&str>,
    ) -> Result<Vec<Post>, sqlx::Error> {
        if sources.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = sources.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let mut query = format!("SELECT * FROM posts WHERE source IN ({})", placeholders);
        if region.is_some() {
            query.push_str(" AND region = ?");
        }
        query.push_str(" ORDER BY created_at DESC");

        let mut query_builder = sqlx::query(&query);
        for source in sources {
            query_builder = query_builder.bind(source.as_str());
        }
        if let Some(region) = region {
            query_builder = query_builder.bind(region);
        }

        let rows = query_builder.fetch_all(self.pool()).await?;
        rows.iter().map(post_from_row).collect()
    }

    pub(crate) async fn search_posts(&self, needle: &str) -> Result<Vec<Post>, sqlx::Error> {
        let pattern = format!("%{}%", needle);
        let rows = sqlx::query(
            r#"
            SELECT * FROM posts
            WHERE body LIKE ?1
               OR author LIKE ?1
               OR categories LIKE ?1
            ORDER BY created_at DESC
            "#,
        )
        .bind(&pattern)
        .fetch_all(self.pool())
        .await?;

        rows.iter().map(post_from_row).collect()
    }

    /// Creation time of the most recent tweet, scoped to a region when given.
    pub(crate) async fn latest_tweet_created_at(
        &self,
        region: Option<&str>,
    ) -> Result<Option<DateTime<Utc>>, sqlx::Error> {
        match region {
            Some(region) => {
                sqlx::query_scalar::<_, DateTime<Utc>>(
                    r#"
                    SELECT created_at FROM posts
                    WHERE source = 'tweet' AND region = ?1
                    ORDER BY created_at DESC
                    LIMIT 1
                    "#,
                )
                .bind(region)
                .fetch_optional(self.pool())
                .await
            }
            None => {
                sqlx::query_scalar::<_, DateTime<Utc>>(
                    r#"
                    SELECT created_at FROM posts
                    WHERE source = 'tweet'
                    ORDER BY created_at DESC
                    LIMIT 1
                    "#,
                )
                .fetch_optional(self.pool())
                .await
            }
        }
    }

    /// Tweets created on or after the cutoff, optionally region-scoped.
    pub(crate) async fn fetch_tweets_since(
        &self,
        cutoff: DateTime<Utc>,
        region: Option<&str>,
    ) -> Result<Vec<Post>, sqlx::Error> {
        let rows = match region {
            Some(region) => {
                sqlx::query(
                    r#"
                    SELECT * FROM posts
                    WHERE source = 'tweet' AND created_at >= ?1 AND region = ?2
                    "#,
                )
                .bind(cutoff)
                .bind(region)
                .fetch_all(self.pool())
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM posts WHERE source = 'tweet' AND created_at >= ?1")
                    .bind(cutoff)
                    .fetch_all(self.pool())
                    .await?
            }
        };

        rows.iter().map(post_from_row).collect()
    }

    /// Stores a generated explanation. Returns false when the post is gone.
    pub async fn set_post_explanation(
        &self,
        permalink: &str,
        explanation: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE posts SET explanation = ?1 WHERE permalink = ?2")
            .bind(explanation)
            .bind(permalink)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
