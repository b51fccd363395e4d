use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use tracing::{debug, instrument};

use super::core::Database;
use crate::common::Article;
use crate::db::Row;
use crate::TARGET_DB;

pub(crate) fn article_from_row(row: &SqliteRow) -> Article {
    Article {
        id: row.get("id"),
        link: row.get("link"),
        headline: row.get("headline"),
        category: row.get("category"),
        short_description: row.get("short_description"),
        authors: row.get("authors"),
        published_at: row.get("published_at"),
        cluster_id: row.get("cluster_id"),
        image_url: row.get("image_url"),
        explanation: row.get("explanation"),
        region: row.get("region"),
    }
}

impl Database {
    #[instrument(target = "db", level = "info", skip(self, short_description, authors))]
    #[allow(clippy::too_many_arguments)]
    pub async fn add_article(
        &self,
        link: &str,
        headline: &str,
        category: &str,
        short_description: Option<&str>,
        authors: Option<&str>,
        published_at: DateTime<Utc>,
        cluster_id: Option<i64>,
        image_url: Option<&str>,
        region: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let (id,) = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO articles (link, headline, category, short_description, authors, published_at, cluster_id, image_url, region)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            RETURNING id
            "#,
        )
        .bind(link)
        .bind(headline)
        .bind(category)
        .bind(short_description)
        .bind(authors)
        .bind(published_at)
        .bind(cluster_id)
        .bind(image_url)
        .bind(region)
        .fetch_one(self.pool())
        .await?;

        debug!(target: TARGET_DB, "Article added: {} with id {}", link, id);
        Ok(id)
    }

    pub async fn get_article_by_id(&self, article_id: i64) -> Result<Option<Article>, sqlx::Error> {
        let row = sqlx::query("SELECT * FROM articles WHERE id = ?1")
            .bind(article_id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.as_ref().map(article_from_row))
    }

    pub(crate) async fn get_articles_by_ids(
        &self,
        article_ids: &[i64],
    ) -> Result<Vec<Article>, sqlx::Error> {
        if article_ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = article_ids
            .iter()
            .map(|_| "?")
            .collect::<Vec<_>>()
            .join(",");
        let query = format!("SELECT * FROM articles WHERE id IN ({})", placeholders);

        let mut query_builder = sqlx::query(&query);
        for article_id in article_ids {
            query_builder = query_builder.bind(article_id);
        }

        let rows = query_builder.fetch_all(self.pool()).await?;
        Ok(rows.iter().map(article_from_row).collect())
    }

    /// Articles in the same cluster as the given one, newest first. Returns
    /// `None` when the article itself does not exist. Cluster ids of zero
    /// or below never cluster and yield an empty set.
    #[instrument(target = "db", level = "info", skip(self))]
    pub async fn related_articles(
        &self,
        article_id: i64,
    ) -> Result<Option<Vec<Article>>, sqlx::Error> {
        let cluster_id: Option<Option<i64>> =
            sqlx::query_scalar("SELECT cluster_id FROM articles WHERE id = ?1")
                .bind(article_id)
                .fetch_optional(self.pool())
                .await?;

        let cluster_id = match cluster_id {
            None => return Ok(None),
            Some(None) => return Ok(Some(Vec::new())),
            Some(Some(cluster_id)) if cluster_id <= 0 => return Ok(Some(Vec::new())),
            Some(Some(cluster_id)) => cluster_id,
        };

        let rows = sqlx::query(
            r#"
            SELECT * FROM articles
            WHERE cluster_id = ?1 AND id != ?2
            ORDER BY published_at DESC
            "#,
        )
        .bind(cluster_id)
        .bind(article_id)
        .fetch_all(self.pool())
        .await?;

        Ok(Some(rows.iter().map(article_from_row).collect()))
    }

    pub(crate) async fn fetch_articles(
        &self,
        region: Option<&str>,
    ) -> Result<Vec<Article>, sqlx::Error> {
        let rows = match region {
            Some(region) => {
                sqlx::query("SELECT * FROM articles WHERE region = ?1 ORDER BY published_at DESC")
                    .bind(region)
                    .fetch_all(self.pool())
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM articles ORDER BY published_at DESC")
                    .fetch_all(self.pool())
                    .await?
            }
        };

        Ok(rows.iter().map(article_from_row).collect())
    }

    pub(crate) async fn search_articles(&self, needle: &str) -> Result<Vec<Article>, sqlx::Error> {
        let pattern = format!("%{}%", needle);
        let rows = sqlx::query(
            r#"
            SELECT * FROM articles
            WHERE headline LIKE ?1
               OR short_description LIKE ?1
               OR authors LIKE ?1
               OR category LIKE ?1
            ORDER BY published_at DESC
            "#,
        )
        .bind(&pattern)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.iter().map(article_from_row).collect())
    }

    /// Stores a generated explanation. Returns false when the article is gone.
    pub async fn set_article_explanation(
        &self,
        article_id: i64,
        explanation: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE articles SET explanation = ?1 WHERE id = ?2")
            .bind(explanation)
            .bind(article_id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
