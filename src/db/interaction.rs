use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::{debug, instrument};

use super::core::Database;
use crate::common::{category_tokens, ItemKind};
use crate::db::Row;
use crate::TARGET_DB;

impl Database {
    /// Appends one interaction record. The log is append-only; reads go
    /// through the windowed aggregates below.
    #[instrument(target = "db", level = "info", skip(self))]
    pub async fn record_interaction(
        &self,
        username: &str,
        item_type: ItemKind,
        item_id: &str,
        interaction_type: &str,
        region: Option<&str>,
        created_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO interactions (username, item_type, item_id, interaction_type, region, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(username)
        .bind(item_type.as_str())
        .bind(item_id)
        .bind(interaction_type)
        .bind(region)
        .bind(created_at)
        .execute(self.pool())
        .await?;

        debug!(target: TARGET_DB, "Interaction recorded: {} on {} {}", interaction_type, item_type, item_id);
        Ok(())
    }

    /// Per-item interaction counts across all users since the cutoff.
    pub(crate) async fn recent_popularity(
        &self,
        since: DateTime<Utc>,
    ) -> Result<HashMap<(ItemKind, String), i64>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT item_type, item_id, COUNT(*) AS interaction_count
            FROM interactions
            WHERE created_at >= ?1
            GROUP BY item_type, item_id
            "#,
        )
        .bind(since)
        .fetch_all(self.pool())
        .await?;

        let mut counts = HashMap::new();
        for row in &rows {
            let item_type: String = row.get("item_type");
            // Tags this crate never wrote cannot match any content anyway.
            if let Some(kind) = ItemKind::parse(&item_type) {
                let item_id: String = row.get("item_id");
                let count: i64 = row.get("interaction_count");
                counts.insert((kind, item_id), count);
            }
        }
        Ok(counts)
    }

    /// One user's interaction counts since the cutoff, grouped by category
    /// token of the posts they interacted with. Distinct interactions are
    /// counted once per category string, then credited to every token in it.
    pub(crate) async fn category_affinity(
        &self,
        username: &str,
        since: DateTime<Utc>,
    ) -> Result<HashMap<String, i64>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT p.categories AS categories, COUNT(DISTINCT i.id) AS interaction_count
            FROM interactions i
            JOIN posts p ON i.item_type = p.source AND i.item_id = p.permalink
            WHERE i.username = ?1 AND i.created_at >= ?2
            GROUP BY p.categories
            "#,
        )
        .bind(username)
        .bind(since)
        .fetch_all(self.pool())
        .await?;

        let mut affinity: HashMap<String, i64> = HashMap::new();
        for row in &rows {
            let categories: String = row.get("categories");
            let count: i64 = row.get("interaction_count");
            for token in category_tokens(&categories) {
                *affinity.entry(token.to_ascii_lowercase()).or_insert(0) += count;
            }
        }
        Ok(affinity)
    }
}
