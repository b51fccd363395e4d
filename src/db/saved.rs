use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use super::core::{parse_kind, Database};
use crate::common::{ItemKind, SavedItem};
use crate::db::Row;
use crate::TARGET_DB;

impl Database {
    #[instrument(target = "db", level = "info", skip(self))]
    pub async fn save_item(
        &self,
        username: &str,
        item_type: ItemKind,
        item_id: &str,
        saved_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO saved_items (username, item_type, item_id, saved_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(username)
        .bind(item_type.as_str())
        .bind(item_id)
        .bind(saved_at)
        .execute(self.pool())
        .await?;

        debug!(target: TARGET_DB, "Item saved: {} {} by {}", item_type, item_id, username);
        Ok(())
    }

    /// Returns false when nothing was saved to begin with.
    pub async fn unsave_item(
        &self,
        username: &str,
        item_type: ItemKind,
        item_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM saved_items WHERE username = ?1 AND item_type = ?2 AND item_id = ?3",
        )
        .bind(username)
        .bind(item_type.as_str())
        .bind(item_id)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn is_saved(
        &self,
        username: &str,
        item_type: ItemKind,
        item_id: &str,
    ) -> Result<bool, sqlx::Error> {
        let row = sqlx::query(
            "SELECT 1 FROM saved_items WHERE username = ?1 AND item_type = ?2 AND item_id = ?3",
        )
        .bind(username)
        .bind(item_type.as_str())
        .bind(item_id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.is_some())
    }

    /// Everything the user saved, most recent first, both content kinds.
    pub async fn saved_items(&self, username: &str) -> Result<Vec<SavedItem>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT item_type, item_id, saved_at
            FROM saved_items
            WHERE username = ?1
            ORDER BY saved_at DESC
            "#,
        )
        .bind(username)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let item_type: String = row.get("item_type");
                Ok(SavedItem {
                    item_type: parse_kind(&item_type)?,
                    item_id: row.get("item_id"),
                    saved_at: row.get("saved_at"),
                })
            })
            .collect()
    }
}
