use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use super::core::{parse_kind, Database};
use crate::common::{Comment, ItemKind};
use crate::db::Row;
use crate::TARGET_DB;

impl Database {
    /// Flat comments only; there is no reply threading.
    #[instrument(target = "db", level = "info", skip(self, content))]
    pub async fn add_comment(
        &self,
        item_type: ItemKind,
        item_id: &str,
        username: &str,
        content: &str,
        created_at: DateTime<Utc>,
    ) -> Result<i64, sqlx::Error> {
        let (id,) = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO comments (item_type, item_id, username, content, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            RETURNING id
            "#,
        )
        .bind(item_type.as_str())
        .bind(item_id)
        .bind(username)
        .bind(content)
        .bind(created_at)
        .fetch_one(self.pool())
        .await?;

        debug!(target: TARGET_DB, "Comment {} added on {} {}", id, item_type, item_id);
        Ok(id)
    }

    /// Comments on one item, oldest first.
    pub async fn comments_for(
        &self,
        item_type: ItemKind,
        item_id: &str,
    ) -> Result<Vec<Comment>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, item_type, item_id, username, content, created_at
            FROM comments
            WHERE item_type = ?1 AND item_id = ?2
            ORDER BY created_at ASC
            "#,
        )
        .bind(item_type.as_str())
        .bind(item_id)
        .fetch_all(self.pool())
        .await?;

        rows.iter()
            .map(|row| {
                let item_type: String = row.get("item_type");
                Ok(Comment {
                    id: row.get("id"),
                    item_type: parse_kind(&item_type)?,
                    item_id: row.get("item_id"),
                    username: row.get("username"),
                    content: row.get("content"),
                    created_at: row.get("created_at"),
                })
            })
            .collect()
    }
}
