use chrono::{DateTime, Utc};
use std::collections::HashSet;
use tracing::{debug, instrument};

use super::core::{parse_kind, Database};
use crate::common::ItemKind;
use crate::db::Row;
use crate::TARGET_DB;

/// One row of the repost log, before the original content is joined back in.
#[derive(Clone, Debug)]
pub struct RepostRow {
    pub username: String,
    pub item_type: ItemKind,
    pub item_id: String,
    pub reposted_at: DateTime<Utc>,
}

impl Database {
    #[instrument(target = "db", level = "info", skip(self))]
    pub async fn add_repost(
        &self,
        username: &str,
        item_type: ItemKind,
        item_id: &str,
        reposted_at: DateTime<Utc>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO reposts (username, item_type, item_id, reposted_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(username)
        .bind(item_type.as_str())
        .bind(item_id)
        .bind(reposted_at)
        .execute(self.pool())
        .await?;

        debug!(target: TARGET_DB, "Repost recorded: {} {} by {}", item_type, item_id, username);
        Ok(())
    }

    /// Repost log rows for a set of users, newest first.
    pub(crate) async fn repost_rows_for_users(
        &self,
        usernames: &[String],
    ) -> Result<Vec<RepostRow>, sqlx::Error> {
        if usernames.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = usernames.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!(
            r#"
            SELECT username, item_type, item_id, reposted_at
            FROM reposts
            WHERE username IN ({})
            ORDER BY reposted_at DESC
            "#,
            placeholders
        );

        let mut query_builder = sqlx::query(&query);
        for username in usernames {
            query_builder = query_builder.bind(username);
        }

        let rows = query_builder.fetch_all(self.pool()).await?;
        rows.iter()
            .map(|row| {
                let item_type: String = row.get("item_type");
                Ok(RepostRow {
                    username: row.get("username"),
                    item_type: parse_kind(&item_type)?,
                    item_id: row.get("item_id"),
                    reposted_at: row.get("reposted_at"),
                })
            })
            .collect()
    }

    /// Permalinks of posts reposted by any of the given users, any time.
    pub(crate) async fn reposted_post_ids_by_users(
        &self,
        usernames: &[String],
    ) -> Result<HashSet<String>, sqlx::Error> {
        if usernames.is_empty() {
            return Ok(HashSet::new());
        }

        let placeholders = usernames.iter().map(|_| "?").collect::<Vec<_>>().join(",");
        let query = format!(
            "SELECT item_id FROM reposts WHERE item_type != 'article' AND username IN ({})",
            placeholders
        );

        let mut query_builder = sqlx::query_scalar::<_, String>(&query);
        for username in usernames {
            query_builder = query_builder.bind(username);
        }

        let ids = query_builder.fetch_all(self.pool()).await?;
        Ok(ids.into_iter().collect())
    }
}
