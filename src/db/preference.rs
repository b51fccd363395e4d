use tracing::{debug, instrument};

use super::core::Database;
use crate::TARGET_DB;

impl Database {
    /// Declares a preference tag. Returns false when the user already
    /// declared it.
    #[instrument(target = "db", level = "info", skip(self))]
    pub async fn add_preference(
        &self,
        username: &str,
        preference: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("INSERT INTO preferences (username, preference) VALUES (?1, ?2)")
            .bind(username)
            .bind(preference)
            .execute(self.pool())
            .await;

        match result {
            Ok(_) => {
                debug!(target: TARGET_DB, "Preference added: {} for {}", preference, username);
                Ok(true)
            }
            Err(sqlx::Error::Database(err)) if err.message().contains("UNIQUE constraint failed") => {
                Ok(false)
            }
            Err(err) => Err(err),
        }
    }

    pub async fn preferences(&self, username: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT preference FROM preferences WHERE username = ?1")
            .bind(username)
            .fetch_all(self.pool())
            .await
    }

    /// Clears all of the user's preferences, returning how many were removed.
    pub async fn delete_preferences(&self, username: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM preferences WHERE username = ?1")
            .bind(username)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected())
    }
}
