use tracing::{debug, instrument};

use super::core::Database;
use crate::TARGET_DB;

impl Database {
    #[instrument(target = "db", level = "info", skip(self, auth_token))]
    pub async fn add_user(
        &self,
        username: &str,
        email: Option<&str>,
        auth_token: Option<&str>,
        region: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let (id,) = sqlx::query_as::<_, (i64,)>(
            r#"
            INSERT INTO users (username, email, auth_token, region, deactivated)
            VALUES (?1, ?2, ?3, ?4, 0)
            RETURNING id
            "#,
        )
        .bind(username)
        .bind(email)
        .bind(auth_token)
        .bind(region)
        .fetch_one(self.pool())
        .await?;

        debug!(target: TARGET_DB, "User added: {} with id {}", username, id);
        Ok(id)
    }

    /// The user's stored region. Missing user and unset region both come
    /// back as `None`.
    pub async fn user_region(&self, username: &str) -> Result<Option<String>, sqlx::Error> {
        let region: Option<Option<String>> =
            sqlx::query_scalar("SELECT region FROM users WHERE username = ?1")
                .bind(username)
                .fetch_optional(self.pool())
                .await?;

        Ok(region.flatten())
    }

    /// Returns false when the user does not exist.
    pub async fn set_region(&self, username: &str, region: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET region = ?1 WHERE username = ?2")
            .bind(region)
            .bind(username)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn search_usernames(&self, fragment: &str) -> Result<Vec<String>, sqlx::Error> {
        let pattern = format!("%{}%", fragment);
        sqlx::query_scalar("SELECT username FROM users WHERE username LIKE ?1 ORDER BY username")
            .bind(&pattern)
            .fetch_all(self.pool())
            .await
    }

    /// Resolves an auth token to a username. Deactivated accounts resolve
    /// as if the token did not exist.
    pub async fn username_for_token(&self, token: &str) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar("SELECT username FROM users WHERE auth_token = ?1 AND deactivated = 0")
            .bind(token)
            .fetch_optional(self.pool())
            .await
    }

    pub async fn set_deactivated(
        &self,
        username: &str,
        deactivated: bool,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE users SET deactivated = ?1 WHERE username = ?2")
            .bind(deactivated)
            .bind(username)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
