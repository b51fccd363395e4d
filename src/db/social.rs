use tracing::{debug, instrument};

use super::core::Database;
use crate::TARGET_DB;

/// Result of a follow request against the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FollowOutcome {
    Requested,
    AlreadyRequested,
    UnknownUser,
}

impl Database {
    /// Records a pending follow request. The target must exist; a duplicate
    /// request (pending or accepted) is rejected.
    #[instrument(target = "db", level = "info", skip(self))]
    pub async fn request_follow(
        &self,
        follower: &str,
        followed: &str,
    ) -> Result<FollowOutcome, sqlx::Error> {
        let target = sqlx::query("SELECT 1 FROM users WHERE username = ?1")
            .bind(followed)
            .fetch_optional(self.pool())
            .await?;
        if target.is_none() {
            return Ok(FollowOutcome::UnknownUser);
        }

        let result = sqlx::query(
            r#"
            INSERT INTO follows (follower_username, followed_username, accepted)
            VALUES (?1, ?2, 0)
            "#,
        )
        .bind(follower)
        .bind(followed)
        .execute(self.pool())
        .await;

        match result {
            Ok(_) => {
                debug!(target: TARGET_DB, "Follow requested: {} -> {}", follower, followed);
                Ok(FollowOutcome::Requested)
            }
            Err(sqlx::Error::Database(err)) if err.message().contains("UNIQUE constraint failed") => {
                Ok(FollowOutcome::AlreadyRequested)
            }
            Err(err) => Err(err),
        }
    }

    /// Marks a pending request accepted. Returns false when no pending
    /// request exists (missing or already accepted).
    pub async fn accept_follow_request(
        &self,
        follower: &str,
        followed: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE follows SET accepted = 1
            WHERE follower_username = ?1 AND followed_username = ?2 AND accepted = 0
            "#,
        )
        .bind(follower)
        .bind(followed)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// The followed user turns down a pending request.
    pub async fn reject_follow_request(
        &self,
        follower: &str,
        followed: &str,
    ) -> Result<bool, sqlx::Error> {
        self.remove_pending_follow(follower, followed).await
    }

    /// The follower withdraws their own pending request.
    pub async fn cancel_follow_request(
        &self,
        follower: &str,
        followed: &str,
    ) -> Result<bool, sqlx::Error> {
        self.remove_pending_follow(follower, followed).await
    }

    async fn remove_pending_follow(
        &self,
        follower: &str,
        followed: &str,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM follows
            WHERE follower_username = ?1 AND followed_username = ?2 AND accepted = 0
            "#,
        )
        .bind(follower)
        .bind(followed)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Removes the edge whether pending or accepted.
    pub async fn unfollow(&self, follower: &str, followed: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "DELETE FROM follows WHERE follower_username = ?1 AND followed_username = ?2",
        )
        .bind(follower)
        .bind(followed)
        .execute(self.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Usernames this user follows; accepted edges only.
    pub async fn followed_usernames(&self, follower: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT followed_username FROM follows WHERE follower_username = ?1 AND accepted = 1",
        )
        .bind(follower)
        .fetch_all(self.pool())
        .await
    }

    /// Usernames following this user; accepted edges only.
    pub async fn follower_usernames(&self, followed: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT follower_username FROM follows WHERE followed_username = ?1 AND accepted = 1",
        )
        .bind(followed)
        .fetch_all(self.pool())
        .await
    }

    /// Requests this user sent that are still pending.
    pub async fn pending_outgoing(&self, follower: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT followed_username FROM follows WHERE follower_username = ?1 AND accepted = 0",
        )
        .bind(follower)
        .fetch_all(self.pool())
        .await
    }

    /// Requests waiting on this user's decision.
    pub async fn pending_incoming(&self, followed: &str) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT follower_username FROM follows WHERE followed_username = ?1 AND accepted = 0",
        )
        .bind(followed)
        .fetch_all(self.pool())
        .await
    }
}
