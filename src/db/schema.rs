use tracing::{debug, instrument};

use super::core::Database;
use crate::TARGET_DB;

impl Database {
    /// Idempotent schema bootstrap; runs on every pool creation.
    #[instrument(target = "db", level = "info", skip(self))]
    pub async fn initialize_schema(&self) -> Result<(), sqlx::Error> {
        debug!(target: TARGET_DB, "Initializing database schema");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS articles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                link TEXT NOT NULL,
                headline TEXT NOT NULL,
                category TEXT NOT NULL DEFAULT '',
                short_description TEXT,
                authors TEXT,
                published_at TIMESTAMP NOT NULL,
                cluster_id INTEGER,
                image_url TEXT,
                explanation TEXT,
                region TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_articles_published_at ON articles (published_at);
            CREATE INDEX IF NOT EXISTS idx_articles_cluster_id ON articles (cluster_id);
            CREATE INDEX IF NOT EXISTS idx_articles_region ON articles (region);

            CREATE TABLE IF NOT EXISTS posts (
                permalink TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                author TEXT NOT NULL,
                body TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL,
                retweets INTEGER NOT NULL DEFAULT 0,
                favorites INTEGER NOT NULL DEFAULT 0,
                media_url TEXT,
                explanation TEXT,
                categories TEXT NOT NULL DEFAULT '',
                region TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_posts_source ON posts (source);
            CREATE INDEX IF NOT EXISTS idx_posts_created_at ON posts (created_at);
            CREATE INDEX IF NOT EXISTS idx_posts_region ON posts (region);

            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT,
                auth_token TEXT,
                region TEXT,
                deactivated BOOLEAN NOT NULL DEFAULT 0
            );
            CREATE INDEX IF NOT EXISTS idx_users_auth_token ON users (auth_token);

            CREATE TABLE IF NOT EXISTS follows (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                follower_username TEXT NOT NULL,
                followed_username TEXT NOT NULL,
                accepted BOOLEAN NOT NULL DEFAULT 0,
                UNIQUE (follower_username, followed_username)
            );
            CREATE INDEX IF NOT EXISTS idx_follows_followed ON follows (followed_username);

            CREATE TABLE IF NOT EXISTS reposts (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                item_type TEXT NOT NULL,
                item_id TEXT NOT NULL,
                reposted_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_reposts_username ON reposts (username);
            CREATE INDEX IF NOT EXISTS idx_reposts_item ON reposts (item_type, item_id);

            CREATE TABLE IF NOT EXISTS saved_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                item_type TEXT NOT NULL,
                item_id TEXT NOT NULL,
                saved_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_saved_items_username ON saved_items (username);

            CREATE TABLE IF NOT EXISTS interactions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                item_type TEXT NOT NULL,
                item_id TEXT NOT NULL,
                interaction_type TEXT NOT NULL,
                region TEXT,
                created_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_interactions_created_at ON interactions (created_at);
            CREATE INDEX IF NOT EXISTS idx_interactions_username ON interactions (username);
            CREATE INDEX IF NOT EXISTS idx_interactions_item ON interactions (item_type, item_id);

            CREATE TABLE IF NOT EXISTS preferences (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                preference TEXT NOT NULL,
                UNIQUE (username, preference)
            );

            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_type TEXT NOT NULL,
                item_id TEXT NOT NULL,
                username TEXT NOT NULL,
                content TEXT NOT NULL,
                created_at TIMESTAMP NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_comments_item ON comments (item_type, item_id);
            "#,
        )
        .execute(self.pool())
        .await?;

        debug!(target: TARGET_DB, "Database schema initialized");
        Ok(())
    }
}
