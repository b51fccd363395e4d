// Re-export the Database struct and other public items
mod article;
mod comment;
pub mod core;
mod interaction;
mod post;
mod preference;
mod profile;
mod repost;
mod saved;
mod schema;
mod social;

pub use self::core::Database;
pub use self::repost::RepostRow;
pub use self::social::FollowOutcome;
pub use sqlx::Row;
