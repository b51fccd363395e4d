pub mod auth;
pub mod common;
pub mod config;
pub mod db;
pub mod error;
pub mod explain;
pub mod feed;
pub mod logging;

pub const TARGET_LLM_REQUEST: &str = "llm_request";
pub const TARGET_DB: &str = "db_query";

pub use config::Config;
pub use db::Database;
pub use error::FeedError;
pub use feed::FeedEngine;
