use thiserror::Error;

/// Failure taxonomy for the feed engine and its collaborators.
///
/// Nothing here is retried automatically; every variant is terminal for the
/// request that produced it.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Malformed caller input, rejected before any store access.
    #[error("invalid request: {0}")]
    Validation(String),

    /// A required single-entity lookup came back empty.
    #[error("not found: {0}")]
    NotFound(String),

    /// The token collaborator could not resolve the caller to a username.
    #[error("invalid or expired token")]
    InvalidToken,

    /// Any storage fault, kept opaque to callers.
    #[error("storage failure: {0}")]
    Store(#[from] sqlx::Error),

    /// Language-model collaborator failure. Only ever affects the
    /// explanation field, never feed composition.
    #[error("language model failure: {0}")]
    Dependency(String),
}
