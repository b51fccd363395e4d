use async_trait::async_trait;

use crate::db::Database;
use crate::error::FeedError;

/// Token collaborator contract. Token mechanics (signing, claims, rotation)
/// live outside this crate; feeds only need `token -> username | invalid`.
#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// Resolves a bearer token to a username. `Ok(None)` means the token is
    /// invalid; errors are storage faults in the verifier itself.
    async fn verify(&self, token: &str) -> Result<Option<String>, FeedError>;
}

/// Verifier backed by the users table: opaque tokens stored per account,
/// deactivated accounts resolving as invalid.
pub struct DbTokenVerifier {
    db: Database,
}

impl DbTokenVerifier {
    pub fn new(db: Database) -> Self {
        DbTokenVerifier { db }
    }
}

#[async_trait]
impl TokenVerifier for DbTokenVerifier {
    async fn verify(&self, token: &str) -> Result<Option<String>, FeedError> {
        if token.is_empty() {
            return Ok(None);
        }
        Ok(self.db.username_for_token(token).await?)
    }
}
