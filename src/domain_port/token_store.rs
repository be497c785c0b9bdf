use crate::domain_model::*;
use std::time::Duration;

/// Failure talking to the token store. "Not found" is never an error: reads return `None`/`false`.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("token store unavailable: {0}")]
    Unavailable(String),
    #[error("token store timed out after {0:?}")]
    Timeout(Duration),
    #[error("token store backend fault: {0}")]
    Backend(String),
    #[error("token store returned undecodable data: {0}")]
    Corrupt(String),
}

impl StoreError {
    /// Whether this failure means the backend itself is unreachable or broken,
    /// as opposed to a single bad record.
    pub fn is_outage(&self) -> bool {
        !matches!(self, StoreError::Corrupt(_))
    }
}

/// Durable, TTL-capable key-value storage for refresh records and blacklist entries.
/// Every operation is a single atomic put/get/delete on the backend.
#[async_trait::async_trait]
pub trait TokenStore: Send + Sync {
    /// Upsert a refresh record that expires after `ttl_secs`. A ttl <= 0 is a no-op.
    async fn save_refresh_token(
        &self,
        id: &RefreshId,
        payload: &str,
        ttl_secs: i64,
    ) -> Result<(), StoreError>;

    /// `None` when the record is absent or expired.
    async fn get_refresh_token(&self, id: &RefreshId) -> Result<Option<String>, StoreError>;

    /// Idempotent.
    async fn delete_refresh_token(&self, id: &RefreshId) -> Result<(), StoreError>;

    /// Upsert a blacklist entry that expires after `ttl`, kept to millisecond precision.
    /// A zero ttl is a no-op.
    async fn add_to_blacklist(&self, id: &TokenId, ttl: Duration) -> Result<(), StoreError>;

    async fn is_blacklisted(&self, id: &TokenId) -> Result<bool, StoreError>;
}
