use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

struct Entry {
    value: String,
    expires_at: DateTime<Utc>,
}

/// In-process [`TokenStore`] with TTL expiry against an injected clock.
/// Expired entries are swept on every write. Entries do not survive a restart.
pub struct MemoryTokenStore {
    entries: DashMap<String, Entry>,
    clock: Arc<dyn Clock>,
}

impl MemoryTokenStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        MemoryTokenStore {
            entries: DashMap::new(),
            clock,
        }
    }

    fn refresh_key(id: &RefreshId) -> String {
        format!("refresh:{}", id.as_str())
    }

    fn blacklist_key(id: &TokenId) -> String {
        format!("blacklist:{}", id)
    }

    fn put(&self, key: String, value: String, ttl: Duration) {
        if ttl <= Duration::zero() {
            return;
        }
        let now = self.clock.now();
        self.entries.retain(|_, entry| entry.expires_at > now);
        let expires_at = now
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.entries.insert(key, Entry { value, expires_at });
    }

    fn live(&self, key: &str) -> Option<String> {
        let now = self.clock.now();
        let removed = self
            .entries
            .remove_if(key, |_, entry| entry.expires_at <= now);
        if removed.is_some() {
            return None;
        }
        self.entries.get(key).map(|entry| entry.value.clone())
    }

    /// Number of stored entries, expired ones included until the next write.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait::async_trait]
impl TokenStore for MemoryTokenStore {
    async fn save_refresh_token(
        &self,
        id: &RefreshId,
        payload: &str,
        ttl_secs: i64,
    ) -> Result<(), StoreError> {
        self.put(
            Self::refresh_key(id),
            payload.to_string(),
            Duration::seconds(ttl_secs),
        );
        Ok(())
    }

    async fn get_refresh_token(&self, id: &RefreshId) -> Result<Option<String>, StoreError> {
        Ok(self.live(&Self::refresh_key(id)))
    }

    async fn delete_refresh_token(&self, id: &RefreshId) -> Result<(), StoreError> {
        self.entries.remove(&Self::refresh_key(id));
        Ok(())
    }

    async fn add_to_blacklist(&self, id: &TokenId, ttl: StdDuration) -> Result<(), StoreError> {
        let ttl = Duration::from_std(ttl).unwrap_or(Duration::MAX);
        self.put(Self::blacklist_key(id), "1".to_string(), ttl);
        Ok(())
    }

    async fn is_blacklisted(&self, id: &TokenId) -> Result<bool, StoreError> {
        Ok(self.live(&Self::blacklist_key(id)).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::ManualClock;

    fn store() -> (Arc<ManualClock>, MemoryTokenStore) {
        let clock = Arc::new(ManualClock::starting_at_secs(1_700_000_000));
        (clock.clone(), MemoryTokenStore::new(clock))
    }

    #[tokio::test]
    async fn refresh_record_expires_with_its_ttl() {
        let (clock, store) = store();
        let id = RefreshId("abc".to_string());
        store.save_refresh_token(&id, "1:USER", 60).await.unwrap();

        clock.advance_secs(59);
        assert_eq!(store.get_refresh_token(&id).await.unwrap().as_deref(), Some("1:USER"));
        clock.advance_secs(1);
        assert_eq!(store.get_refresh_token(&id).await.unwrap(), None);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let (_, store) = store();
        let id = RefreshId("abc".to_string());
        store.save_refresh_token(&id, "1:USER", 60).await.unwrap();

        store.delete_refresh_token(&id).await.unwrap();
        store.delete_refresh_token(&id).await.unwrap();
        assert_eq!(store.get_refresh_token(&id).await.unwrap(), None);
    }

    #[tokio::test]
    async fn non_positive_ttl_is_a_no_op() {
        let (_, store) = store();
        let jti = TokenId("t".to_string());
        store.add_to_blacklist(&jti, StdDuration::ZERO).await.unwrap();
        store
            .save_refresh_token(&RefreshId("r".to_string()), "1:USER", 0)
            .await
            .unwrap();

        assert!(!store.is_blacklisted(&jti).await.unwrap());
        assert_eq!(store.len(), 0);
    }

    #[tokio::test]
    async fn blacklist_and_refresh_namespaces_are_separate() {
        let (_, store) = store();
        store
            .add_to_blacklist(&TokenId("same".to_string()), StdDuration::from_secs(60))
            .await
            .unwrap();

        assert_eq!(
            store.get_refresh_token(&RefreshId("same".to_string())).await.unwrap(),
            None
        );
        assert!(store.is_blacklisted(&TokenId("same".to_string())).await.unwrap());
    }

    #[tokio::test]
    async fn blacklist_entry_expires_to_the_millisecond() {
        let (clock, store) = store();
        let jti = TokenId("t".to_string());
        store
            .add_to_blacklist(&jti, StdDuration::from_millis(1_500))
            .await
            .unwrap();

        clock.advance_millis(1_499);
        assert!(store.is_blacklisted(&jti).await.unwrap());
        clock.advance_millis(1);
        assert!(!store.is_blacklisted(&jti).await.unwrap());
    }

    #[tokio::test]
    async fn writes_sweep_entries_nobody_reads_again() {
        let (clock, store) = store();
        for n in 0..1_000 {
            store
                .add_to_blacklist(&TokenId(format!("jti-{n}")), StdDuration::from_secs(1))
                .await
                .unwrap();
        }
        store
            .save_refresh_token(&RefreshId("abandoned".to_string()), "1:USER", 60)
            .await
            .unwrap();
        assert_eq!(store.len(), 1_001);

        clock.advance_secs(86_400);
        store
            .add_to_blacklist(&TokenId("fresh".to_string()), StdDuration::from_secs(1))
            .await
            .unwrap();

        assert_eq!(store.len(), 1);
    }
}
