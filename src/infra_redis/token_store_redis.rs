use crate::domain_model::*;
use crate::domain_port::*;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, RedisError, RedisResult};
use std::future::Future;
use std::time::Duration;

/// Redis-backed [`TokenStore`]. Every command is bounded by `timeout`.
pub struct RedisTokenStore {
    conn: Option<ConnectionManager>,
    prefix: String,
    timeout: Duration,
}

impl RedisTokenStore {
    pub fn new(conn: ConnectionManager, prefix: impl Into<String>, timeout: Duration) -> Self {
        RedisTokenStore {
            conn: Some(conn),
            prefix: prefix.into(),
            timeout,
        }
    }

    /// A store whose backend could not be reached at startup. Every call fails as unavailable.
    pub fn disconnected(prefix: impl Into<String>, timeout: Duration) -> Self {
        RedisTokenStore {
            conn: None,
            prefix: prefix.into(),
            timeout,
        }
    }

    pub async fn connect(
        dsn: &str,
        prefix: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, StoreError> {
        let client = redis::Client::open(dsn).map_err(classify)?;
        let conn = tokio::time::timeout(timeout, client.get_connection_manager())
            .await
            .map_err(|_| StoreError::Timeout(timeout))?
            .map_err(classify)?;
        Ok(Self::new(conn, prefix, timeout))
    }

    pub async fn ping(&self) -> Result<String, StoreError> {
        let mut conn = self.conn()?;
        let ping = redis::cmd("PING");
        self.bounded(ping.query_async::<String>(&mut conn)).await
    }

    fn refresh_key(&self, id: &RefreshId) -> String {
        format!("{}:refresh:{}", self.prefix, id.as_str())
    }

    fn blacklist_key(&self, id: &TokenId) -> String {
        format!("{}:blacklist:{}", self.prefix, id)
    }

    fn conn(&self) -> Result<ConnectionManager, StoreError> {
        self.conn
            .clone()
            .ok_or_else(|| StoreError::Unavailable("not connected".to_string()))
    }

    async fn bounded<T>(&self, command: impl Future<Output = RedisResult<T>>) -> Result<T, StoreError> {
        match tokio::time::timeout(self.timeout, command).await {
            Ok(result) => result.map_err(classify),
            Err(_) => Err(StoreError::Timeout(self.timeout)),
        }
    }
}

fn classify(e: RedisError) -> StoreError {
    if e.is_io_error() || e.is_connection_refusal() || e.is_connection_dropped() || e.is_timeout() {
        StoreError::Unavailable(e.to_string())
    } else if e.kind() == redis::ErrorKind::TypeError {
        StoreError::Corrupt(e.to_string())
    } else {
        StoreError::Backend(e.to_string())
    }
}

#[async_trait::async_trait]
impl TokenStore for RedisTokenStore {
    async fn save_refresh_token(
        &self,
        id: &RefreshId,
        payload: &str,
        ttl_secs: i64,
    ) -> Result<(), StoreError> {
        if ttl_secs <= 0 {
            return Ok(());
        }
        let key = self.refresh_key(id);
        let mut conn = self.conn()?;
        self.bounded(conn.set_ex::<_, _, ()>(&key, payload, ttl_secs as u64))
            .await
    }

    async fn get_refresh_token(&self, id: &RefreshId) -> Result<Option<String>, StoreError> {
        let key = self.refresh_key(id);
        let mut conn = self.conn()?;
        self.bounded(conn.get::<_, Option<String>>(&key)).await
    }

    async fn delete_refresh_token(&self, id: &RefreshId) -> Result<(), StoreError> {
        let key = self.refresh_key(id);
        let mut conn = self.conn()?;
        self.bounded(conn.del::<_, ()>(&key)).await
    }

    async fn add_to_blacklist(&self, id: &TokenId, ttl: Duration) -> Result<(), StoreError> {
        let ttl_ms = ttl.as_millis().min(u64::MAX as u128) as u64;
        if ttl_ms == 0 {
            return Ok(());
        }
        let key = self.blacklist_key(id);
        let mut conn = self.conn()?;
        self.bounded(conn.pset_ex::<_, _, ()>(&key, 1u8, ttl_ms))
            .await
    }

    async fn is_blacklisted(&self, id: &TokenId) -> Result<bool, StoreError> {
        let key = self.blacklist_key(id);
        let mut conn = self.conn()?;
        self.bounded(conn.exists::<_, bool>(&key)).await
    }
}
