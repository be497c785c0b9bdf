use super::StoreBreaker;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Fail-open wrapper around the primary [`TokenStore`].
///
/// While the breaker is closed every call goes to the backend. The first outage
/// trips the breaker; from then on writes are skipped, `get_refresh_token` answers
/// `None` and `is_blacklisted` answers `false` without touching the backend.
/// Store failures never reach callers.
pub struct ResilientTokenStore {
    primary: Arc<dyn TokenStore>,
    breaker: Arc<StoreBreaker>,
}

impl ResilientTokenStore {
    pub fn new(primary: Arc<dyn TokenStore>, breaker: Arc<StoreBreaker>) -> Self {
        ResilientTokenStore { primary, breaker }
    }

    pub fn breaker(&self) -> &Arc<StoreBreaker> {
        &self.breaker
    }

    pub async fn save_refresh_token(&self, id: &RefreshId, payload: &str, ttl_secs: i64) {
        self.guarded(
            "save_refresh_token",
            (),
            self.primary.save_refresh_token(id, payload, ttl_secs),
        )
        .await
    }

    pub async fn get_refresh_token(&self, id: &RefreshId) -> Option<String> {
        self.guarded("get_refresh_token", None, self.primary.get_refresh_token(id))
            .await
    }

    pub async fn delete_refresh_token(&self, id: &RefreshId) {
        self.guarded("delete_refresh_token", (), self.primary.delete_refresh_token(id))
            .await
    }

    pub async fn add_to_blacklist(&self, id: &TokenId, ttl: Duration) {
        self.guarded("add_to_blacklist", (), self.primary.add_to_blacklist(id, ttl))
        .await
    }

    pub async fn is_blacklisted(&self, id: &TokenId) -> bool {
        self.guarded("is_blacklisted", false, self.primary.is_blacklisted(id))
            .await
    }

    async fn guarded<T>(
        &self,
        operation: &'static str,
        fallback: T,
        call: impl Future<Output = Result<T, StoreError>>,
    ) -> T {
        if self.breaker.is_tripped() {
            trace!(operation, "token store tripped, returning fallback");
            return fallback;
        }
        match call.await {
            Ok(value) => value,
            Err(e) => {
                self.on_failure(operation, &e);
                fallback
            }
        }
    }

    fn on_failure(&self, operation: &'static str, error: &StoreError) {
        if !error.is_outage() {
            error!(operation, %error, "token store returned corrupt data");
            return;
        }
        if self.breaker.trip() {
            warn!(
                operation,
                %error,
                "token store failed, falling back to no-op until restart"
            );
        } else {
            debug!(operation, %error, "token store failed after breaker tripped");
        }
    }
}
