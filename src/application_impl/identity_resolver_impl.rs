use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_resilience::ResilientTokenStore;
use crate::logger::*;
use std::sync::Arc;

/// Turns request credentials into a [`RequestScope`]. Runs once per request before routing.
pub struct RealIdentityResolver {
    token_codec: Arc<dyn TokenCodec>,
    token_store: Arc<ResilientTokenStore>,
    user_repo: Arc<dyn UserRepo>,
}

impl RealIdentityResolver {
    pub fn new(
        token_codec: Arc<dyn TokenCodec>,
        token_store: Arc<ResilientTokenStore>,
        user_repo: Arc<dyn UserRepo>,
    ) -> Self {
        Self {
            token_codec,
            token_store,
            user_repo,
        }
    }

    async fn identify(&self, token: &str) -> Option<Identity> {
        let claims = match self.token_codec.verify_access_token(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "bearer token rejected");
                return None;
            }
        };

        if self.token_store.is_blacklisted(&claims.token_id).await {
            debug!(token_id = %claims.token_id, "bearer token revoked");
            return None;
        }

        let user = match self.user_repo.find_by_id(claims.subject).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                debug!(user_id = %claims.subject, "bearer token for unknown user");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "user lookup failed while resolving identity");
                return None;
            }
        };

        let role = user.role;
        Some(Identity { user, role })
    }
}

#[async_trait::async_trait]
impl IdentityResolver for RealIdentityResolver {
    async fn resolve(&self, credentials: &RequestCredentials) -> RequestScope {
        let Some(token) = credentials.bearer() else {
            return RequestScope::anonymous();
        };
        match self.identify(token).await {
            Some(identity) => RequestScope::authenticated(identity),
            None => RequestScope::anonymous(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application_impl::*;
    use crate::infra_memory::*;
    use crate::infra_resilience::StoreBreaker;
    use std::time::Duration;

    const START: i64 = 1_700_000_000;

    fn config(secret: &[u8]) -> JwtConfig {
        JwtConfig {
            issuer: "https://api.example.com".to_string(),
            audience: "mapsns".to_string(),
            access_ttl: Duration::from_secs(900),
            signing_key: SigningSecret::new(secret).unwrap(),
        }
    }

    struct Fixture {
        clock: Arc<ManualClock>,
        users: Arc<MemoryUserRepo>,
        backend: Arc<MemoryTokenStore>,
        codec: Arc<JwtHs256Codec>,
        breaker: Arc<StoreBreaker>,
        resolver: RealIdentityResolver,
        user: User,
    }

    fn fixture_with(breaker: StoreBreaker) -> Fixture {
        let clock = Arc::new(ManualClock::starting_at_secs(START));
        let users = Arc::new(MemoryUserRepo::new());
        let user = users
            .insert("a@x.com", "hash".to_string(), "alice", Role::User)
            .unwrap();
        let backend = Arc::new(MemoryTokenStore::new(clock.clone()));
        let codec = Arc::new(JwtHs256Codec::new(
            config(b"0123456789abcdef0123456789abcdef"),
            clock.clone(),
        ));
        let breaker = Arc::new(breaker);
        let store = Arc::new(ResilientTokenStore::new(backend.clone(), breaker.clone()));
        let resolver = RealIdentityResolver::new(codec.clone(), store, users.clone());
        Fixture {
            clock,
            users,
            backend,
            codec,
            breaker,
            resolver,
            user,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(StoreBreaker::new())
    }

    fn bearer(token: &str) -> RequestCredentials {
        RequestCredentials {
            authorization: Some(format!("Bearer {token}")),
            access_cookie: None,
        }
    }

    fn issue(f: &Fixture) -> IssuedAccessToken {
        f.codec.issue_access_token(f.user.id, Role::User).unwrap()
    }

    #[tokio::test]
    async fn valid_token_authenticates() {
        let f = fixture();
        let issued = issue(&f);

        let scope = f.resolver.resolve(&bearer(issued.token.as_str())).await;

        let identity = scope.identity().unwrap();
        assert_eq!(identity.user_id(), f.user.id);
        assert_eq!(identity.role.authority(), "ROLE_USER");
    }

    #[tokio::test]
    async fn cookie_token_authenticates_form_clients() {
        let f = fixture();
        let issued = issue(&f);
        let creds = RequestCredentials {
            authorization: None,
            access_cookie: Some(issued.token.as_str().to_string()),
        };

        assert!(f.resolver.resolve(&creds).await.is_authenticated());
    }

    #[tokio::test]
    async fn missing_and_garbage_tokens_are_anonymous() {
        let f = fixture();
        assert!(!f.resolver.resolve(&RequestCredentials::default()).await.is_authenticated());
        assert!(!f.resolver.resolve(&bearer("not.a.jwt")).await.is_authenticated());
    }

    #[tokio::test]
    async fn expired_token_is_anonymous() {
        let f = fixture();
        let issued = issue(&f);

        f.clock.advance_secs(900);

        assert!(!f.resolver.resolve(&bearer(issued.token.as_str())).await.is_authenticated());
    }

    #[tokio::test]
    async fn token_signed_with_another_key_is_anonymous() {
        let f = fixture();
        let foreign = JwtHs256Codec::new(
            config(b"ffffffffffffffffffffffffffffffff"),
            f.clock.clone(),
        );
        let issued = foreign.issue_access_token(f.user.id, Role::Admin).unwrap();

        assert!(!f.resolver.resolve(&bearer(issued.token.as_str())).await.is_authenticated());
    }

    #[tokio::test]
    async fn blacklisted_token_is_anonymous() {
        let f = fixture();
        let issued = issue(&f);
        f.backend
            .add_to_blacklist(&issued.token_id, Duration::from_secs(900))
            .await
            .unwrap();

        assert!(!f.resolver.resolve(&bearer(issued.token.as_str())).await.is_authenticated());
    }

    #[tokio::test]
    async fn token_of_deleted_user_is_anonymous() {
        let f = fixture();
        let issued = issue(&f);
        f.users.remove(f.user.id);

        assert!(!f.resolver.resolve(&bearer(issued.token.as_str())).await.is_authenticated());
    }

    #[tokio::test]
    async fn role_comes_from_the_member_record() {
        let f = fixture();
        let issued = f.codec.issue_access_token(f.user.id, Role::Admin).unwrap();

        let scope = f.resolver.resolve(&bearer(issued.token.as_str())).await;

        assert_eq!(scope.identity().unwrap().role, Role::User);
    }

    #[tokio::test]
    async fn tripped_store_fails_open_on_revocation() {
        let f = fixture_with(StoreBreaker::new_tripped());
        let issued = issue(&f);
        f.backend
            .add_to_blacklist(&issued.token_id, Duration::from_secs(900))
            .await
            .unwrap();

        let scope = f.resolver.resolve(&bearer(issued.token.as_str())).await;

        assert!(f.breaker.is_tripped());
        assert!(scope.is_authenticated());
    }
}
