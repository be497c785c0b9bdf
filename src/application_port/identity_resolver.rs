use crate::domain_model::Identity;

const BEARER_PREFIX: &str = "Bearer ";

/// Raw credential material pulled off an inbound request.
#[derive(Debug, Clone, Default)]
pub struct RequestCredentials {
    pub authorization: Option<String>,
    pub access_cookie: Option<String>,
}

impl RequestCredentials {
    /// The bearer token from the `Authorization` header, else the access-token cookie
    /// used by form clients.
    pub fn bearer(&self) -> Option<&str> {
        let from_header = self
            .authorization
            .as_deref()
            .and_then(|header| header.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty());

        from_header.or_else(|| {
            self.access_cookie
                .as_deref()
                .map(str::trim)
                .filter(|token| !token.is_empty())
        })
    }
}

/// Identity bound to exactly one request. Anonymous unless the resolver attached one.
#[derive(Debug, Clone, Default)]
pub struct RequestScope {
    identity: Option<Identity>,
}

impl RequestScope {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(identity: Identity) -> Self {
        RequestScope {
            identity: Some(identity),
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }
}

#[async_trait::async_trait]
pub trait IdentityResolver: Send + Sync {
    /// Never fails: anything short of a valid, unrevoked token for an existing user
    /// yields an anonymous scope.
    async fn resolve(&self, credentials: &RequestCredentials) -> RequestScope;
}
