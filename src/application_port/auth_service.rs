use super::RequestScope;
use crate::domain_model::*;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("unauthorized")]
    Unauthorized,
    #[error("repository error: {0}")]
    Repository(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token is malformed")]
    Malformed,
    #[error("token signature is invalid")]
    SignatureInvalid,
    #[error("token expired")]
    Expired,
    #[error("token issuer mismatch")]
    IssuerMismatch,
    #[error("token audience mismatch")]
    AudienceMismatch,
    #[error("token encoding failed: {0}")]
    Encoding(String),
}

#[derive(Clone)]
pub struct LoginInput {
    pub email: String,
    pub password: String,
}

impl fmt::Debug for LoginInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginInput")
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

#[derive(Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct AccessToken(pub String);

impl AccessToken {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(..)")
    }
}

/// Output of [`TokenCodec::issue_access_token`].
#[derive(Debug, Clone)]
pub struct IssuedAccessToken {
    pub token: AccessToken,
    pub token_id: TokenId,
    pub expires_in_secs: i64,
    pub expires_at: DateTime<Utc>,
}

/// An access token as handed back to a client by login or refresh.
#[derive(Debug, Clone)]
pub struct AccessGrant {
    pub access_token: AccessToken,
    pub expires_in_secs: i64,
    pub expires_at: DateTime<Utc>,
}

impl From<IssuedAccessToken> for AccessGrant {
    fn from(issued: IssuedAccessToken) -> Self {
        AccessGrant {
            access_token: issued.token,
            expires_in_secs: issued.expires_in_secs,
            expires_at: issued.expires_at,
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoginResult {
    pub user_id: UserId,
    pub grant: AccessGrant,
    pub refresh_id: RefreshId,
    pub refresh_ttl_secs: i64,
}

/// Issues and verifies signed access tokens. Pure computation, no I/O.
pub trait TokenCodec: Send + Sync {
    fn issue_access_token(
        &self,
        user_id: UserId,
        role: Role,
    ) -> Result<IssuedAccessToken, TokenError>;

    /// Checks structure, signature, issuer, audience and expiry. Any failure rejects the token.
    fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, TokenError>;

    /// Time left until `claims.expires_at`, to the millisecond. Zero once expired.
    fn remaining_lifetime(&self, claims: &AccessTokenClaims) -> std::time::Duration;
}

#[async_trait::async_trait]
pub trait CredentialHasher: Send + Sync {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError>;
    async fn verify_password(&self, password: &str, password_hash: &str)
    -> Result<bool, AuthError>;

    /// Spends the work of a failed verification when there is no stored hash,
    /// so an unknown email takes as long as a wrong password.
    async fn verify_decoy(&self, password: &str);
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError>;

    /// Exchanges a refresh id for a new access token. The refresh id stays valid.
    async fn refresh(&self, refresh_id: &str) -> Result<AccessGrant, AuthError>;

    /// Best-effort revocation. Never fails.
    async fn logout(&self, access_token: Option<&str>, refresh_id: Option<&str>);

    fn current_identity(&self, scope: &RequestScope) -> Option<Identity>;
}
