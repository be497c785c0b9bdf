use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_resilience::ResilientTokenStore;
use crate::logger::*;
use std::sync::Arc;
use std::time::Duration;

pub struct RealAuthService {
    user_repo: Arc<dyn UserRepo>,
    credential_hasher: Arc<dyn CredentialHasher>,
    token_codec: Arc<dyn TokenCodec>,
    token_store: Arc<ResilientTokenStore>,
    refresh_ttl: Duration,
}

impl RealAuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepo>,
        credential_hasher: Arc<dyn CredentialHasher>,
        token_codec: Arc<dyn TokenCodec>,
        token_store: Arc<ResilientTokenStore>,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            user_repo,
            credential_hasher,
            token_codec,
            token_store,
            refresh_ttl,
        }
    }

    #[inline]
    fn refresh_ttl_secs(&self) -> i64 {
        self.refresh_ttl.as_secs() as i64
    }

    fn issue(&self, user: &User) -> Result<IssuedAccessToken, AuthError> {
        self.token_codec
            .issue_access_token(user.id, user.role)
            .map_err(|e| AuthError::InternalError(e.to_string()))
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn login(&self, request: LoginInput) -> Result<LoginResult, AuthError> {
        let LoginInput { email, password } = request;

        let Some(user) = self.user_repo.find_by_email(&email).await? else {
            self.credential_hasher.verify_decoy(&password).await;
            warn!(%email, "login rejected: unknown email");
            return Err(AuthError::InvalidCredentials);
        };

        let ok = self
            .credential_hasher
            .verify_password(&password, &user.password_hash)
            .await?;
        if !ok {
            warn!(%email, "login rejected: password mismatch");
            return Err(AuthError::InvalidCredentials);
        }

        let issued = self.issue(&user)?;

        let refresh_id = RefreshId::new_random();
        let payload = RefreshPayload {
            user_id: user.id,
            role: user.role,
        };
        self.token_store
            .save_refresh_token(&refresh_id, &payload.to_string(), self.refresh_ttl_secs())
            .await;

        info!(user_id = %user.id, "login succeeded");
        Ok(LoginResult {
            user_id: user.id,
            grant: issued.into(),
            refresh_id,
            refresh_ttl_secs: self.refresh_ttl_secs(),
        })
    }

    async fn refresh(&self, refresh_id: &str) -> Result<AccessGrant, AuthError> {
        let Some(refresh_id) = non_blank(Some(refresh_id)) else {
            warn!("refresh rejected: no refresh id");
            return Err(AuthError::Unauthorized);
        };

        let Some(raw) = self
            .token_store
            .get_refresh_token(&RefreshId(refresh_id.to_string()))
            .await
        else {
            warn!("refresh rejected: unknown refresh id");
            return Err(AuthError::Unauthorized);
        };

        let payload = raw.parse::<RefreshPayload>().map_err(|e| {
            warn!(error = %e, "refresh rejected: malformed payload");
            AuthError::Unauthorized
        })?;

        let Some(user) = self.user_repo.find_by_id(payload.user_id).await? else {
            warn!(user_id = %payload.user_id, "refresh rejected: user no longer exists");
            return Err(AuthError::Unauthorized);
        };

        let issued = self.issue(&user)?;
        info!(user_id = %user.id, "access token refreshed");
        Ok(issued.into())
    }

    async fn logout(&self, access_token: Option<&str>, refresh_id: Option<&str>) {
        if let Some(token) = non_blank(access_token) {
            match self.token_codec.verify_access_token(token) {
                Ok(claims) => {
                    let remaining = self.token_codec.remaining_lifetime(&claims);
                    self.token_store
                        .add_to_blacklist(&claims.token_id, remaining)
                        .await;
                }
                Err(e) => debug!(error = %e, "logout: access token not blacklisted"),
            }
        }
        if let Some(refresh_id) = non_blank(refresh_id) {
            self.token_store
                .delete_refresh_token(&RefreshId(refresh_id.to_string()))
                .await;
        }
        info!("logout completed");
    }

    fn current_identity(&self, scope: &RequestScope) -> Option<Identity> {
        scope.identity().cloned()
    }
}
