use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::infra_mysql::*;
use crate::infra_redis::*;
use crate::infra_resilience::*;
use crate::logger::*;
use crate::settings::{self, Settings};
use anyhow::anyhow;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};
use std::sync::Arc;
use std::time::Duration;

/// Environment variable holding the HS256 signing secret.
pub const SECRET_ENV: &str = "JWT_SECRET_KEY";

pub fn signing_secret_from_env() -> anyhow::Result<SigningSecret> {
    let raw = std::env::var(SECRET_ENV).map_err(|_| anyhow!("{SECRET_ENV} is not set"))?;
    Ok(SigningSecret::new(raw.into_bytes())?)
}

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub identity_resolver: Arc<dyn IdentityResolver>,
    pub cookie_secure: bool,
    pool: Option<Pool<MySql>>,
}

impl Server {
    pub fn new(
        auth_service: Arc<dyn AuthService>,
        identity_resolver: Arc<dyn IdentityResolver>,
        cookie_secure: bool,
    ) -> Self {
        Self {
            auth_service,
            identity_resolver,
            cookie_secure,
            pool: None,
        }
    }

    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let secret = signing_secret_from_env()?;
        Self::assemble(settings, secret, Arc::new(SystemClock)).await
    }

    /// Builds every component once from `settings`.
    pub async fn assemble(
        settings: &Settings,
        secret: SigningSecret,
        clock: Arc<dyn Clock>,
    ) -> anyhow::Result<Self> {
        let credential_hasher: Arc<dyn CredentialHasher> = Arc::new(Argon2PasswordHasher::new()?);
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(
            JwtConfig {
                issuer: settings.jwt.issuer.clone(),
                audience: settings.jwt.audience.clone(),
                access_ttl: settings.jwt.access_ttl(),
                signing_key: secret,
            },
            clock.clone(),
        ));

        let breaker = Arc::new(StoreBreaker::new());
        let primary = token_store_backend(&settings.token_store, &breaker, clock).await;
        let token_store = Arc::new(ResilientTokenStore::new(primary, breaker));

        let (user_repo, pool) = match &settings.user {
            settings::User::Mysql {
                mysql_dsn,
                acquire_timeout_ms,
            } => {
                let pool = MySqlPoolOptions::new()
                    .acquire_timeout(Duration::from_millis(*acquire_timeout_ms))
                    .connect_lazy(mysql_dsn)?;
                let repo = MySqlUserRepo::new(pool.clone());
                match repo.ping().await {
                    Ok(()) => info!("member store reachable"),
                    Err(e) => error!(error = %e, "member store unreachable, logins fail until it recovers"),
                }
                let repo: Arc<dyn UserRepo> = Arc::new(repo);
                (repo, Some(pool))
            }
            settings::User::Memory { seed } => {
                let repo = MemoryUserRepo::new();
                for user in seed {
                    let hash = credential_hasher.hash_password(&user.password).await?;
                    let role = user.role.parse::<Role>()?;
                    repo.insert(&user.email, hash, &user.nickname, role)?;
                }
                info!(seeded = seed.len(), "in-memory member store ready");
                let repo: Arc<dyn UserRepo> = Arc::new(repo);
                (repo, None)
            }
        };

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            user_repo.clone(),
            credential_hasher,
            token_codec.clone(),
            token_store.clone(),
            settings.jwt.refresh_ttl(),
        ));
        let identity_resolver: Arc<dyn IdentityResolver> = Arc::new(RealIdentityResolver::new(
            token_codec,
            token_store,
            user_repo,
        ));

        info!("server started");

        Ok(Self {
            auth_service,
            identity_resolver,
            cookie_secure: settings.http.cookie_secure,
            pool,
        })
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");
        if let Some(pool) = &self.pool {
            pool.close().await;
        }
    }
}

/// Picks the primary token store. An unreachable Redis trips `breaker` up front
/// so the server starts without revocation instead of failing.
async fn token_store_backend(
    config: &settings::TokenStore,
    breaker: &StoreBreaker,
    clock: Arc<dyn Clock>,
) -> Arc<dyn TokenStore> {
    match config {
        settings::TokenStore::Redis {
            redis_dsn,
            key_prefix,
            timeout_ms,
        } => {
            let timeout = Duration::from_millis(*timeout_ms);
            let store = match RedisTokenStore::connect(redis_dsn, key_prefix.clone(), timeout).await
            {
                Ok(store) => store,
                Err(e) => {
                    error!(error = %e, "token store connection failed");
                    RedisTokenStore::disconnected(key_prefix.clone(), timeout)
                }
            };
            match store.ping().await {
                Ok(_) => info!("token store reachable"),
                Err(e) => {
                    error!(error = %e, "token store unreachable, revocation disabled until restart");
                    breaker.trip();
                }
            }
            Arc::new(store)
        }
        settings::TokenStore::Memory => {
            warn!("using in-memory token store, revocations are lost on restart");
            Arc::new(MemoryTokenStore::new(clock))
        }
    }
}
