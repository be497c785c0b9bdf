use anyhow::{Result, anyhow};
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub http: Http,
    pub log: Log,
    pub jwt: Jwt,
    pub token_store: TokenStore,
    pub user: User,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    #[serde(default)]
    pub cookie_secure: bool,
    pub tls: Option<Tls>,
}

#[derive(Debug, Deserialize)]
pub struct Tls {
    pub cert_path: String,
    pub key_path: String,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

#[derive(Debug, Deserialize)]
pub struct Jwt {
    pub issuer: String,
    pub audience: String,
    #[serde(default = "default_access_ttl_minutes")]
    pub access_ttl_minutes: u64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: u64,
}

impl Jwt {
    pub fn access_ttl(&self) -> Duration {
        Duration::from_secs(self.access_ttl_minutes * 60)
    }

    pub fn refresh_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_ttl_days * 86_400)
    }
}

fn default_access_ttl_minutes() -> u64 {
    15
}

fn default_refresh_ttl_days() -> u64 {
    7
}

#[derive(Debug, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum TokenStore {
    Redis {
        redis_dsn: String,
        #[serde(default = "default_key_prefix")]
        key_prefix: String,
        #[serde(default = "default_timeout_ms")]
        timeout_ms: u64,
    },
    Memory,
}

fn default_key_prefix() -> String {
    "mapsns".to_string()
}

fn default_timeout_ms() -> u64 {
    500
}

#[derive(Debug, Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum User {
    Mysql {
        mysql_dsn: String,
        #[serde(default = "default_acquire_timeout_ms")]
        acquire_timeout_ms: u64,
    },
    Memory {
        #[serde(default)]
        seed: Vec<SeedUser>,
    },
}

fn default_acquire_timeout_ms() -> u64 {
    3_000
}

/// A member created at startup by the in-memory user backend.
#[derive(Deserialize)]
pub struct SeedUser {
    pub email: String,
    pub password: String,
    pub nickname: String,
    #[serde(default = "default_role")]
    pub role: String,
}

impl std::fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedUser")
            .field("email", &self.email)
            .field("nickname", &self.nickname)
            .field("role", &self.role)
            .finish_non_exhaustive()
    }
}

fn default_role() -> String {
    "USER".to_string()
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

/// Same as [`parse_settings`] but from an in-memory TOML document.
pub fn parse_settings_str(toml: &str) -> Result<Settings> {
    let settings: Settings = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[http]
address = "127.0.0.1:8080"

[log]
filter = "info"

[jwt]
issuer = "https://api.example.com"
audience = "mapsns"

[token_store]
backend = "memory"

[user]
backend = "memory"
"#;

    #[test]
    fn defaults_fill_in_lifetimes() {
        let settings = parse_settings_str(MINIMAL).unwrap();
        assert_eq!(settings.jwt.access_ttl(), Duration::from_secs(900));
        assert_eq!(settings.jwt.refresh_ttl(), Duration::from_secs(604_800));
        assert!(!settings.http.cookie_secure);
        assert!(settings.http.tls.is_none());
        assert!(matches!(settings.token_store, TokenStore::Memory));
        assert!(matches!(settings.user, User::Memory { ref seed } if seed.is_empty()));
    }

    #[test]
    fn redis_and_mysql_backends_parse() {
        let toml = r#"
[http]
address = "0.0.0.0:443"
cookie_secure = true

[http.tls]
cert_path = "cert.pem"
key_path = "key.pem"

[log]
filter = "warn"

[jwt]
issuer = "iss"
audience = "aud"
access_ttl_minutes = 5

[token_store]
backend = "redis"
redis_dsn = "redis://127.0.0.1:6379"

[user]
backend = "mysql"
mysql_dsn = "mysql://root@127.0.0.1/mapsns"
"#;
        let settings = parse_settings_str(toml).unwrap();
        assert_eq!(settings.jwt.access_ttl(), Duration::from_secs(300));
        assert!(settings.http.tls.is_some());
        match settings.token_store {
            TokenStore::Redis {
                key_prefix,
                timeout_ms,
                ..
            } => {
                assert_eq!(key_prefix, "mapsns");
                assert_eq!(timeout_ms, 500);
            }
            other => panic!("unexpected backend: {other:?}"),
        }
        assert!(matches!(
            settings.user,
            User::Mysql {
                acquire_timeout_ms: 3_000,
                ..
            }
        ));
    }

    #[test]
    fn seed_users_parse_and_hide_passwords() {
        let toml = format!(
            "{MINIMAL}\n{}",
            r#"
[[user.seed]]
email = "a@x.com"
password = "correctpw"
nickname = "alice"
"#
        );
        let settings = parse_settings_str(&toml).unwrap();
        let User::Memory { seed } = settings.user else {
            panic!("expected memory backend");
        };
        assert_eq!(seed.len(), 1);
        assert_eq!(seed[0].role, "USER");
        assert!(!format!("{:?}", seed[0]).contains("correctpw"));
    }

    #[test]
    fn unknown_backend_is_rejected() {
        let toml = MINIMAL.replace(
            "[token_store]\nbackend = \"memory\"",
            "[token_store]\nbackend = \"etcd\"",
        );
        assert!(parse_settings_str(&toml).is_err());
    }
}
