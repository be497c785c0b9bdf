use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::Clock;
use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// HS256 wants at least 256 bits of key material.
pub const MIN_SECRET_LEN: usize = 32;

#[derive(Debug, thiserror::Error)]
#[error("signing secret must be at least {MIN_SECRET_LEN} bytes, got {0}")]
pub struct WeakSecret(pub usize);

#[derive(Clone)]
pub struct SigningSecret(Vec<u8>);

impl SigningSecret {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Result<Self, WeakSecret> {
        let bytes = bytes.into();
        if bytes.len() < MIN_SECRET_LEN {
            return Err(WeakSecret(bytes.len()));
        }
        Ok(SigningSecret(bytes))
    }

    fn expose(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningSecret(<redacted>)")
    }
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub issuer: String,
    pub audience: String,
    pub access_ttl: Duration,
    pub signing_key: SigningSecret,
}

#[derive(Debug, Serialize, Deserialize)]
struct AccessClaims {
    sub: String,
    role: Role,
    jti: String,
    iss: String,
    aud: String,
    iat: i64,
    exp: i64,
}

fn decode_error(e: jsonwebtoken::errors::Error) -> TokenError {
    match e.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::SignatureInvalid,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        ErrorKind::InvalidIssuer => TokenError::IssuerMismatch,
        ErrorKind::InvalidAudience => TokenError::AudienceMismatch,
        _ => TokenError::Malformed,
    }
}

fn from_timestamp(secs: i64) -> Result<DateTime<Utc>, TokenError> {
    DateTime::from_timestamp(secs, 0).ok_or(TokenError::Malformed)
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig, clock: Arc<dyn Clock>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked against `clock`, not the system time
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub", "iss", "aud"]);
        validation.set_issuer(&[cfg.issuer.as_str()]);
        validation.set_audience(&[cfg.audience.as_str()]);

        JwtHs256Codec {
            encoding_key: EncodingKey::from_secret(cfg.signing_key.expose()),
            decoding_key: DecodingKey::from_secret(cfg.signing_key.expose()),
            validation,
            cfg,
            clock,
        }
    }

    #[inline]
    fn access_ttl_secs(&self) -> i64 {
        self.cfg.access_ttl.as_secs() as i64
    }
}

impl TokenCodec for JwtHs256Codec {
    fn issue_access_token(
        &self,
        user_id: UserId,
        role: Role,
    ) -> Result<IssuedAccessToken, TokenError> {
        let token_id = TokenId::new_random();
        let iat = self.clock.now().timestamp();
        let exp = iat + self.access_ttl_secs();
        let claims = AccessClaims {
            sub: user_id.to_string(),
            role,
            jti: token_id.0.clone(),
            iss: self.cfg.issuer.clone(),
            aud: self.cfg.audience.clone(),
            iat,
            exp,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        Ok(IssuedAccessToken {
            token: AccessToken(token),
            token_id,
            expires_in_secs: self.access_ttl_secs(),
            expires_at: from_timestamp(exp)?,
        })
    }

    fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, TokenError> {
        let claims = decode::<AccessClaims>(token, &self.decoding_key, &self.validation)
            .map_err(decode_error)?
            .claims;

        if claims.exp <= self.clock.now().timestamp() {
            return Err(TokenError::Expired);
        }
        let subject = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| TokenError::Malformed)?;
        if claims.jti.is_empty() {
            return Err(TokenError::Malformed);
        }

        Ok(AccessTokenClaims {
            subject,
            role: claims.role,
            token_id: TokenId(claims.jti),
            issuer: claims.iss,
            audience: claims.aud,
            issued_at: from_timestamp(claims.iat)?,
            expires_at: from_timestamp(claims.exp)?,
        })
    }

    fn remaining_lifetime(&self, claims: &AccessTokenClaims) -> Duration {
        // negative once expired, which to_std refuses
        (claims.expires_at - self.clock.now())
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}
