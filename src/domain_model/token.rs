use super::{Role, UnknownRole, User, UserId};
use chrono::{DateTime, Utc};
use nanoid::nanoid;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique per-access-token id (`jti`), used as the revocation key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenId(pub String);

impl TokenId {
    pub fn new_random() -> Self {
        TokenId(uuid::Uuid::new_v4().to_string())
    }
}

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const REFRESH_ID_LEN: usize = 32;

/// Opaque, unguessable refresh identifier handed to clients in a cookie.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct RefreshId(pub String);

impl RefreshId {
    pub fn new_random() -> Self {
        RefreshId(nanoid!(REFRESH_ID_LEN))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for RefreshId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("RefreshId(..)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PayloadError {
    #[error("expected `userId:role`")]
    Shape,
    #[error("invalid user id: {0}")]
    UserId(#[from] std::num::ParseIntError),
    #[error(transparent)]
    Role(#[from] UnknownRole),
}

/// Value stored under a refresh id: `userId:ROLE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshPayload {
    pub user_id: UserId,
    pub role: Role,
}

impl fmt::Display for RefreshPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.user_id, self.role)
    }
}

impl std::str::FromStr for RefreshPayload {
    type Err = PayloadError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(':');
        let (Some(user_id), Some(role), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(PayloadError::Shape);
        };
        Ok(RefreshPayload {
            user_id: user_id.parse()?,
            role: role.parse()?,
        })
    }
}

/// Verified contents of an access token. Never persisted server-side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessTokenClaims {
    pub subject: UserId,
    pub role: Role,
    pub token_id: TokenId,
    pub issuer: String,
    pub audience: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// The authenticated principal attached to a single request.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user: User,
    pub role: Role,
}

impl Identity {
    pub fn user_id(&self) -> UserId {
        self.user.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_parses_id_and_role() {
        let payload: RefreshPayload = "42:ADMIN".parse().unwrap();
        assert_eq!(payload.user_id, UserId(42));
        assert_eq!(payload.role, Role::Admin);
        assert_eq!(payload.to_string(), "42:ADMIN");
    }

    #[test]
    fn payload_rejects_malformed_values() {
        assert_eq!("42".parse::<RefreshPayload>(), Err(PayloadError::Shape));
        assert_eq!("42:USER:x".parse::<RefreshPayload>(), Err(PayloadError::Shape));
        assert!(matches!(
            "abc:USER".parse::<RefreshPayload>(),
            Err(PayloadError::UserId(_))
        ));
        assert!(matches!(
            "1:ROOT".parse::<RefreshPayload>(),
            Err(PayloadError::Role(_))
        ));
    }

    #[test]
    fn refresh_ids_are_long_and_distinct() {
        let a = RefreshId::new_random();
        let b = RefreshId::new_random();
        assert_eq!(a.as_str().len(), REFRESH_ID_LEN);
        assert_ne!(a, b);
        assert_eq!(format!("{:?}", a), "RefreshId(..)");
    }
}
