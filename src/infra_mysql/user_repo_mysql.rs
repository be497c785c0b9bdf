use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use sqlx::mysql::MySqlRow;
use sqlx::{MySqlPool, Row};

/// Reads members from the `users` table owned by the member service:
/// `id BIGINT`, `email`, `password_hash`, `nickname`, `role` (`USER`/`ADMIN`), `created_at`.
pub struct MySqlUserRepo {
    pool: MySqlPool,
}

impl MySqlUserRepo {
    pub fn new(pool: MySqlPool) -> Self {
        MySqlUserRepo { pool }
    }

    pub async fn ping(&self) -> Result<(), AuthError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(|e| AuthError::Repository(format!("ping: {e}")))
    }

    fn row_to_user(row: MySqlRow) -> Result<User, AuthError> {
        let id: i64 = row
            .try_get("id")
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        let email: String = row
            .try_get("email")
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        let password_hash: String = row
            .try_get("password_hash")
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        let nickname: String = row
            .try_get("nickname")
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        let role: String = row
            .try_get("role")
            .map_err(|e| AuthError::Repository(e.to_string()))?;
        let created_at: DateTime<Utc> = row
            .try_get("created_at")
            .map_err(|e| AuthError::Repository(e.to_string()))?;

        Ok(User {
            id: UserId(id),
            email,
            password_hash,
            nickname,
            role: role
                .parse::<Role>()
                .map_err(|e| AuthError::Repository(e.to_string()))?,
            created_at,
        })
    }
}

#[async_trait::async_trait]
impl UserRepo for MySqlUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, email, password_hash, nickname, role, created_at
FROM users
WHERE email = ?
"#,
        )
        .bind(email.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Repository(format!("query user by email: {e}")))?;

        row_opt.map(Self::row_to_user).transpose()
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        let row_opt: Option<MySqlRow> = sqlx::query(
            r#"
SELECT id, email, password_hash, nickname, role, created_at
FROM users
WHERE id = ?
"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Repository(format!("query user by id: {e}")))?;

        row_opt.map(Self::row_to_user).transpose()
    }
}
