use crate::application_port::*;
use crate::domain_model::*;

/// Read side of the external member store.
#[async_trait::async_trait]
pub trait UserRepo: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError>;

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError>;
}
