use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use std::sync::atomic::{AtomicI64, Ordering};

/// In-process member directory for development and tests.
#[derive(Default)]
pub struct MemoryUserRepo {
    users: DashMap<UserId, User>,
    by_email: DashMap<String, UserId>,
    next_id: AtomicI64,
}

impl MemoryUserRepo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member with an already-hashed password and returns it.
    pub fn insert(
        &self,
        email: &str,
        password_hash: String,
        nickname: &str,
        role: Role,
    ) -> Result<User, AuthError> {
        let email = email.trim().to_lowercase();
        let slot = match self.by_email.entry(email.clone()) {
            Entry::Occupied(_) => {
                return Err(AuthError::Repository(format!("duplicate email: {}", email)));
            }
            Entry::Vacant(slot) => slot,
        };
        let id = UserId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let user = User {
            id,
            email,
            password_hash,
            nickname: nickname.to_string(),
            role,
            created_at: Utc::now(),
        };
        self.users.insert(id, user.clone());
        slot.insert(id);
        Ok(user)
    }

    pub fn remove(&self, user_id: UserId) -> Option<User> {
        let (_, user) = self.users.remove(&user_id)?;
        self.by_email.remove(&user.email);
        Some(user)
    }
}

#[async_trait::async_trait]
impl UserRepo for MemoryUserRepo {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AuthError> {
        let email = email.trim().to_lowercase();
        let Some(id) = self.by_email.get(&email).map(|entry| *entry) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|entry| entry.clone()))
    }

    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, AuthError> {
        Ok(self.users.get(&user_id).map(|entry| entry.clone()))
    }
}
