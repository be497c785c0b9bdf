use crate::application_port::*;
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{self, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::sync::Arc;

/// Argon2id with the crate's default cost, producing PHC strings.
///
/// Hashing is CPU-bound, so every call runs on tokio's blocking pool. A decoy
/// hash made at construction lets lookups of unknown members pay the same cost
/// as a wrong password.
pub struct Argon2PasswordHasher {
    argon2: Argon2<'static>,
    decoy_hash: Arc<str>,
}

impl Argon2PasswordHasher {
    pub fn new() -> Result<Self, AuthError> {
        let argon2 = Argon2::default();
        let decoy_hash = phc_hash(&argon2, &nanoid::nanoid!())?;
        Ok(Argon2PasswordHasher {
            argon2,
            decoy_hash: decoy_hash.into(),
        })
    }

    async fn off_thread<T, F>(&self, work: F) -> Result<T, AuthError>
    where
        F: FnOnce(&Argon2<'static>) -> Result<T, AuthError> + Send + 'static,
        T: Send + 'static,
    {
        let argon2 = self.argon2.clone();
        tokio::task::spawn_blocking(move || work(&argon2))
            .await
            .map_err(|e| AuthError::InternalError(format!("hashing task failed: {e}")))?
    }
}

fn phc_hash(argon2: &Argon2<'_>, password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::InternalError(e.to_string()))
}

fn phc_verify(argon2: &Argon2<'_>, password: &str, phc: &str) -> Result<bool, AuthError> {
    let parsed = PasswordHash::new(phc)
        .map_err(|e| AuthError::InternalError(format!("invalid PHC hash: {e}")))?;

    match argon2.verify_password(password.as_bytes(), &parsed) {
        Ok(()) => Ok(true),
        Err(password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AuthError::InternalError(format!("verify error: {e}"))),
    }
}

#[async_trait::async_trait]
impl CredentialHasher for Argon2PasswordHasher {
    async fn hash_password(&self, password: &str) -> Result<String, AuthError> {
        let password = password.to_string();
        self.off_thread(move |argon2| phc_hash(argon2, &password))
            .await
    }

    async fn verify_password(
        &self,
        password: &str,
        password_hash: &str,
    ) -> Result<bool, AuthError> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();
        self.off_thread(move |argon2| phc_verify(argon2, &password, &password_hash))
            .await
    }

    async fn verify_decoy(&self, password: &str) {
        let password = password.to_string();
        let decoy_hash = self.decoy_hash.clone();
        let _ = self
            .off_thread(move |argon2| phc_verify(argon2, &password, &decoy_hash))
            .await;
    }
}
