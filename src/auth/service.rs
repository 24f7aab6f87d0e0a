//! Registration and login
//!
//! Passwords are stored as Argon2 PHC strings. Login failures for unknown
//! usernames and wrong passwords are indistinguishable to the caller.

use std::sync::Arc;

use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use chrono::Utc;
use password_hash::{PasswordHash, SaltString};

use super::{AuthError, TokenCodec};
use crate::domain::ROLE_USER;
use crate::infra::{CredentialStore, StoreError};

/// Outcome of a successful registration or login.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub username: String,
    pub token: String,
    pub roles: Vec<String>,
}

/// Authentication service over a credential store.
pub struct AuthService<C> {
    store: Arc<C>,
    codec: Arc<TokenCodec>,
}

impl<C: CredentialStore> AuthService<C> {
    pub fn new(store: Arc<C>, codec: Arc<TokenCodec>) -> Self {
        Self { store, codec }
    }

    /// Register a new account with the default user role and return a session.
    ///
    /// The lookup is a fast path; the database unique constraint closes the
    /// race, and its violation also maps to `DuplicateUsername`.
    pub async fn register(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        if self.store.find_by_username(username).await?.is_some() {
            return Err(AuthError::DuplicateUsername);
        }

        let password_hash = hash_password(password)?;

        let user = match self.store.create_user(username, &password_hash, ROLE_USER).await {
            Ok(user) => user,
            Err(StoreError::Duplicate(_)) => return Err(AuthError::DuplicateUsername),
            Err(StoreError::RoleNotFound(_)) => return Err(AuthError::MissingDefaultRole),
            Err(e) => return Err(e.into()),
        };

        let token = self.codec.issue(&user.username, &user.roles, Utc::now())?;
        Ok(AuthSession {
            username: user.username,
            token,
            roles: user.roles,
        })
    }

    /// Verify credentials and return a session with the stored roles.
    pub async fn login(&self, username: &str, password: &str) -> Result<AuthSession, AuthError> {
        let Some(record) = self.store.find_by_username(username).await? else {
            return Err(AuthError::InvalidCredentials);
        };

        if !verify_password(&record.password_hash, password) {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.codec.issue(&record.username, &record.roles, Utc::now())?;
        Ok(AuthSession {
            username: record.username,
            token,
            roles: record.roles,
        })
    }
}

/// Hash a password into a PHC string with a fresh random salt.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let mut salt_bytes = [0u8; 16];
    getrandom::getrandom(&mut salt_bytes).map_err(|e| AuthError::PasswordHash(e.to_string()))?;
    let salt =
        SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::PasswordHash(e.to_string()))?;

    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AuthError::PasswordHash(e.to_string()))?
        .to_string();
    Ok(phc)
}

/// Verify a password against a stored PHC string.
pub fn verify_password(hash: &str, password: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
