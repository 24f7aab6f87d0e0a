//! Authentication and authorization for Petfolio
//!
//! # Authentication
//!
//! Bearer JWTs signed with an HMAC secret (`JWT_SECRET`). Tokens carry the
//! username, the role list granted at issue time, and issue/expiry timestamps.
//! Roles are read from the token until it expires; role changes take effect
//! on the next login.
//!
//! # Authorization Model
//!
//! - `ROLE_USER`: granted to every registered account; required for pet writes
//! - `ROLE_ADMIN`: may view and manage every pet and list all users
//!
//! Route-level requirements live in a declarative table in [`policy`];
//! record-level ownership checks use [`policy::can_manage`].
//!
//! # Configuration
//!
//! - `JWT_SECRET`: HMAC secret for token signing (required)
//! - `TOKEN_TTL_SECS`: token lifetime, default 3600
//! - `ADMIN_PASSWORD`: password for the seeded admin account

mod middleware;
pub mod policy;
mod service;
mod token;

pub use middleware::*;
pub use service::*;
pub use token::*;

use crate::domain::ROLE_ADMIN;

/// Identity extracted from a verified request token.
#[derive(Debug, Clone)]
pub struct Principal {
    /// Username from the token subject
    pub username: String,

    /// Roles granted when the token was issued
    pub roles: Vec<String>,
}

impl Principal {
    /// Check whether this principal holds a specific role
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }

    /// Check whether this principal holds the admin role
    pub fn is_admin(&self) -> bool {
        self.has_role(ROLE_ADMIN)
    }
}

/// Authentication error
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("username already exists")]
    DuplicateUsername,

    #[error("default role is not configured")]
    MissingDefaultRole,

    #[error("password hashing failed: {0}")]
    PasswordHash(String),

    #[error(transparent)]
    Token(#[from] TokenError),

    #[error(transparent)]
    Store(#[from] crate::infra::StoreError),
}
