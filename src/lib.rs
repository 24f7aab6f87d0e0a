//! Petfolio backend library
//!
//! JWT-authenticated CRUD backend for user-owned pet records with
//! role-based access control.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (users, roles, pets)
//! - [`auth`] - Authentication (token codec, auth service, access policy, middleware)
//! - [`infra`] - Infrastructure implementations (SQLite stores, caching)
//! - [`api`] - REST API routes and error responses
//! - [`server`] - Configuration and HTTP server bootstrap

pub mod api;
pub mod auth;
pub mod domain;
pub mod infra;
pub mod migrations;
pub mod server;

// Re-export commonly used types
pub use auth::{AuthError, AuthService, AuthSession, Principal, TokenCodec, TokenError};
pub use domain::{Pet, UserRecord, ROLE_ADMIN, ROLE_USER};
pub use infra::{CredentialStore, PetStore, Result, StoreError};
