//! Core domain types for Petfolio
//!
//! Users carry a set of named roles; pets belong to exactly one user.

/// Role granted to every registered user.
pub const ROLE_USER: &str = "ROLE_USER";

/// Role that grants management and visibility over all records.
pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// A pet record with its resolved owner username.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pet {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub age: i64,
    pub owner_username: String,
}

/// Fields required to create a pet.
#[derive(Debug, Clone)]
pub struct NewPet {
    pub name: String,
    pub kind: String,
    pub age: i64,
    pub owner_username: String,
}

/// Mutable pet fields for updates.
#[derive(Debug, Clone)]
pub struct PetUpdate {
    pub name: String,
    pub kind: String,
    pub age: i64,
}

/// A user as exposed to queries (no credentials).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub username: String,
    pub roles: Vec<String>,
}

/// A user with stored credentials, for authentication.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    pub id: i64,
    pub username: String,
    pub password_hash: String,
    pub roles: Vec<String>,
}
