//! Trait definitions for Petfolio storage

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::{CredentialRecord, NewPet, Pet, PetUpdate, UserRecord};

use super::Result;

/// Storage for user accounts and role assignments.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up a user with credentials and roles by username
    async fn find_by_username(&self, username: &str) -> Result<Option<CredentialRecord>>;

    /// Create a user with an initial role
    ///
    /// - Fails with `RoleNotFound` if the role is not configured
    /// - Fails with `Duplicate` if the username is taken
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<UserRecord>;

    /// Grant an additional role to an existing user
    async fn grant_role(&self, username: &str, role: &str) -> Result<()>;

    /// Create a role if it does not exist
    async fn ensure_role(&self, name: &str) -> Result<()>;

    /// List all users with their roles
    async fn list_users(&self) -> Result<Vec<UserRecord>>;
}

/// Storage for pet records.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PetStore: Send + Sync {
    /// Insert a pet for an existing owner
    async fn insert(&self, new_pet: NewPet) -> Result<Pet>;

    /// Read a pet by id
    async fn get(&self, id: i64) -> Result<Option<Pet>>;

    /// List pets owned by a user
    async fn list_by_owner(&self, owner_username: &str) -> Result<Vec<Pet>>;

    /// List all pets
    async fn list_all(&self) -> Result<Vec<Pet>>;

    /// Update a pet's mutable fields
    async fn update(&self, id: i64, update: PetUpdate) -> Result<Pet>;

    /// Delete a pet
    async fn delete(&self, id: i64) -> Result<()>;
}
