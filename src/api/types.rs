//! Request and response types for the REST API

use serde::{Deserialize, Serialize};

use crate::domain::{Pet, UserRecord};

/// Registration request body
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Login request body
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Session response for register and login
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub username: String,
    pub token: String,
    pub roles: Vec<String>,
}

/// Pet create/update request body
#[derive(Debug, Deserialize)]
pub struct PetRequest {
    pub name: String,
    pub kind: String,
    pub age: i64,
}

/// Pet response body
#[derive(Debug, Serialize, Deserialize)]
pub struct PetResponse {
    pub id: i64,
    pub name: String,
    pub kind: String,
    pub age: i64,
    pub owner_username: String,
}

impl From<Pet> for PetResponse {
    fn from(pet: Pet) -> Self {
        Self {
            id: pet.id,
            name: pet.name,
            kind: pet.kind,
            age: pet.age,
            owner_username: pet.owner_username,
        }
    }
}

/// User response body
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
    pub roles: Vec<String>,
}

impl From<UserRecord> for UserResponse {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            username: user.username,
            roles: user.roles,
        }
    }
}
