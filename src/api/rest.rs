//! REST API endpoints for Petfolio.

use axum::extract::{Extension, Path, State};
use axum::http::StatusCode;
use axum::routing::{get, post, put};
use axum::{Json, Router};

use super::error::{forbidden, not_found, validation_error, ApiError};
use super::types::{
    AuthResponse, LoginRequest, PetRequest, PetResponse, RegisterRequest, UserResponse,
};
use crate::auth::{policy, AuthSession, Principal, PrincipalExt};
use crate::domain::{NewPet, PetUpdate};
use crate::infra::{owner_key, CredentialStore, PetStore, ALL_KEY};
use crate::server::AppState;

/// Build the application router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/pets", get(list_pets).post(create_pet))
        .route("/pets/all", get(list_all_pets))
        .route("/pets/:id", put(update_pet).delete(delete_pet))
        .route("/users/all", get(list_users))
        .route("/users/:username", get(get_user))
}

fn validate_credentials(username: &str, password: &str) -> Result<(), ApiError> {
    if username.trim().is_empty() {
        return Err(validation_error("username", "username must not be blank"));
    }
    if password.is_empty() {
        return Err(validation_error("password", "password must not be blank"));
    }
    Ok(())
}

fn validate_pet(request: &PetRequest) -> Result<(), ApiError> {
    if request.name.trim().is_empty() {
        return Err(validation_error("name", "name must not be blank"));
    }
    if request.kind.trim().is_empty() {
        return Err(validation_error("kind", "kind must not be blank"));
    }
    if request.age < 0 {
        return Err(validation_error("age", "age must not be negative"));
    }
    Ok(())
}

fn session_response(session: AuthSession) -> AuthResponse {
    AuthResponse {
        username: session.username,
        token: session.token,
        roles: session.roles,
    }
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    validate_credentials(&request.username, &request.password)?;

    let session = state.auth.register(&request.username, &request.password).await?;
    state.user_listings.clear().await;

    tracing::info!(username = %session.username, "registered new account");
    Ok((StatusCode::CREATED, Json(session_response(session))))
}

async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    validate_credentials(&request.username, &request.password)?;

    let session = state.auth.login(&request.username, &request.password).await?;
    Ok(Json(session_response(session)))
}

async fn create_pet(
    State(state): State<AppState>,
    Extension(PrincipalExt(principal)): Extension<PrincipalExt>,
    Json(request): Json<PetRequest>,
) -> Result<(StatusCode, Json<PetResponse>), ApiError> {
    validate_pet(&request)?;

    let pet = state
        .pets
        .insert(NewPet {
            name: request.name,
            kind: request.kind,
            age: request.age,
            owner_username: principal.username.clone(),
        })
        .await?;
    state.pet_listings.clear().await;

    Ok((StatusCode::CREATED, Json(pet.into())))
}

/// Caller's pets; admins see every pet.
async fn list_pets(
    State(state): State<AppState>,
    Extension(PrincipalExt(principal)): Extension<PrincipalExt>,
) -> Result<Json<Vec<PetResponse>>, ApiError> {
    let (key, view_all) = if policy::can_view_all(&principal) {
        (ALL_KEY.to_string(), true)
    } else {
        (owner_key(&principal.username), false)
    };

    if let Some(pets) = state.pet_listings.get(&key).await {
        return Ok(Json(pets.into_iter().map(Into::into).collect()));
    }

    let pets = if view_all {
        state.pets.list_all().await?
    } else {
        state.pets.list_by_owner(&principal.username).await?
    };
    state.pet_listings.insert(key, pets.clone()).await;

    Ok(Json(pets.into_iter().map(Into::into).collect()))
}

/// Every pet; the route table restricts this to admins.
async fn list_all_pets(
    State(state): State<AppState>,
    Extension(PrincipalExt(principal)): Extension<PrincipalExt>,
) -> Result<Json<Vec<PetResponse>>, ApiError> {
    if !policy::can_view_all(&principal) {
        return Err(forbidden("Admin role required"));
    }

    if let Some(pets) = state.pet_listings.get(ALL_KEY).await {
        return Ok(Json(pets.into_iter().map(Into::into).collect()));
    }

    let pets = state.pets.list_all().await?;
    state.pet_listings.insert(ALL_KEY, pets.clone()).await;

    Ok(Json(pets.into_iter().map(Into::into).collect()))
}

async fn update_pet(
    State(state): State<AppState>,
    Extension(PrincipalExt(principal)): Extension<PrincipalExt>,
    Path(id): Path<i64>,
    Json(request): Json<PetRequest>,
) -> Result<Json<PetResponse>, ApiError> {
    validate_pet(&request)?;
    ensure_manages(&state, &principal, id).await?;

    let updated = state
        .pets
        .update(
            id,
            PetUpdate {
                name: request.name,
                kind: request.kind,
                age: request.age,
            },
        )
        .await?;
    state.pet_listings.clear().await;

    Ok(Json(updated.into()))
}

async fn delete_pet(
    State(state): State<AppState>,
    Extension(PrincipalExt(principal)): Extension<PrincipalExt>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    ensure_manages(&state, &principal, id).await?;

    state.pets.delete(id).await?;
    state.pet_listings.clear().await;

    Ok(StatusCode::NO_CONTENT)
}

/// 404 for unknown pets, 403 unless the principal owns the pet or is admin.
async fn ensure_manages(state: &AppState, principal: &Principal, id: i64) -> Result<(), ApiError> {
    let pet = state.pets.get(id).await?.ok_or_else(|| not_found("Pet", id))?;
    if !policy::can_manage(principal, &pet.owner_username) {
        return Err(forbidden("You do not own this pet"));
    }
    Ok(())
}

/// Every user; the route table restricts this to admins.
async fn list_users(
    State(state): State<AppState>,
    Extension(PrincipalExt(principal)): Extension<PrincipalExt>,
) -> Result<Json<Vec<UserResponse>>, ApiError> {
    if !policy::can_view_all(&principal) {
        return Err(forbidden("Admin role required"));
    }

    if let Some(users) = state.user_listings.get(ALL_KEY).await {
        return Ok(Json(users.into_iter().map(Into::into).collect()));
    }

    let users = state.credentials.list_users().await?;
    state.user_listings.insert(ALL_KEY, users.clone()).await;

    Ok(Json(users.into_iter().map(Into::into).collect()))
}

/// A single user: self or admin.
async fn get_user(
    State(state): State<AppState>,
    Extension(PrincipalExt(principal)): Extension<PrincipalExt>,
    Path(username): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    if !policy::can_manage(&principal, &username) {
        return Err(forbidden("You may only view your own account"));
    }

    let record = state
        .credentials
        .find_by_username(&username)
        .await?
        .ok_or_else(|| not_found("User", &username))?;

    Ok(Json(UserResponse {
        id: record.id,
        username: record.username,
        roles: record.roles,
    }))
}
