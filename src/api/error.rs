//! Structured API error responses with error codes
//!
//! This module provides consistent error handling across all API endpoints
//! with machine-readable error codes and human-readable messages.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::auth::{AuthError, TokenError};
use crate::infra::StoreError;

// ============================================================================
// Error Codes
// ============================================================================

/// Error codes for API responses
///
/// These codes are stable and can be used by clients for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Authentication errors (1xxx)
    /// No bearer token provided
    AuthRequired,
    /// Malformed token or bad signature
    InvalidToken,
    /// Token has expired
    TokenExpired,
    /// Unknown username or wrong password
    InvalidCredentials,
    /// Token lacks a required role
    InsufficientRole,
    /// Caller may not act on this record
    OwnershipRequired,

    // Validation errors (3xxx)
    /// Request body is malformed
    InvalidRequestBody,
    /// Field value is invalid
    InvalidFieldValue,

    // Resource errors (4xxx)
    /// Requested resource not found
    ResourceNotFound,
    /// User not found
    UserNotFound,
    /// Pet not found
    PetNotFound,

    // Conflict errors (5xxx)
    /// Username already registered
    UsernameTaken,

    // Infrastructure errors (8xxx)
    /// Database operation failed
    DatabaseError,
    /// Internal server error
    InternalError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn numeric_code(&self) -> u32 {
        match self {
            // Auth (1xxx)
            ErrorCode::AuthRequired => 1001,
            ErrorCode::InvalidToken => 1002,
            ErrorCode::TokenExpired => 1003,
            ErrorCode::InvalidCredentials => 1004,
            ErrorCode::InsufficientRole => 1005,
            ErrorCode::OwnershipRequired => 1006,

            // Validation (3xxx)
            ErrorCode::InvalidRequestBody => 3001,
            ErrorCode::InvalidFieldValue => 3002,

            // Resource (4xxx)
            ErrorCode::ResourceNotFound => 4001,
            ErrorCode::UserNotFound => 4002,
            ErrorCode::PetNotFound => 4003,

            // Conflict (5xxx)
            ErrorCode::UsernameTaken => 5001,

            // Infrastructure (8xxx)
            ErrorCode::DatabaseError => 8001,
            ErrorCode::InternalError => 8999,
        }
    }

    /// Get the HTTP status code for this error
    pub fn http_status(&self) -> StatusCode {
        match self {
            // Auth errors -> 401/403
            ErrorCode::AuthRequired => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidToken => StatusCode::UNAUTHORIZED,
            ErrorCode::TokenExpired => StatusCode::UNAUTHORIZED,
            ErrorCode::InvalidCredentials => StatusCode::UNAUTHORIZED,
            ErrorCode::InsufficientRole => StatusCode::FORBIDDEN,
            ErrorCode::OwnershipRequired => StatusCode::FORBIDDEN,

            // Validation -> 400
            ErrorCode::InvalidRequestBody => StatusCode::BAD_REQUEST,
            ErrorCode::InvalidFieldValue => StatusCode::BAD_REQUEST,

            // Resource -> 404
            ErrorCode::ResourceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::UserNotFound => StatusCode::NOT_FOUND,
            ErrorCode::PetNotFound => StatusCode::NOT_FOUND,

            // Conflict -> 409
            ErrorCode::UsernameTaken => StatusCode::CONFLICT,

            // Infrastructure -> 500
            ErrorCode::DatabaseError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code_str = match self {
            ErrorCode::AuthRequired => "AUTH_REQUIRED",
            ErrorCode::InvalidToken => "INVALID_TOKEN",
            ErrorCode::TokenExpired => "TOKEN_EXPIRED",
            ErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ErrorCode::InsufficientRole => "INSUFFICIENT_ROLE",
            ErrorCode::OwnershipRequired => "OWNERSHIP_REQUIRED",
            ErrorCode::InvalidRequestBody => "INVALID_REQUEST_BODY",
            ErrorCode::InvalidFieldValue => "INVALID_FIELD_VALUE",
            ErrorCode::ResourceNotFound => "RESOURCE_NOT_FOUND",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::PetNotFound => "PET_NOT_FOUND",
            ErrorCode::UsernameTaken => "USERNAME_TAKEN",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", code_str)
    }
}

// ============================================================================
// Structured Error Response
// ============================================================================

/// Structured error response for API endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    /// Error details
    pub error: ErrorDetails,
}

/// Detailed error information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorDetails {
    /// Machine-readable error code
    pub code: ErrorCode,

    /// Numeric error code for easy categorization
    pub numeric_code: u32,

    /// Human-readable error message
    pub message: String,

    /// Additional error details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,

    /// Related resource ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
}

impl ApiError {
    /// Create a new API error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            error: ErrorDetails {
                code,
                numeric_code: code.numeric_code(),
                message: message.into(),
                details: None,
                resource_id: None,
            },
        }
    }

    /// Set additional details
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.error.details = Some(details);
        self
    }

    /// Set related resource ID
    pub fn with_resource_id(mut self, id: impl Into<String>) -> Self {
        self.error.resource_id = Some(id.into());
        self
    }

    /// Get the HTTP status code
    pub fn status(&self) -> StatusCode {
        self.error.code.http_status()
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code_str = self.error.code.to_string();
        let mut response = (status, Json(self)).into_response();

        // Add error code header for easier debugging
        if let Ok(code_value) = axum::http::HeaderValue::from_str(&code_str) {
            response.headers_mut().insert(
                axum::http::header::HeaderName::from_static("x-error-code"),
                code_value,
            );
        }

        response
    }
}

// ============================================================================
// Conversions from layer errors
// ============================================================================

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Database(e) => {
                ApiError::new(ErrorCode::DatabaseError, format!("Database error: {}", e))
            }
            StoreError::Duplicate(_) => {
                ApiError::new(ErrorCode::UsernameTaken, "Username already exists")
            }
            StoreError::UserNotFound(username) => {
                ApiError::new(ErrorCode::UserNotFound, format!("User not found: {}", username))
                    .with_resource_id(username)
            }
            StoreError::RoleNotFound(role) => ApiError::new(
                ErrorCode::InternalError,
                format!("Role is not configured: {}", role),
            ),
            StoreError::PetNotFound(id) => {
                ApiError::new(ErrorCode::PetNotFound, format!("Pet not found: {}", id))
                    .with_resource_id(id.to_string())
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        let code = match err {
            TokenError::Expired => ErrorCode::TokenExpired,
            TokenError::Malformed | TokenError::BadSignature => ErrorCode::InvalidToken,
        };
        ApiError::new(code, err.to_string())
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            // One message for unknown-user and wrong-password
            AuthError::InvalidCredentials => ApiError::new(
                ErrorCode::InvalidCredentials,
                "Invalid username or password",
            ),
            AuthError::DuplicateUsername => {
                ApiError::new(ErrorCode::UsernameTaken, "Username already exists")
            }
            AuthError::MissingDefaultRole => ApiError::new(
                ErrorCode::InternalError,
                "Default role is not configured",
            ),
            AuthError::PasswordHash(msg) => ApiError::new(
                ErrorCode::InternalError,
                format!("Password hashing failed: {}", msg),
            ),
            AuthError::Token(e) => e.into(),
            AuthError::Store(e) => e.into(),
        }
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Create a not found error for a specific resource type
pub fn not_found(resource_type: &str, id: impl std::fmt::Display) -> ApiError {
    let code = match resource_type {
        "Pet" => ErrorCode::PetNotFound,
        "User" => ErrorCode::UserNotFound,
        _ => ErrorCode::ResourceNotFound,
    };
    ApiError::new(code, format!("{} not found: {}", resource_type, id))
        .with_resource_id(id.to_string())
}

/// Create a validation error with field details
pub fn validation_error(field: &str, message: impl Into<String>) -> ApiError {
    ApiError::new(ErrorCode::InvalidFieldValue, message.into())
        .with_details(serde_json::json!({ "field": field }))
}

/// Create a forbidden error for ownership violations
pub fn forbidden(message: impl Into<String>) -> ApiError {
    ApiError::new(ErrorCode::OwnershipRequired, message.into())
}

// ============================================================================
// Tests
// ============================================================================
