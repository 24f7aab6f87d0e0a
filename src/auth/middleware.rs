//! Authentication middleware for Axum
//!
//! Resolves the route's access requirement from the policy table, verifies
//! bearer tokens, and attaches an explicit [`Principal`] to the request
//! extensions. There is no ambient security context; handlers extract the
//! principal themselves.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::{IntoResponse, Response},
};
use chrono::Utc;

use super::policy::{required_access, RouteAccess};
use super::{Principal, TokenCodec, TokenError};
use crate::api::{ApiError, ErrorCode};

/// Principal extension for request
#[derive(Clone)]
pub struct PrincipalExt(pub Principal);

/// Authentication middleware configuration/state.
#[derive(Clone)]
pub struct AuthState {
    pub codec: Arc<TokenCodec>,
}

/// Authentication middleware
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let access = required_access(request.method().as_str(), request.uri().path());
    if access == RouteAccess::Public {
        return next.run(request).await;
    }

    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    let Some(token) = auth_header.and_then(bearer_token) else {
        return ApiError::new(ErrorCode::AuthRequired, "Missing bearer token").into_response();
    };

    let principal = match state.codec.verify(token, Utc::now()) {
        Ok(claims) => Principal {
            username: claims.sub,
            roles: claims.roles,
        },
        Err(e) => return token_error_response(e),
    };

    if let RouteAccess::AnyRole(required) = access {
        if !required.iter().any(|role| principal.has_role(role)) {
            return ApiError::new(
                ErrorCode::InsufficientRole,
                "Insufficient role for this operation",
            )
            .into_response();
        }
    }

    request.extensions_mut().insert(PrincipalExt(principal));
    next.run(request).await
}

fn bearer_token(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

/// Convert a token error to an HTTP response
fn token_error_response(error: TokenError) -> Response {
    let code = match error {
        TokenError::Expired => ErrorCode::TokenExpired,
        TokenError::Malformed | TokenError::BadSignature => ErrorCode::InvalidToken,
    };
    ApiError::new(code, error.to_string()).into_response()
}
