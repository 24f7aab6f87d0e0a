//! Access policy
//!
//! Record-level checks are pure functions over a [`Principal`]; route-level
//! requirements are a declarative table consulted by [`required_access`],
//! the single gating lookup used by the middleware.

use super::Principal;
use crate::domain::{ROLE_ADMIN, ROLE_USER};

/// Check whether the actor may modify or delete a record owned by `owner_username`.
///
/// Owners manage their own records; admins manage everything.
pub fn can_manage(actor: &Principal, owner_username: &str) -> bool {
    actor.is_admin() || actor.username == owner_username
}

/// Check whether the actor may view records across all owners.
pub fn can_view_all(actor: &Principal) -> bool {
    actor.is_admin()
}

/// Access requirement for a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAccess {
    /// No token required
    Public,
    /// Any valid token
    Authenticated,
    /// A valid token holding at least one of the listed roles
    AnyRole(&'static [&'static str]),
}

/// Route-level access requirements.
///
/// Entries are matched top to bottom; static segments must precede
/// parameterized ones for overlapping paths (`/pets/all` vs `/pets/:id`).
const ROUTE_POLICIES: &[(&str, &str, RouteAccess)] = &[
    ("POST", "/auth/register", RouteAccess::Public),
    ("POST", "/auth/login", RouteAccess::Public),
    ("GET", "/health", RouteAccess::Public),
    ("GET", "/ready", RouteAccess::Public),
    ("GET", "/pets/all", RouteAccess::AnyRole(&[ROLE_ADMIN])),
    ("GET", "/pets", RouteAccess::AnyRole(&[ROLE_USER, ROLE_ADMIN])),
    ("POST", "/pets", RouteAccess::AnyRole(&[ROLE_USER])),
    ("PUT", "/pets/:id", RouteAccess::AnyRole(&[ROLE_USER])),
    ("DELETE", "/pets/:id", RouteAccess::AnyRole(&[ROLE_USER])),
    ("GET", "/users/all", RouteAccess::AnyRole(&[ROLE_ADMIN])),
    ("GET", "/users/:username", RouteAccess::Authenticated),
];

/// Look up the access requirement for a request.
///
/// Routes not listed in the table require authentication.
pub fn required_access(method: &str, path: &str) -> RouteAccess {
    for (route_method, pattern, access) in ROUTE_POLICIES {
        if *route_method == method && pattern_matches(pattern, path) {
            return *access;
        }
    }
    RouteAccess::Authenticated
}

/// Match a path against a pattern where `:name` segments match any one segment.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let mut pattern_segments = pattern.trim_matches('/').split('/');
    let mut path_segments = path.trim_matches('/').split('/');

    loop {
        match (pattern_segments.next(), path_segments.next()) {
            (Some(p), Some(s)) => {
                if !p.starts_with(':') && p != s {
                    return false;
                }
                if s.is_empty() {
                    return false;
                }
            }
            (None, None) => return true,
            _ => return false,
        }
    }
}
