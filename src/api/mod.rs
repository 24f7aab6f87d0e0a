//! API layer for Petfolio
//!
//! REST endpoints, request/response types, and structured error responses.

mod error;
mod rest;
mod types;

pub use error::*;
pub use rest::*;
pub use types::*;
