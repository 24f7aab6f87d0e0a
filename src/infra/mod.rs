//! Infrastructure layer for Petfolio
//!
//! Contains trait definitions and implementations for:
//! - Credential storage (users, roles)
//! - Pet storage
//! - Listing cache (in-memory, TTL, wholesale invalidation on writes)

mod cache;
mod error;
pub mod sqlite;
mod traits;

pub use cache::{owner_key, CacheStats, ListingCache, ALL_KEY};
pub use error::*;
pub use sqlite::{SqliteCredentialStore, SqlitePetStore};
pub use traits::*;
