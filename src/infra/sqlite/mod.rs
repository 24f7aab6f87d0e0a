//! SQLite implementations of the storage traits

mod credential_store;
mod pet_store;

pub use credential_store::SqliteCredentialStore;
pub use pet_store::SqlitePetStore;
