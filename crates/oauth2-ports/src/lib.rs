//! Integration ports for the OAuth2 store.
//!
//! Implement these traits in your own crate to plug in custom persistence
//! without forking. The PostgreSQL adapter lives in `oauth2-storage-sqlx`.

pub mod storage;

pub use storage::*;
