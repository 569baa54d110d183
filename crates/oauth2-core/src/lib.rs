//! Framework-agnostic domain types for the OAuth2 PostgreSQL store.
//!
//! Clients, scopes, consents and the token payloads live here so that the
//! storage adapter, the port traits and any consumer share one vocabulary
//! without depending on a database driver.

pub mod models;

pub use models::*;
