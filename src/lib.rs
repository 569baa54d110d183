//! PostgreSQL persistence for OAuth2/OIDC clients, scopes, consents and tokens.
//!
//! The workspace crates are re-exported here so consumers can depend on a
//! single package.

pub use oauth2_config::{Config, DatabaseConfig, LoggingConfig};
pub use oauth2_core::*;
pub use oauth2_observability::{init_telemetry, ObservedStore};
pub use oauth2_ports::*;
pub use oauth2_storage_factory::{connect, create_stores, from_config, healthcheck, Stores};
pub use oauth2_storage_sqlx::{
    initialize_schema, PgAuthorizationCodeStore, PgClientStore, PgConsentStore, PgPool,
    PgRefreshTokenStore, PgScopeStore, PgTokenHandleStore, PgTokenStore, Schema,
};

/// Service name reported by the bootstrap binary's logs.
pub const SERVICE_NAME: &str = "oauth2-pg-store";
