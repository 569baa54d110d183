//! Pool construction and store wiring.
//!
//! Collaborators are passed explicitly: the token stores receive the same
//! (observed) client and scope stores that callers use, and every store is
//! wrapped with `ObservedStore` for tracing.

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;

use oauth2_config::DatabaseConfig;
use oauth2_core::{StoreError, StoreResult};
use oauth2_storage_sqlx::{
    PgAuthorizationCodeStore, PgClientStore, PgConsentStore, PgPool, PgRefreshTokenStore,
    PgScopeStore, PgTokenHandleStore, Schema,
};

pub use oauth2_observability::ObservedStore;
pub use oauth2_ports::{
    DynAuthorizationCodeStore, DynClientStore, DynConsentStore, DynRefreshTokenStore,
    DynScopeStore, DynTokenHandleStore,
};

/// Value of the `db_system` span field.
pub const DB_SYSTEM: &str = "postgresql";

/// Every store, sharing one pool and schema.
#[derive(Clone)]
pub struct Stores {
    pub clients: DynClientStore,
    pub scopes: DynScopeStore,
    pub consents: DynConsentStore,
    pub authorization_codes: DynAuthorizationCodeStore,
    pub token_handles: DynTokenHandleStore,
    pub refresh_tokens: DynRefreshTokenStore,
}

fn is_postgres_url(url: &str) -> bool {
    url.starts_with("postgres://") || url.starts_with("postgresql://")
}

/// Build a lazily connecting pool; no connection is opened until first use.
pub fn connect(config: &DatabaseConfig) -> StoreResult<PgPool> {
    if !is_postgres_url(&config.url) {
        return Err(StoreError::configuration(
            "database.url must use the postgres:// or postgresql:// scheme",
        ));
    }

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout())
        .connect_lazy(&config.url)?;
    Ok(pool)
}

/// Wire all stores over `pool`, each wrapped for tracing.
pub fn create_stores(pool: PgPool, schema: Schema) -> Stores {
    let clients: DynClientStore = Arc::new(ObservedStore::new(
        Arc::new(PgClientStore::new(pool.clone(), schema.clone())),
        DB_SYSTEM,
    ));
    let scopes: DynScopeStore = Arc::new(ObservedStore::new(
        Arc::new(PgScopeStore::new(pool.clone(), schema.clone())),
        DB_SYSTEM,
    ));
    let consents: DynConsentStore = Arc::new(ObservedStore::new(
        Arc::new(PgConsentStore::new(pool.clone(), schema.clone())),
        DB_SYSTEM,
    ));

    let authorization_codes: DynAuthorizationCodeStore = Arc::new(ObservedStore::new(
        Arc::new(PgAuthorizationCodeStore::new(
            pool.clone(),
            schema.clone(),
            clients.clone(),
            scopes.clone(),
        )),
        DB_SYSTEM,
    ));
    let token_handles: DynTokenHandleStore = Arc::new(ObservedStore::new(
        Arc::new(PgTokenHandleStore::new(
            pool.clone(),
            schema.clone(),
            clients.clone(),
            scopes.clone(),
        )),
        DB_SYSTEM,
    ));
    let refresh_tokens: DynRefreshTokenStore = Arc::new(ObservedStore::new(
        Arc::new(PgRefreshTokenStore::new(
            pool,
            schema,
            clients.clone(),
            scopes.clone(),
        )),
        DB_SYSTEM,
    ));

    Stores {
        clients,
        scopes,
        consents,
        authorization_codes,
        token_handles,
        refresh_tokens,
    }
}

/// Pool and stores from configuration.
pub fn from_config(config: &DatabaseConfig) -> StoreResult<(PgPool, Stores)> {
    let schema = Schema::new(config.schema.as_str())?;
    let pool = connect(config)?;
    let stores = create_stores(pool.clone(), schema);
    Ok((pool, stores))
}

/// Keep readiness/liveness cheap: don't run bootstrap.
pub async fn healthcheck(pool: &PgPool) -> StoreResult<()> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Create the schema and all tables, then verify the connection.
pub async fn initialize(config: &DatabaseConfig) -> StoreResult<PgPool> {
    let schema = Schema::new(config.schema.as_str())?;
    let pool = connect(config)?;

    oauth2_storage_sqlx::initialize_schema(&pool, &schema).await?;
    healthcheck(&pool).await?;

    tracing::info!(schema = %schema, "storage ready");
    Ok(pool)
}
