//! PostgreSQL storage adapter built on SQLx.
//!
//! Every store takes a shared [`PgPool`] and a [`Schema`]; token stores also
//! take the client and scope stores their documents reference.

pub mod bootstrap;
pub mod client;
pub mod codec;
pub mod consent;
pub mod preconditions;
pub mod schema;
pub mod scope;
pub mod token;
pub mod transaction;

pub use bootstrap::initialize_schema;
pub use client::PgClientStore;
pub use codec::{ReferenceCodec, TokenPayload};
pub use consent::PgConsentStore;
pub use schema::Schema;
pub use scope::PgScopeStore;
pub use sqlx::PgPool;
pub use token::{
    PgAuthorizationCodeStore, PgRefreshTokenStore, PgTokenHandleStore, PgTokenStore, TokenRow,
};
