//! Generic expiring token store.
//!
//! Authorization codes, token handles and refresh tokens share the `tokens`
//! table and this engine. Per-kind behavior is limited to the payload's
//! lifetime, its document shape and the kind's [`WritePolicy`].

use std::marker::PhantomData;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use oauth2_core::{
    AccessToken, AuthorizationCode, RefreshToken, StoreError, StoreResult, TokenType,
    WritePolicy,
};
use oauth2_ports::{DynClientStore, DynScopeStore, TokenStore};

use crate::codec::{ReferenceCodec, TokenPayload};
use crate::preconditions::{has_max_length, is_not_blank, is_short_string, MAX_SHORT_STRING};
use crate::schema::Schema;
use crate::transaction::execute;

pub type PgAuthorizationCodeStore = PgTokenStore<AuthorizationCode>;
pub type PgTokenHandleStore = PgTokenStore<AccessToken>;
pub type PgRefreshTokenStore = PgTokenStore<RefreshToken>;

/// A persisted `tokens` row.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct TokenRow {
    pub key: String,
    pub token_type: i16,
    pub subject: String,
    pub client: String,
    pub expiry: DateTime<Utc>,
    pub model: serde_json::Value,
}

impl TokenRow {
    /// Visible to `get` while `expiry >= now`.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expiry >= now
    }
}

pub(crate) fn create_table_statement(schema: &Schema) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\
            key text NOT NULL, \
            token_type smallint NOT NULL, \
            subject character varying(255) NOT NULL, \
            client character varying(255) NOT NULL, \
            expiry timestamp with time zone NOT NULL, \
            model jsonb NOT NULL, \
            CONSTRAINT pk_tokens_key_tokentype PRIMARY KEY (token_type, key)\
        ) WITH (OIDS = FALSE)",
        schema.table("tokens")
    )
}

pub(crate) fn create_index_statement(schema: &Schema) -> String {
    format!(
        "CREATE INDEX IF NOT EXISTS ix_tokens_subject_client_tokentype \
         ON {} USING btree (subject, client, token_type)",
        schema.table("tokens")
    )
}

struct TokenQueries {
    get: String,
    get_all: String,
    insert: String,
    renew: String,
    remove: String,
    revoke: String,
    create_table: String,
    create_index: String,
}

impl TokenQueries {
    fn new(schema: &Schema) -> Self {
        let table = schema.table("tokens");
        let columns = "key, token_type, subject, client, expiry, model";

        Self {
            get: format!("SELECT {columns} FROM {table} WHERE key = $1 AND token_type = $2"),
            get_all: format!(
                "SELECT {columns} FROM {table} WHERE subject = $1 AND token_type = $2"
            ),
            insert: format!(
                "INSERT INTO {table} ({columns}) VALUES ($1, $2, $3, $4, $5, $6)"
            ),
            // A live row only has its expiry moved. An expired row is
            // replaced by the new one. $7 is the caller's notion of now.
            renew: format!(
                "INSERT INTO {table} AS existing ({columns}) \
                 VALUES ($1, $2, $3, $4, $5, $6) \
                 ON CONFLICT (token_type, key) DO UPDATE SET \
                 subject = CASE WHEN existing.expiry >= $7 \
                     THEN existing.subject ELSE EXCLUDED.subject END, \
                 client = CASE WHEN existing.expiry >= $7 \
                     THEN existing.client ELSE EXCLUDED.client END, \
                 model = CASE WHEN existing.expiry >= $7 \
                     THEN existing.model ELSE EXCLUDED.model END, \
                 expiry = EXCLUDED.expiry"
            ),
            remove: format!("DELETE FROM {table} WHERE key = $1 AND token_type = $2"),
            revoke: format!(
                "DELETE FROM {table} WHERE subject = $1 AND client = $2 AND token_type = $3"
            ),
            create_table: create_table_statement(schema),
            create_index: create_index_statement(schema),
        }
    }
}

/// PostgreSQL store for one token kind, selected by `T`.
///
/// Decoding resolves embedded clients and scopes through the collaborator
/// stores handed to [`PgTokenStore::new`]. That happens after the row's
/// transaction has committed.
pub struct PgTokenStore<T> {
    pool: PgPool,
    schema: Schema,
    codec: ReferenceCodec,
    queries: TokenQueries,
    _payload: PhantomData<fn() -> T>,
}

impl<T: TokenPayload> PgTokenStore<T> {
    pub fn new(
        pool: PgPool,
        schema: Schema,
        clients: DynClientStore,
        scopes: DynScopeStore,
    ) -> Self {
        let queries = TokenQueries::new(&schema);
        Self {
            pool,
            schema,
            codec: ReferenceCodec::new(clients, scopes),
            queries,
            _payload: PhantomData,
        }
    }

    pub fn kind(&self) -> TokenType {
        T::KIND
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Builds the row for `value` with expiry `now + lifetime`.
    pub fn to_row(&self, key: &str, value: &T, now: DateTime<Utc>) -> StoreResult<TokenRow> {
        is_not_blank(key, "key")?;
        has_max_length(value.subject_id(), "subject", MAX_SHORT_STRING)?;
        is_short_string(value.client_id(), "client")?;

        Ok(TokenRow {
            key: key.to_string(),
            token_type: T::KIND.as_i16(),
            subject: value.subject_id().to_string(),
            client: value.client_id().to_string(),
            expiry: now + value.lifetime(),
            model: self.codec.encode(value)?,
        })
    }

    pub async fn from_row(&self, row: TokenRow) -> StoreResult<T> {
        self.codec.decode(row.model).await
    }

    /// Writes a full row. A duplicate `(token_type, key)` fails with the
    /// driver's unique-violation error.
    pub async fn insert(&self, row: &TokenRow) -> StoreResult<()> {
        self.write(&self.queries.insert, row).await
    }

    /// Inserts the row, or moves the expiry of a row still live at `now`.
    /// A row that expired before `now` is overwritten as a whole.
    async fn renew(&self, row: &TokenRow, now: DateTime<Utc>) -> StoreResult<()> {
        self.check_kind(row)?;

        let row = row.clone();
        execute(&self.pool, &self.queries.renew, move |conn, sql| {
            Box::pin(async move {
                sqlx::query(sql)
                    .bind(&row.key)
                    .bind(row.token_type)
                    .bind(&row.subject)
                    .bind(&row.client)
                    .bind(row.expiry)
                    .bind(&row.model)
                    .bind(now)
                    .execute(conn)
                    .await?;
                Ok(())
            })
        })
        .await
    }

    fn check_kind(&self, row: &TokenRow) -> StoreResult<()> {
        if row.token_type != T::KIND.as_i16() {
            return Err(StoreError::validation(
                "token_type",
                format!("row of type {} written to the {} store", row.token_type, T::KIND),
            ));
        }
        Ok(())
    }

    async fn write(&self, statement: &str, row: &TokenRow) -> StoreResult<()> {
        self.check_kind(row)?;

        let row = row.clone();
        execute(&self.pool, statement, move |conn, sql| {
            Box::pin(async move {
                sqlx::query(sql)
                    .bind(&row.key)
                    .bind(row.token_type)
                    .bind(&row.subject)
                    .bind(&row.client)
                    .bind(row.expiry)
                    .bind(&row.model)
                    .execute(conn)
                    .await?;
                Ok(())
            })
        })
        .await
    }

    /// Idempotent: creates the table and its lookup index if absent.
    pub async fn initialize_table(&self) -> StoreResult<()> {
        for statement in [&self.queries.create_table, &self.queries.create_index] {
            execute(&self.pool, statement, |conn, sql| {
                Box::pin(async move {
                    sqlx::query(sql).execute(conn).await?;
                    Ok(())
                })
            })
            .await?;
        }
        Ok(())
    }

    async fn fetch(&self, key: &str) -> StoreResult<Option<TokenRow>> {
        let key = key.to_string();
        let kind = T::KIND.as_i16();
        execute(&self.pool, &self.queries.get, move |conn, sql| {
            Box::pin(async move {
                let row = sqlx::query_as::<_, TokenRow>(sql)
                    .bind(&key)
                    .bind(kind)
                    .fetch_optional(conn)
                    .await?;
                Ok(row)
            })
        })
        .await
    }
}

#[async_trait]
impl<T: TokenPayload> TokenStore<T> for PgTokenStore<T> {
    async fn store(&self, key: &str, value: &T) -> StoreResult<()> {
        let now = Utc::now();
        let row = self.to_row(key, value, now)?;

        match T::KIND.write_policy() {
            WritePolicy::InsertOnly => self.insert(&row).await,
            WritePolicy::RenewExpiry => self.renew(&row, now).await,
        }
    }

    async fn get(&self, key: &str) -> StoreResult<Option<T>> {
        is_not_blank(key, "key")?;

        let Some(row) = self.fetch(key).await? else {
            return Ok(None);
        };

        if !row.is_live_at(Utc::now()) {
            tracing::debug!(kind = %T::KIND, "token expired; row left in place");
            return Ok(None);
        }

        self.from_row(row).await.map(Some)
    }

    async fn get_all(&self, subject: &str) -> StoreResult<Vec<T>> {
        has_max_length(subject, "subject", MAX_SHORT_STRING)?;

        let subject = subject.to_string();
        let kind = T::KIND.as_i16();
        let rows = execute(&self.pool, &self.queries.get_all, move |conn, sql| {
            Box::pin(async move {
                let rows = sqlx::query_as::<_, TokenRow>(sql)
                    .bind(&subject)
                    .bind(kind)
                    .fetch_all(conn)
                    .await?;
                Ok(rows)
            })
        })
        .await?;

        self.codec
            .decode_all(rows.into_iter().map(|row| row.model).collect())
            .await
    }

    async fn remove(&self, key: &str) -> StoreResult<()> {
        is_not_blank(key, "key")?;

        let key = key.to_string();
        let kind = T::KIND.as_i16();
        execute(&self.pool, &self.queries.remove, move |conn, sql| {
            Box::pin(async move {
                sqlx::query(sql).bind(&key).bind(kind).execute(conn).await?;
                Ok(())
            })
        })
        .await
    }

    async fn revoke(&self, subject: &str, client_id: &str) -> StoreResult<()> {
        has_max_length(subject, "subject", MAX_SHORT_STRING)?;
        is_short_string(client_id, "client")?;

        let subject = subject.to_string();
        let client_id = client_id.to_string();
        let kind = T::KIND.as_i16();
        let deleted = execute(&self.pool, &self.queries.revoke, move |conn, sql| {
            Box::pin(async move {
                let result = sqlx::query(sql)
                    .bind(&subject)
                    .bind(&client_id)
                    .bind(kind)
                    .execute(conn)
                    .await?;
                Ok(result.rows_affected())
            })
        })
        .await?;

        tracing::debug!(kind = %T::KIND, deleted, "tokens revoked");
        Ok(())
    }
}
