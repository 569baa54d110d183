use async_trait::async_trait;
use sqlx::PgPool;

use oauth2_core::{Consent, StoreError, StoreResult};
use oauth2_ports::ConsentStore;

use crate::preconditions::{has_max_length, is_not_blank, is_short_string};
use crate::schema::Schema;
use crate::transaction::execute;

/// Width of the `scopes` column.
pub const MAX_SCOPES_LENGTH: usize = 2000;

const SCOPE_SEPARATOR: char = ',';

/// Joins scope names into the stored column value. An empty set is `""`.
pub fn scopes_to_column(scopes: &[String]) -> StoreResult<String> {
    for scope in scopes {
        is_not_blank(scope, "scopes")?;
        if scope.trim() != scope {
            return Err(StoreError::validation(
                "scopes",
                format!("scope name `{scope}` must not have surrounding whitespace."),
            ));
        }
        if scope.contains(SCOPE_SEPARATOR) {
            return Err(StoreError::validation(
                "scopes",
                format!("scope name `{scope}` must not contain `{SCOPE_SEPARATOR}`."),
            ));
        }
    }

    let joined = scopes.join(",");
    has_max_length(&joined, "scopes", MAX_SCOPES_LENGTH)?;
    Ok(joined)
}

pub fn scopes_from_column(column: &str) -> Vec<String> {
    column
        .split(SCOPE_SEPARATOR)
        .filter(|scope| !scope.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(sqlx::FromRow)]
struct ConsentRow {
    subject: String,
    client_id: String,
    scopes: String,
}

impl From<ConsentRow> for Consent {
    fn from(row: ConsentRow) -> Self {
        Consent {
            scopes: scopes_from_column(&row.scopes),
            subject: row.subject,
            client_id: row.client_id,
        }
    }
}

pub(crate) fn create_table_statement(schema: &Schema) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\
            subject character varying(255) NOT NULL, \
            client_id character varying(255) NOT NULL, \
            scopes character varying(2000) NOT NULL, \
            CONSTRAINT pk_consents_subject_clientid PRIMARY KEY (subject, client_id)\
        ) WITH (OIDS = FALSE)",
        schema.table("consents")
    )
}

struct ConsentQueries {
    load: String,
    load_all: String,
    revoke: String,
    upsert: String,
    create_table: String,
}

impl ConsentQueries {
    fn new(schema: &Schema) -> Self {
        let table = schema.table("consents");
        Self {
            load: format!(
                "SELECT subject, client_id, scopes FROM {table} \
                 WHERE subject = $1 AND client_id = $2"
            ),
            load_all: format!(
                "SELECT subject, client_id, scopes FROM {table} \
                 WHERE subject = $1 ORDER BY client_id"
            ),
            revoke: format!("DELETE FROM {table} WHERE subject = $1 AND client_id = $2"),
            upsert: format!(
                "INSERT INTO {table} (subject, client_id, scopes) VALUES ($1, $2, $3) \
                 ON CONFLICT (subject, client_id) DO UPDATE SET scopes = EXCLUDED.scopes"
            ),
            create_table: create_table_statement(schema),
        }
    }
}

/// Consents in `<schema>.consents`, one row per `(subject, client_id)`.
pub struct PgConsentStore {
    pool: PgPool,
    queries: ConsentQueries,
}

impl PgConsentStore {
    pub fn new(pool: PgPool, schema: Schema) -> Self {
        Self {
            pool,
            queries: ConsentQueries::new(&schema),
        }
    }

    pub async fn initialize_table(&self) -> StoreResult<()> {
        execute(&self.pool, &self.queries.create_table, |conn, sql| {
            Box::pin(async move {
                sqlx::query(sql).execute(conn).await?;
                Ok(())
            })
        })
        .await
    }
}

fn check_key(subject: &str, client_id: &str) -> StoreResult<()> {
    is_short_string(subject, "subject")?;
    is_short_string(client_id, "client_id")
}

#[async_trait]
impl ConsentStore for PgConsentStore {
    async fn load(&self, subject: &str, client_id: &str) -> StoreResult<Option<Consent>> {
        check_key(subject, client_id)?;

        let subject = subject.to_string();
        let client_id = client_id.to_string();
        let row = execute(&self.pool, &self.queries.load, move |conn, sql| {
            Box::pin(async move {
                let row = sqlx::query_as::<_, ConsentRow>(sql)
                    .bind(&subject)
                    .bind(&client_id)
                    .fetch_optional(conn)
                    .await?;
                Ok(row)
            })
        })
        .await?;

        Ok(row.map(Consent::from))
    }

    async fn load_all(&self, subject: &str) -> StoreResult<Vec<Consent>> {
        is_short_string(subject, "subject")?;

        let subject = subject.to_string();
        let rows = execute(&self.pool, &self.queries.load_all, move |conn, sql| {
            Box::pin(async move {
                let rows = sqlx::query_as::<_, ConsentRow>(sql)
                    .bind(&subject)
                    .fetch_all(conn)
                    .await?;
                Ok(rows)
            })
        })
        .await?;

        Ok(rows.into_iter().map(Consent::from).collect())
    }

    async fn revoke(&self, subject: &str, client_id: &str) -> StoreResult<()> {
        check_key(subject, client_id)?;

        let subject = subject.to_string();
        let client_id = client_id.to_string();
        execute(&self.pool, &self.queries.revoke, move |conn, sql| {
            Box::pin(async move {
                sqlx::query(sql)
                    .bind(&subject)
                    .bind(&client_id)
                    .execute(conn)
                    .await?;
                Ok(())
            })
        })
        .await
    }

    async fn update(&self, consent: &Consent) -> StoreResult<()> {
        check_key(&consent.subject, &consent.client_id)?;
        let scopes = scopes_to_column(&consent.scopes)?;

        let subject = consent.subject.clone();
        let client_id = consent.client_id.clone();
        execute(&self.pool, &self.queries.upsert, move |conn, sql| {
            Box::pin(async move {
                sqlx::query(sql)
                    .bind(&subject)
                    .bind(&client_id)
                    .bind(&scopes)
                    .execute(conn)
                    .await?;
                Ok(())
            })
        })
        .await
    }
}
