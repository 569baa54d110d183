//! Idempotent schema creation, run once at deployment.

use sqlx::PgPool;

use oauth2_core::StoreResult;

use crate::schema::Schema;
use crate::transaction::execute;
use crate::{client, consent, scope, token};

/// Every DDL statement, in execution order.
pub fn statements(schema: &Schema) -> Vec<String> {
    vec![
        format!("CREATE SCHEMA IF NOT EXISTS {schema}"),
        client::create_table_statement(schema),
        scope::create_table_statement(schema),
        consent::create_table_statement(schema),
        token::create_table_statement(schema),
        token::create_index_statement(schema),
    ]
}

/// Creates the schema namespace and every table and index that is missing.
pub async fn initialize_schema(pool: &PgPool, schema: &Schema) -> StoreResult<()> {
    let statements = statements(schema);
    for statement in &statements {
        execute(pool, statement, |conn, sql| {
            Box::pin(async move {
                sqlx::query(sql).execute(conn).await?;
                Ok(())
            })
        })
        .await?;
    }

    tracing::info!(
        schema = %schema,
        statements = statements.len(),
        "schema initialized"
    );
    Ok(())
}
