use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use oauth2_core::{Client, StoreResult};
use oauth2_ports::ClientStore;

use crate::preconditions::is_short_string;
use crate::schema::Schema;
use crate::transaction::execute;

#[derive(sqlx::FromRow)]
struct ClientRow {
    client_id: String,
    model: Json<Client>,
}

impl ClientRow {
    // The key column wins over whatever id the document carries.
    fn into_client(self) -> Client {
        let mut client = self.model.0;
        client.client_id = self.client_id;
        client
    }
}

pub(crate) fn create_table_statement(schema: &Schema) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\
            client_id character varying(255) NOT NULL, \
            model jsonb NOT NULL, \
            CONSTRAINT pk_clients_clientid PRIMARY KEY (client_id)\
        ) WITH (OIDS = FALSE)",
        schema.table("clients")
    )
}

/// Registered clients in `<schema>.clients`.
pub struct PgClientStore {
    pool: PgPool,
    find_query: String,
    find_many_query: String,
    insert_query: String,
    create_table: String,
}

impl PgClientStore {
    pub fn new(pool: PgPool, schema: Schema) -> Self {
        let table = schema.table("clients");
        Self {
            pool,
            find_query: format!("SELECT client_id, model FROM {table} WHERE client_id = $1"),
            find_many_query: format!(
                "SELECT client_id, model FROM {table} WHERE client_id = ANY($1)"
            ),
            insert_query: format!("INSERT INTO {table} (client_id, model) VALUES ($1, $2)"),
            create_table: create_table_statement(&schema),
        }
    }

    pub async fn initialize_table(&self) -> StoreResult<()> {
        execute(&self.pool, &self.create_table, |conn, sql| {
            Box::pin(async move {
                sqlx::query(sql).execute(conn).await?;
                Ok(())
            })
        })
        .await
    }
}

#[async_trait]
impl ClientStore for PgClientStore {
    async fn find_by_id(&self, client_id: &str) -> StoreResult<Option<Client>> {
        is_short_string(client_id, "client_id")?;

        let client_id = client_id.to_string();
        let row = execute(&self.pool, &self.find_query, move |conn, sql| {
            Box::pin(async move {
                let row = sqlx::query_as::<_, ClientRow>(sql)
                    .bind(&client_id)
                    .fetch_optional(conn)
                    .await?;
                Ok(row)
            })
        })
        .await?;

        Ok(row.map(ClientRow::into_client))
    }

    async fn find_by_ids(&self, client_ids: &[String]) -> StoreResult<Vec<Client>> {
        if client_ids.is_empty() {
            return Ok(Vec::new());
        }
        for id in client_ids {
            is_short_string(id, "client_id")?;
        }

        let ids = client_ids.to_vec();
        let rows = execute(&self.pool, &self.find_many_query, move |conn, sql| {
            Box::pin(async move {
                let rows = sqlx::query_as::<_, ClientRow>(sql)
                    .bind(&ids)
                    .fetch_all(conn)
                    .await?;
                Ok(rows)
            })
        })
        .await?;

        Ok(rows.into_iter().map(ClientRow::into_client).collect())
    }

    async fn add(&self, client: &Client) -> StoreResult<()> {
        is_short_string(&client.client_id, "client_id")?;

        let client_id = client.client_id.clone();
        let model = serde_json::to_value(client)?;
        execute(&self.pool, &self.insert_query, move |conn, sql| {
            Box::pin(async move {
                sqlx::query(sql)
                    .bind(&client_id)
                    .bind(&model)
                    .execute(conn)
                    .await?;
                Ok(())
            })
        })
        .await
    }
}
