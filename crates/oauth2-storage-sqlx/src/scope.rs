use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;

use oauth2_core::{Scope, StoreResult};
use oauth2_ports::ScopeStore;

use crate::preconditions::is_not_blank;
use crate::schema::Schema;
use crate::transaction::execute;

#[derive(sqlx::FromRow)]
struct ScopeRow {
    name: String,
    is_public: bool,
    model: Json<Scope>,
}

impl ScopeRow {
    fn into_scope(self) -> Scope {
        let mut scope = self.model.0;
        scope.name = self.name;
        scope.show_in_discovery_document = self.is_public;
        scope
    }
}

pub(crate) fn create_table_statement(schema: &Schema) -> String {
    format!(
        "CREATE TABLE IF NOT EXISTS {} (\
            name text NOT NULL, \
            is_public boolean NOT NULL, \
            model jsonb NOT NULL, \
            CONSTRAINT pk_scopes_name PRIMARY KEY (name)\
        ) WITH (OIDS = FALSE)",
        schema.table("scopes")
    )
}

/// Scope definitions in `<schema>.scopes`.
///
/// `is_public` mirrors `Scope::show_in_discovery_document` so discovery
/// listings can filter without opening the document.
pub struct PgScopeStore {
    pool: PgPool,
    queries: ScopeQueries,
}

struct ScopeQueries {
    find: String,
    get_all: String,
    insert: String,
    create_table: String,
}

impl ScopeQueries {
    fn new(schema: &Schema) -> Self {
        let table = schema.table("scopes");
        Self {
            find: format!(
                "SELECT name, is_public, model FROM {table} WHERE name = ANY($1) ORDER BY name"
            ),
            // `false` lists every scope, `true` only the discoverable ones.
            get_all: format!(
                "SELECT name, is_public, model FROM {table} \
                 WHERE ($1 = FALSE OR is_public = TRUE) ORDER BY name"
            ),
            insert: format!("INSERT INTO {table} (name, is_public, model) VALUES ($1, $2, $3)"),
            create_table: create_table_statement(schema),
        }
    }
}

impl PgScopeStore {
    pub fn new(pool: PgPool, schema: Schema) -> Self {
        Self {
            pool,
            queries: ScopeQueries::new(&schema),
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

    async fn fetch(&self, statement: &str, filter: ScopeFilter) -> StoreResult<Vec<Scope>> {
        let rows = execute(&self.pool, statement, move |conn, sql| {
            Box::pin(async move {
                let query = sqlx::query_as::<_, ScopeRow>(sql);
                let query = match &filter {
                    ScopeFilter::Names(names) => query.bind(names),
                    ScopeFilter::PublicOnly(public_only) => query.bind(*public_only),
                };
                Ok(query.fetch_all(conn).await?)
            })
        })
        .await?;

        Ok(rows.into_iter().map(ScopeRow::into_scope).collect())
    }
}

enum ScopeFilter {
    Names(Vec<String>),
    PublicOnly(bool),
}

#[async_trait]
impl ScopeStore for PgScopeStore {
    async fn find_by_names(&self, names: &[String]) -> StoreResult<Vec<Scope>> {
        if names.is_empty() {
            return Ok(Vec::new());
        }
        for name in names {
            is_not_blank(name, "name")?;
        }

        self.fetch(&self.queries.find, ScopeFilter::Names(names.to_vec()))
            .await
    }

    async fn get_all(&self, public_only: bool) -> StoreResult<Vec<Scope>> {
        self.fetch(&self.queries.get_all, ScopeFilter::PublicOnly(public_only))
            .await
    }

    async fn save(&self, scope: &Scope) -> StoreResult<()> {
        is_not_blank(&scope.name, "name")?;

        let name = scope.name.clone();
        let is_public = scope.show_in_discovery_document;
        let model = serde_json::to_value(scope)?;
        execute(&self.pool, &self.queries.insert, move |conn, sql| {
            Box::pin(async move {
                sqlx::query(sql)
                    .bind(&name)
                    .bind(is_public)
                    .bind(&model)
                    .execute(conn)
                    .await?;
                Ok(())
            })
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oauth2_core::ScopeType;

    #[test]
    fn columns_override_document() {
        let row = ScopeRow {
            name: "profile".to_string(),
            is_public: false,
            model: Json(Scope::new("stale", ScopeType::Identity)),
        };

        let scope = row.into_scope();
        assert_eq!(scope.name, "profile");
        assert!(!scope.show_in_discovery_document);
        assert_eq!(scope.scope_type, ScopeType::Identity);
    }

    #[test]
    fn statements_filter_by_name_array_and_visibility() {
        let queries = ScopeQueries::new(&Schema::new("identity").unwrap());

        assert!(queries.find.contains("FROM identity.scopes WHERE name = ANY($1)"));
        assert!(queries.get_all.contains("$1 = FALSE OR is_public = TRUE"));
        assert!(queries.create_table.contains("is_public boolean NOT NULL"));
    }
}
