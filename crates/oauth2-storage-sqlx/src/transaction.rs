//! One statement, one transaction.
//!
//! Every public store operation funnels through [`execute`]: a connection is
//! taken from the pool (which opens it lazily), a transaction is started, the
//! operation runs with the statement text, and the transaction commits only if
//! the operation succeeded. Any error rolls the transaction back explicitly and
//! is returned to the caller unchanged.

use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};

use oauth2_core::StoreResult;

pub async fn execute<T, F>(pool: &PgPool, statement: &str, operation: F) -> StoreResult<T>
where
    T: Send,
    F: for<'c> FnOnce(&'c mut PgConnection, &'c str) -> BoxFuture<'c, StoreResult<T>> + Send,
{
    let mut tx = pool.begin().await?;

    match operation(&mut *tx, statement).await {
        Ok(value) => {
            tx.commit().await?;
            tracing::debug!(statement, "transaction committed");
            Ok(value)
        }
        Err(err) => {
            // The original error wins even if the rollback itself fails.
            if let Err(rollback_err) = tx.rollback().await {
                tracing::warn!(
                    statement,
                    error = %rollback_err,
                    "transaction rollback failed"
                );
            } else {
                tracing::debug!(statement, error = %err, "transaction rolled back");
            }
            Err(err)
        }
    }
}
