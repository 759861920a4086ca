use crate::error::DbError;
use futures::future::BoxFuture;
use sqlx::{PgConnection, PgPool};

/// Opens units of work against the connection pool.
///
/// Every operation borrows exactly one pooled connection for its lifetime.
/// Work is passed in as a closure returning a boxed future, so a chain of steps
/// can be composed inside a single session or transaction.
#[derive(Debug, Clone)]
pub struct SessionFactory {
    pool: PgPool,
}

impl SessionFactory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Runs `work` on a plain pooled connection, without a transaction.
    pub async fn with_session<T, F>(&self, work: F) -> Result<T, DbError>
    where
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, DbError>>,
    {
        let mut conn = self.pool.acquire().await?;
        work(&mut *conn).await
    }

    /// Runs `work` inside a transaction.
    ///
    /// Commits when the work succeeds. On error the transaction is rolled back
    /// and the work's error is returned unchanged.
    pub async fn with_transaction<T, F>(&self, work: F) -> Result<T, DbError>
    where
        F: for<'c> FnOnce(&'c mut PgConnection) -> BoxFuture<'c, Result<T, DbError>>,
    {
        let mut tx = self.pool.begin().await?;
        let result = work(&mut *tx).await;

        match result {
            Ok(value) => {
                tx.commit().await?;
                Ok(value)
            }
            Err(e) => {
                if let Err(rollback_error) = tx.rollback().await {
                    tracing::warn!(error = %rollback_error, "Rollback failed");
                }
                Err(e)
            }
        }
    }

    /// Closes the pool, waiting for checked-out connections to be returned.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
