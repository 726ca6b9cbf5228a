//! Statement execution
//!
//! The [`Executor`] trait is the only place statements reach the database.
//! Each call is one round trip; cancelling means dropping the returned
//! future.

use async_trait::async_trait;
use sqlx::postgres::{PgArguments, PgConnection, PgRow};
use sqlx::{FromRow, PgPool, Postgres};
use std::future::Future;
use std::time::Duration;
use tokio::sync::Mutex;
use type_mapping::{bind_postgres_value, PostgresValue};

/// Rows that can be decoded from a PostgreSQL result
pub trait FromPgRow: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {}

impl<T> FromPgRow for T where T: for<'r> FromRow<'r, PgRow> + Send + Unpin + 'static {}

#[async_trait]
pub trait Executor: Send + Sync {
    /// Fetch exactly one row; no row is `sqlx::Error::RowNotFound`
    async fn fetch_one<R: FromPgRow>(&self, sql: &str, params: &[PostgresValue]) -> Result<R, sqlx::Error>;

    /// Fetch every row
    async fn fetch_all<R: FromPgRow>(&self, sql: &str, params: &[PostgresValue]) -> Result<Vec<R>, sqlx::Error>;

    /// Execute a statement, returning the number of rows affected
    async fn execute(&self, sql: &str, params: &[PostgresValue]) -> Result<u64, sqlx::Error>;
}

fn query_as<'q, R: FromPgRow>(
    sql: &'q str,
    params: &[PostgresValue],
) -> sqlx::query::QueryAs<'q, Postgres, R, PgArguments> {
    let mut query = sqlx::query_as::<_, R>(sql);
    for param in params {
        query = bind_postgres_value!(query, param.clone());
    }
    query
}

fn query<'q>(sql: &'q str, params: &[PostgresValue]) -> sqlx::query::Query<'q, Postgres, PgArguments> {
    let mut query = sqlx::query(sql);
    for param in params {
        query = bind_postgres_value!(query, param.clone());
    }
    query
}

/// Executor over a connection pool, with an optional client-side deadline
/// per statement
#[derive(Debug, Clone)]
pub struct PoolExecutor {
    pool: PgPool,
    statement_timeout: Option<Duration>,
}

impl PoolExecutor {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool,
            statement_timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.statement_timeout = timeout;
        self
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn run<O, F>(&self, sql: &str, fut: F) -> Result<O, sqlx::Error>
    where
        F: Future<Output = Result<O, sqlx::Error>> + Send,
    {
        crate::trace_log!("[SQL] {}", sql);
        match self.statement_timeout {
            Some(timeout) => tokio::time::timeout(timeout, fut).await.map_err(|_| {
                crate::debug_log!("[SQL] timed out after {:?}: {}", timeout, sql);
                sqlx::Error::Io(std::io::Error::new(
                    std::io::ErrorKind::TimedOut,
                    format!("statement timed out after {:?}", timeout),
                ))
            })?,
            None => fut.await,
        }
    }
}

#[async_trait]
impl Executor for PoolExecutor {
    async fn fetch_one<R: FromPgRow>(&self, sql: &str, params: &[PostgresValue]) -> Result<R, sqlx::Error> {
        self.run(sql, query_as::<R>(sql, params).fetch_one(&self.pool)).await
    }

    async fn fetch_all<R: FromPgRow>(&self, sql: &str, params: &[PostgresValue]) -> Result<Vec<R>, sqlx::Error> {
        self.run(sql, query_as::<R>(sql, params).fetch_all(&self.pool)).await
    }

    async fn execute(&self, sql: &str, params: &[PostgresValue]) -> Result<u64, sqlx::Error> {
        let result = self.run(sql, query(sql, params).execute(&self.pool)).await?;
        Ok(result.rows_affected())
    }
}

/// Executor over a caller-owned connection, typically an open transaction.
///
/// ```rust,no_run
/// # async fn demo(pool: sqlx::PgPool) -> Result<(), sqlx::Error> {
/// use table_store::ConnectionExecutor;
///
/// let mut tx = pool.begin().await?;
/// {
///     let exec = ConnectionExecutor::new(&mut tx);
///     // table.insert(&exec, &record).await ...
/// }
/// tx.commit().await?;
/// # Ok(())
/// # }
/// ```
pub struct ConnectionExecutor<'c> {
    conn: Mutex<&'c mut PgConnection>,
}

impl<'c> ConnectionExecutor<'c> {
    pub fn new(conn: &'c mut PgConnection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }
}

#[async_trait]
impl Executor for ConnectionExecutor<'_> {
    async fn fetch_one<R: FromPgRow>(&self, sql: &str, params: &[PostgresValue]) -> Result<R, sqlx::Error> {
        crate::trace_log!("[SQL] {}", sql);
        let mut conn = self.conn.lock().await;
        query_as::<R>(sql, params).fetch_one(&mut **conn).await
    }

    async fn fetch_all<R: FromPgRow>(&self, sql: &str, params: &[PostgresValue]) -> Result<Vec<R>, sqlx::Error> {
        crate::trace_log!("[SQL] {}", sql);
        let mut conn = self.conn.lock().await;
        query_as::<R>(sql, params).fetch_all(&mut **conn).await
    }

    async fn execute(&self, sql: &str, params: &[PostgresValue]) -> Result<u64, sqlx::Error> {
        crate::trace_log!("[SQL] {}", sql);
        let mut conn = self.conn.lock().await;
        let result = query(sql, params).execute(&mut **conn).await?;
        Ok(result.rows_affected())
    }
}
