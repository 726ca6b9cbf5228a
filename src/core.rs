//! Connection management
//!
//! [`PgTable`] owns the pool and the query settings every table call is
//! issued under.

use sqlx::PgPool;
use sqlx::postgres::PgConnectOptions;
use std::time::Duration;
use table_store::{PoolExecutor, QueryParameters};

use crate::errors::PgTableError;
use config::{AppConfig, DatabaseConfig, QueryConfig};

pub struct PgTable {
    pool: PgPool,
    query: QueryConfig,
}

impl PgTable {
    /// Open a pool from configuration
    pub async fn connect(config: &AppConfig) -> Result<Self, PgTableError> {
        let pool = Self::pool_options(&config.database)
            .connect_with(Self::connect_options(&config.database))
            .await?;

        tracing::info!(
            host = %config.database.host,
            database = %config.database.database,
            max_connections = config.database.max_connections,
            "connected to PostgreSQL"
        );

        Ok(Self {
            pool,
            query: config.query.clone(),
        })
    }

    /// Wrap an existing pool
    pub fn from_pool(pool: PgPool, query: QueryConfig) -> Self {
        Self { pool, query }
    }

    fn connect_options(config: &DatabaseConfig) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .database(&config.database)
            .username(&config.username)
            .password(&config.password)
    }

    fn pool_options(config: &DatabaseConfig) -> sqlx::postgres::PgPoolOptions {
        crate::debug_log!(
            "[pgtable] pool: min={}, max={}, acquire={}s, idle={}s",
            config.min_connections,
            config.max_connections,
            config.connection_timeout_seconds,
            config.idle_timeout_seconds
        );
        let mut pool_options = sqlx::postgres::PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds));

        // Set max lifetime if specified
        if config.max_lifetime_seconds > 0 {
            pool_options =
                pool_options.max_lifetime(Duration::from_secs(config.max_lifetime_seconds));
        }
        pool_options
    }

    /// Get database pool reference
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn query_config(&self) -> &QueryConfig {
        &self.query
    }

    /// Executor over the pool with the configured statement timeout
    pub fn executor(&self) -> PoolExecutor {
        PoolExecutor::new(self.pool.clone()).with_timeout(self.query.statement_timeout())
    }

    /// Apply the configured page-size cap to caller parameters
    pub fn params(&self, params: QueryParameters) -> QueryParameters {
        params.clamp_limit(self.query.max_limit())
    }

    /// Check database connection health
    pub async fn health_check(&self) -> Result<(), PgTableError> {
        sqlx::query("SELECT 1").fetch_one(&self.pool).await?;
        Ok(())
    }
}
