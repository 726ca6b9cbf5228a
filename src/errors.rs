//! Error types for the pgtable facade

use thiserror::Error;

#[derive(Error, Debug)]
pub enum PgTableError {
    #[error("Database connection error: {0}")]
    DatabaseConnection(#[from] sqlx::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error(transparent)]
    Store(#[from] table_store::StoreError),
}

impl PgTableError {
    /// Domain classification; connection and configuration failures are
    /// `Unknown`
    pub fn kind(&self) -> table_store::ErrorKind {
        match self {
            PgTableError::Store(e) => e.kind(),
            PgTableError::DatabaseConnection(_) | PgTableError::Config(_) => {
                table_store::ErrorKind::Unknown
            }
        }
    }
}
