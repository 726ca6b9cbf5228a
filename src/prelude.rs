//! Convenience re-exports for common pgtable usage
//!
//! ```rust
//! use pgtable::prelude::*;
//! ```

pub use crate::core::PgTable;
pub use crate::errors::PgTableError;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, DatabaseConfig, QueryConfig};

pub use table_store::prelude::*;

// Common external dependencies
pub use anyhow;
pub use async_trait;
pub use sqlx;
pub use tokio;

// Commonly used sqlx types
pub use sqlx::{FromRow, PgPool, Transaction};
