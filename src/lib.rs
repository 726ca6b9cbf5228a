//! # pgtable
//!
//! Declarative PostgreSQL table access. Describe a table's columns once and
//! get the SQL for get, delete, insert, update and upsert, plus filtered,
//! sorted and paginated listing over validated query parameters.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pgtable::prelude::*;
//!
//! #[derive(Debug, sqlx::FromRow)]
//! pub struct User {
//!     pub id: i64,
//!     pub name: String,
//! }
//!
//! impl Record for User {
//!     fn value(&self, column: &str) -> Option<PostgresValue> {
//!         match column {
//!             "id" => Some(self.id.into()),
//!             "name" => Some(self.name.clone().into()),
//!             _ => None,
//!         }
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AppConfig::load()?;
//!     let db = PgTable::connect(&config).await?;
//!     let exec = db.executor();
//!
//!     let users: Table<User> = Table::new("users", vec![
//!         Field::id("id"),
//!         Field::column("name"),
//!     ])
//!     .with_selector(
//!         Selector::default()
//!             .filter_field("users.name", FieldType::Text)
//!             .sort_field("users.name"),
//!     )
//!     .build()?;
//!
//!     let (page, total) = users
//!         .select(&exec, &db.params(QueryParameters::new().filter(Filter::ilike("users.name", "j%"))))
//!         .await?;
//!     println!("{} of {:?} users", page.len(), total);
//!
//!     Ok(())
//! }
//! ```

/// Conditional debug logging macros
/// These macros only compile in code when the `debug-logging` feature is enabled
#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! debug_log {
    ($($arg:tt)*) => {};
}

pub mod core;
pub mod errors;
pub mod prelude;

// Re-export the main public types for convenience
pub use crate::core::PgTable;
pub use crate::errors::PgTableError;

// Re-export centralized config
pub use config::{AppConfig, ConfigError, DatabaseConfig, QueryConfig};

pub use table_store;
pub use type_mapping;

// Re-export external dependencies used in public API
pub use async_trait;
pub use sqlx;
