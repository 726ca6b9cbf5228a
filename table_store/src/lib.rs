//! Table Store - generic PostgreSQL table access for pgtable
//!
//! This crate turns a declarative description of a table's columns into the
//! SQL for single-row fetch, delete, insert, update and upsert, and provides
//! filtered, sorted and paginated listing over validated query parameters.

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

#[cfg(feature = "debug-logging")]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {
        tracing::trace!($($arg)*)
    };
}

#[cfg(not(feature = "debug-logging"))]
#[macro_export]
macro_rules! trace_log {
    ($($arg:tt)*) => {};
}

pub mod errors;
pub mod executor;
pub mod field;
pub mod prelude;
pub mod query;
pub mod selector;
pub mod sql_generation;
pub mod table;

pub use errors::{ErrorKind, ErrorMap, GenerateError, StoreError};
pub use executor::{ConnectionExecutor, Executor, FromPgRow, PoolExecutor};
pub use field::{Field, VALUE};
pub use query::{Filter, FilterOperator, QueryError, QueryParameters, SortField, SortOrder};
pub use selector::Selector;
pub use sql_generation::Operation;
pub use table::{QueryOptions, Record, Table};
pub use type_mapping::{FieldType, PostgresValue};
