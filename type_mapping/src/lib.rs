//! Unified value mapping between Rust and PostgreSQL
//! This crate provides the runtime values bound as statement parameters,
//! the column types used to typecheck filters, and SQL literal rendering.

pub mod bind;
pub mod field_type;
pub mod literal;
pub mod types;

pub use field_type::FieldType;
pub use literal::{quote_literal, to_sql_literal};
pub use types::PostgresValue;

// used by `bind_postgres_value!` in crates that only depend on sqlx
pub use chrono;
pub use serde_json;
pub use uuid;
