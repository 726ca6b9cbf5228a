//! Common table-store imports
//!
//! ```rust
//! use table_store::prelude::*;
//! ```

pub use crate::errors::{ErrorKind, ErrorMap, GenerateError, StoreError};
pub use crate::executor::{ConnectionExecutor, Executor, FromPgRow, PoolExecutor};
pub use crate::field::{Field, VALUE};
pub use crate::query::{
    Filter, FilterOperator, FilterValue, LogicalOperator, QueryError, QueryParameters, SortField, SortOrder,
};
pub use crate::selector::Selector;
pub use crate::sql_generation::Operation;
pub use crate::table::{QueryOptions, Record, Table};
pub use type_mapping::{FieldType, PostgresValue};
