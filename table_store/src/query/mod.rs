//! Filter and sort compilation
//!
//! Callers describe predicates and ordering as data ([`Filter`],
//! [`SortField`]); this module validates them against the columns a selector
//! allows and appends the matching SQL and parameters to a query under
//! construction.

pub mod filter;
pub mod ordering;
pub mod params;


pub use filter::{Filter, FilterCondition, FilterOperator, FilterValue, LogicalOperator};
pub use ordering::{SortField, SortOrder};
pub use params::QueryParameters;

use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;
use type_mapping::{FieldType, PostgresValue};

/// Filterable columns and their types
pub type FilterFields = BTreeMap<String, FieldType>;

/// Sortable columns
pub type SortFields = BTreeSet<String>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum QueryError {
    #[error("Filtering on field {0} is not allowed")]
    UnknownFilterField(String),

    #[error("Sorting on field {0} is not allowed")]
    UnknownSortField(String),

    #[error("Field {field} expects {expected}, got {found}")]
    InvalidValue {
        field: String,
        expected: FieldType,
        found: &'static str,
    },

    #[error("Operator {operator} is not supported for {field} ({field_type})")]
    UnsupportedOperator {
        field: String,
        operator: FilterOperator,
        field_type: FieldType,
    },

    #[error("Operator {operator} on {field} requires a value")]
    MissingValue {
        field: String,
        operator: FilterOperator,
    },
}

/// Append the SQL for `filters` (ANDed) to `query`, pushing bound values to
/// `params`. Markers continue from the parameters already present.
pub fn filter_query(
    fields: &FilterFields,
    filters: &[Filter],
    query: &mut String,
    params: &mut Vec<PostgresValue>,
) -> Result<(), QueryError> {
    let mut parts = Vec::with_capacity(filters.len());
    for filter in filters {
        let sql = filter.to_sql(fields, params)?;
        if !sql.is_empty() {
            parts.push(sql);
        }
    }
    query.push_str(&parts.join(" AND "));
    Ok(())
}

/// Append ` ORDER BY ...` for `sort` to `query`; nothing when `sort` is empty
pub fn sort_query(fields: &SortFields, sort: &[SortField], query: &mut String) -> Result<(), QueryError> {
    if sort.is_empty() {
        return Ok(());
    }
    let mut parts = Vec::with_capacity(sort.len());
    for field in sort {
        if !fields.contains(&field.field) {
            return Err(QueryError::UnknownSortField(field.field.clone()));
        }
        parts.push(format!("{} {}", field.field, field.order.to_sql()));
    }
    query.push_str(" ORDER BY ");
    query.push_str(&parts.join(", "));
    Ok(())
}
