//! Runtime value definitions
//!
//! This module provides the value type carried through generated statements
//! as positional parameters and used for column defaults.

use crate::field_type::FieldType;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// PostgreSQL runtime values bound to `$n` markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PostgresValue {
    Text(String),
    Integer(i32),
    BigInt(i64),
    SmallInt(i16),
    Float(f64),
    Boolean(bool),
    Uuid(Uuid),
    Timestamp(chrono::DateTime<chrono::Utc>),
    Json(serde_json::Value),
    Null,
    /// `NULL` bound with the column's type instead of text
    TypedNull(FieldType),
}

impl PostgresValue {
    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            PostgresValue::Text(_) => "text",
            PostgresValue::Integer(_) => "integer",
            PostgresValue::BigInt(_) => "bigint",
            PostgresValue::SmallInt(_) => "smallint",
            PostgresValue::Float(_) => "float",
            PostgresValue::Boolean(_) => "boolean",
            PostgresValue::Uuid(_) => "uuid",
            PostgresValue::Timestamp(_) => "timestamp",
            PostgresValue::Json(_) => "json",
            PostgresValue::Null | PostgresValue::TypedNull(_) => "null",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, PostgresValue::Null | PostgresValue::TypedNull(_))
    }

    /// Whether the value renders as an unquoted SQL literal
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            PostgresValue::Integer(_)
                | PostgresValue::BigInt(_)
                | PostgresValue::SmallInt(_)
                | PostgresValue::Float(_)
        )
    }

    /// Integer view across all integer widths
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            PostgresValue::Integer(v) => Some(i64::from(*v)),
            PostgresValue::BigInt(v) => Some(*v),
            PostgresValue::SmallInt(v) => Some(i64::from(*v)),
            _ => None,
        }
    }
}

impl fmt::Display for PostgresValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PostgresValue::Text(v) => f.write_str(v),
            PostgresValue::Integer(v) => write!(f, "{}", v),
            PostgresValue::BigInt(v) => write!(f, "{}", v),
            PostgresValue::SmallInt(v) => write!(f, "{}", v),
            PostgresValue::Float(v) => write!(f, "{}", v),
            PostgresValue::Boolean(v) => write!(f, "{}", v),
            PostgresValue::Uuid(v) => write!(f, "{}", v),
            PostgresValue::Timestamp(v) => f.write_str(&v.to_rfc3339()),
            PostgresValue::Json(v) => write!(f, "{}", v),
            PostgresValue::Null | PostgresValue::TypedNull(_) => f.write_str("NULL"),
        }
    }
}

/// Convert basic Rust types to PostgresValue
impl From<String> for PostgresValue {
    fn from(val: String) -> Self {
        PostgresValue::Text(val)
    }
}

impl From<&str> for PostgresValue {
    fn from(val: &str) -> Self {
        PostgresValue::Text(val.to_string())
    }
}

impl From<i32> for PostgresValue {
    fn from(val: i32) -> Self {
        PostgresValue::Integer(val)
    }
}

impl From<i64> for PostgresValue {
    fn from(val: i64) -> Self {
        PostgresValue::BigInt(val)
    }
}

impl From<i16> for PostgresValue {
    fn from(val: i16) -> Self {
        PostgresValue::SmallInt(val)
    }
}

impl From<f64> for PostgresValue {
    fn from(val: f64) -> Self {
        PostgresValue::Float(val)
    }
}

impl From<f32> for PostgresValue {
    fn from(val: f32) -> Self {
        PostgresValue::Float(f64::from(val))
    }
}

impl From<bool> for PostgresValue {
    fn from(val: bool) -> Self {
        PostgresValue::Boolean(val)
    }
}

impl From<Uuid> for PostgresValue {
    fn from(val: Uuid) -> Self {
        PostgresValue::Uuid(val)
    }
}

impl From<chrono::DateTime<chrono::Utc>> for PostgresValue {
    fn from(val: chrono::DateTime<chrono::Utc>) -> Self {
        PostgresValue::Timestamp(val)
    }
}

impl From<serde_json::Value> for PostgresValue {
    fn from(val: serde_json::Value) -> Self {
        PostgresValue::Json(val)
    }
}

impl<T> From<Option<T>> for PostgresValue
where
    T: Into<PostgresValue>,
{
    fn from(val: Option<T>) -> Self {
        match val {
            Some(v) => v.into(),
            None => PostgresValue::Null,
        }
    }
}
