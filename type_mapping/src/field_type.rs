//! Column types for filter validation
//!
//! Filterable columns declare one of these types; incoming filter values are
//! coerced to it or rejected.

use crate::types::PostgresValue;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldType {
    Text,
    Integer,
    Float,
    Boolean,
    Uuid,
    Timestamp,
    Json,
}

impl FieldType {
    /// Coerce a value to this column type.
    ///
    /// Text input is parsed for the non-text types, which lets filters that
    /// arrive as strings (query strings, JSON bodies) be typechecked. `Null`
    /// is accepted for every type. Returns `None` when the value is
    /// incompatible.
    pub fn coerce(&self, value: &PostgresValue) -> Option<PostgresValue> {
        if value.is_null() {
            return Some(PostgresValue::Null);
        }
        match self {
            FieldType::Text => match value {
                PostgresValue::Text(_) => Some(value.clone()),
                _ => None,
            },
            FieldType::Integer => match value {
                PostgresValue::Integer(_) | PostgresValue::BigInt(_) | PostgresValue::SmallInt(_) => {
                    Some(value.clone())
                }
                PostgresValue::Text(s) => s.trim().parse::<i64>().ok().map(PostgresValue::BigInt),
                _ => None,
            },
            FieldType::Float => match value {
                PostgresValue::Float(_) => Some(value.clone()),
                PostgresValue::Text(s) => s.trim().parse::<f64>().ok().map(PostgresValue::Float),
                other => other.as_i64().map(|i| PostgresValue::Float(i as f64)),
            },
            FieldType::Boolean => match value {
                PostgresValue::Boolean(_) => Some(value.clone()),
                PostgresValue::Text(s) => match s.trim().to_ascii_lowercase().as_str() {
                    "true" | "t" | "1" => Some(PostgresValue::Boolean(true)),
                    "false" | "f" | "0" => Some(PostgresValue::Boolean(false)),
                    _ => None,
                },
                _ => None,
            },
            FieldType::Uuid => match value {
                PostgresValue::Uuid(_) => Some(value.clone()),
                PostgresValue::Text(s) => uuid::Uuid::parse_str(s.trim()).ok().map(PostgresValue::Uuid),
                _ => None,
            },
            FieldType::Timestamp => match value {
                PostgresValue::Timestamp(_) => Some(value.clone()),
                PostgresValue::Text(s) => chrono::DateTime::parse_from_rfc3339(s.trim())
                    .ok()
                    .map(|dt| PostgresValue::Timestamp(dt.with_timezone(&chrono::Utc))),
                _ => None,
            },
            FieldType::Json => match value {
                PostgresValue::Json(_) => Some(value.clone()),
                _ => None,
            },
        }
    }

    /// Column type implied by a non-null value
    pub fn of(value: &PostgresValue) -> Option<FieldType> {
        match value {
            PostgresValue::Text(_) => Some(FieldType::Text),
            PostgresValue::Integer(_) | PostgresValue::BigInt(_) | PostgresValue::SmallInt(_) => {
                Some(FieldType::Integer)
            }
            PostgresValue::Float(_) => Some(FieldType::Float),
            PostgresValue::Boolean(_) => Some(FieldType::Boolean),
            PostgresValue::Uuid(_) => Some(FieldType::Uuid),
            PostgresValue::Timestamp(_) => Some(FieldType::Timestamp),
            PostgresValue::Json(_) => Some(FieldType::Json),
            PostgresValue::TypedNull(ty) => Some(*ty),
            PostgresValue::Null => None,
        }
    }

    /// Whether ordering comparisons (`<`, `>=`, ...) make sense for the type
    pub fn is_ordered(&self) -> bool {
        !matches!(self, FieldType::Boolean | FieldType::Json)
    }

    /// Whether pattern matching (`LIKE`, `ILIKE`) applies
    pub fn is_textual(&self) -> bool {
        matches!(self, FieldType::Text)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Text => "text",
            FieldType::Integer => "integer",
            FieldType::Float => "float",
            FieldType::Boolean => "boolean",
            FieldType::Uuid => "uuid",
            FieldType::Timestamp => "timestamp",
            FieldType::Json => "json",
        };
        f.write_str(name)
    }
}
