//! sqlx parameter binding
//!
//! The macro is shared by every query shape (`Query`, `QueryAs`,
//! `QueryScalar`) since they expose the same `bind` method without a common
//! trait. The calling crate must depend on sqlx with the `uuid`, `chrono` and
//! `json` features.

/// Bind a `PostgresValue` to a sqlx query, returning the query.
///
/// An untyped `Null` is declared as `text`. A `TypedNull` is declared with
/// the Rust type sqlx maps to its column type, so Postgres can assign it to
/// integer, uuid, timestamp or json columns without a cast.
#[macro_export]
macro_rules! bind_postgres_value {
    ($query:expr, $value:expr) => {
        match $value {
            $crate::PostgresValue::Text(v) => $query.bind(v),
            $crate::PostgresValue::Integer(v) => $query.bind(v),
            $crate::PostgresValue::BigInt(v) => $query.bind(v),
            $crate::PostgresValue::SmallInt(v) => $query.bind(v),
            $crate::PostgresValue::Float(v) => $query.bind(v),
            $crate::PostgresValue::Boolean(v) => $query.bind(v),
            $crate::PostgresValue::Uuid(v) => $query.bind(v),
            $crate::PostgresValue::Timestamp(v) => $query.bind(v),
            $crate::PostgresValue::Json(v) => $query.bind(v),
            $crate::PostgresValue::Null => $query.bind(Option::<String>::None),
            $crate::PostgresValue::TypedNull(ty) => match ty {
                $crate::FieldType::Text => $query.bind(Option::<String>::None),
                $crate::FieldType::Integer => $query.bind(Option::<i64>::None),
                $crate::FieldType::Float => $query.bind(Option::<f64>::None),
                $crate::FieldType::Boolean => $query.bind(Option::<bool>::None),
                $crate::FieldType::Uuid => $query.bind(Option::<$crate::uuid::Uuid>::None),
                $crate::FieldType::Timestamp => {
                    $query.bind(Option::<$crate::chrono::DateTime<$crate::chrono::Utc>>::None)
                }
                $crate::FieldType::Json => $query.bind(Option::<$crate::serde_json::Value>::None),
            },
        }
    };
}
