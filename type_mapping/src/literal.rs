//! SQL literal rendering
//!
//! Used where a value is embedded in generated SQL text instead of being
//! bound, such as the default of a `COALESCE` projection.

use crate::types::PostgresValue;

/// Render a value as a SQL literal.
///
/// Numeric values are written unquoted, `Null` as `NULL`, and everything
/// else as a single-quoted string.
pub fn to_sql_literal(value: &PostgresValue) -> String {
    match value {
        PostgresValue::Null | PostgresValue::TypedNull(_) => "NULL".to_string(),
        v if v.is_numeric() => v.to_string(),
        v => quote_literal(&v.to_string()),
    }
}

/// Single-quote a string, doubling embedded quotes
pub fn quote_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        if c == '\'' {
            out.push('\'');
        }
        out.push(c);
    }
    out.push('\'');
    out
}
