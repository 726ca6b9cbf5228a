//! Filter expressions
//!
//! A filter is a tree of conditions joined by AND/OR groups. Conditions name
//! a column from the selector's allow-list; their values are coerced to the
//! column's declared type before being bound.

use super::{FilterFields, QueryError};
use serde::{Deserialize, Serialize};
use std::fmt;
use type_mapping::{FieldType, PostgresValue};

/// Query condition operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterOperator {
    Eq,        // =
    Ne,        // !=
    Gt,        // >
    Gte,       // >=
    Lt,        // <
    Lte,       // <=
    Like,      // LIKE
    ILike,     // ILIKE (case insensitive)
    NotLike,   // NOT LIKE
    In,        // IN
    NotIn,     // NOT IN
    IsNull,    // IS NULL
    IsNotNull, // IS NOT NULL
}

impl FilterOperator {
    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOperator::Eq => "=",
            FilterOperator::Ne => "!=",
            FilterOperator::Gt => ">",
            FilterOperator::Gte => ">=",
            FilterOperator::Lt => "<",
            FilterOperator::Lte => "<=",
            FilterOperator::Like => "LIKE",
            FilterOperator::ILike => "ILIKE",
            FilterOperator::NotLike => "NOT LIKE",
            FilterOperator::In => "IN",
            FilterOperator::NotIn => "NOT IN",
            FilterOperator::IsNull => "IS NULL",
            FilterOperator::IsNotNull => "IS NOT NULL",
        }
    }

    fn supports(&self, field_type: FieldType) -> bool {
        match self {
            FilterOperator::Gt | FilterOperator::Gte | FilterOperator::Lt | FilterOperator::Lte => {
                field_type.is_ordered()
            }
            FilterOperator::Like | FilterOperator::ILike | FilterOperator::NotLike => {
                field_type.is_textual()
            }
            _ => true,
        }
    }
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_sql())
    }
}

/// Operand of a condition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterValue {
    None,
    Single(PostgresValue),
    List(Vec<PostgresValue>),
}

/// Single condition in WHERE clause
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub field: String,
    pub operator: FilterOperator,
    pub value: FilterValue,
}

/// Logical operators for combining conditions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogicalOperator {
    And,
    Or,
}

/// Filter tree that can be nested
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    Condition(FilterCondition),
    Group {
        operator: LogicalOperator,
        filters: Vec<Filter>,
    },
    Not(Box<Filter>),
}

impl Filter {
    /// Create a simple condition
    pub fn condition(field: &str, operator: FilterOperator, value: FilterValue) -> Self {
        Self::Condition(FilterCondition {
            field: field.to_string(),
            operator,
            value,
        })
    }

    fn single(field: &str, operator: FilterOperator, value: impl Into<PostgresValue>) -> Self {
        Self::condition(field, operator, FilterValue::Single(value.into()))
    }

    /// Create an AND group
    pub fn and(filters: Vec<Filter>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            filters,
        }
    }

    /// Create an OR group
    pub fn or(filters: Vec<Filter>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            filters,
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(filter: Filter) -> Self {
        Self::Not(Box::new(filter))
    }

    /// Convenience methods for common operations
    pub fn eq(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::single(field, FilterOperator::Eq, value)
    }

    pub fn ne(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::single(field, FilterOperator::Ne, value)
    }

    pub fn gt(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::single(field, FilterOperator::Gt, value)
    }

    pub fn gte(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::single(field, FilterOperator::Gte, value)
    }

    pub fn lt(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::single(field, FilterOperator::Lt, value)
    }

    pub fn lte(field: &str, value: impl Into<PostgresValue>) -> Self {
        Self::single(field, FilterOperator::Lte, value)
    }

    pub fn like(field: &str, pattern: &str) -> Self {
        Self::single(field, FilterOperator::Like, pattern)
    }

    pub fn ilike(field: &str, pattern: &str) -> Self {
        Self::single(field, FilterOperator::ILike, pattern)
    }

    pub fn not_like(field: &str, pattern: &str) -> Self {
        Self::single(field, FilterOperator::NotLike, pattern)
    }

    pub fn in_values<V: Into<PostgresValue>>(field: &str, values: Vec<V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::condition(field, FilterOperator::In, FilterValue::List(values))
    }

    pub fn not_in_values<V: Into<PostgresValue>>(field: &str, values: Vec<V>) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        Self::condition(field, FilterOperator::NotIn, FilterValue::List(values))
    }

    pub fn is_null(field: &str) -> Self {
        Self::condition(field, FilterOperator::IsNull, FilterValue::None)
    }

    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, FilterOperator::IsNotNull, FilterValue::None)
    }

    /// Compile to SQL, validating against `fields`. An empty string means the
    /// filter contributes no predicate (an empty group).
    pub(crate) fn to_sql(
        &self,
        fields: &FilterFields,
        params: &mut Vec<PostgresValue>,
    ) -> Result<String, QueryError> {
        match self {
            Filter::Condition(condition) => condition.to_sql(fields, params),
            Filter::Group { operator, filters } => {
                let operator_str = match operator {
                    LogicalOperator::And => " AND ",
                    LogicalOperator::Or => " OR ",
                };

                let mut conditions = Vec::with_capacity(filters.len());
                for filter in filters {
                    let sql = filter.to_sql(fields, params)?;
                    if !sql.is_empty() {
                        conditions.push(sql);
                    }
                }

                Ok(match conditions.len() {
                    0 => String::new(),
                    1 => conditions.remove(0),
                    _ => format!("({})", conditions.join(operator_str)),
                })
            }
            Filter::Not(inner) => {
                let sql = inner.to_sql(fields, params)?;
                if sql.is_empty() {
                    Ok(sql)
                } else {
                    Ok(format!("NOT ({})", sql))
                }
            }
        }
    }
}

impl FilterCondition {
    fn to_sql(&self, fields: &FilterFields, params: &mut Vec<PostgresValue>) -> Result<String, QueryError> {
        let field = &self.field;
        let field_type = *fields
            .get(field)
            .ok_or_else(|| QueryError::UnknownFilterField(field.clone()))?;

        if !self.operator.supports(field_type) {
            return Err(QueryError::UnsupportedOperator {
                field: field.clone(),
                operator: self.operator,
                field_type,
            });
        }

        match self.operator {
            FilterOperator::IsNull | FilterOperator::IsNotNull => {
                Ok(format!("{} {}", field, self.operator.to_sql()))
            }
            FilterOperator::In | FilterOperator::NotIn => {
                let values = match &self.value {
                    FilterValue::List(values) => values.as_slice(),
                    FilterValue::Single(value) => std::slice::from_ref(value),
                    FilterValue::None => &[],
                };
                if values.is_empty() {
                    // IN () is invalid SQL
                    return Ok(if self.operator == FilterOperator::In {
                        "FALSE".to_string()
                    } else {
                        "TRUE".to_string()
                    });
                }
                let mut placeholders = Vec::with_capacity(values.len());
                for value in values {
                    params.push(self.coerce(field_type, value)?);
                    placeholders.push(format!("${}", params.len()));
                }
                Ok(format!(
                    "{} {} ({})",
                    field,
                    self.operator.to_sql(),
                    placeholders.join(", ")
                ))
            }
            _ => {
                let value = match &self.value {
                    FilterValue::Single(value) => self.coerce(field_type, value)?,
                    FilterValue::None => PostgresValue::Null,
                    FilterValue::List(_) => {
                        return Err(QueryError::InvalidValue {
                            field: field.clone(),
                            expected: field_type,
                            found: "list",
                        })
                    }
                };
                if value.is_null() {
                    return match self.operator {
                        FilterOperator::Eq => Ok(format!("{} IS NULL", field)),
                        FilterOperator::Ne => Ok(format!("{} IS NOT NULL", field)),
                        operator => Err(QueryError::MissingValue {
                            field: field.clone(),
                            operator,
                        }),
                    };
                }
                params.push(value);
                Ok(format!("{} {} ${}", field, self.operator.to_sql(), params.len()))
            }
        }
    }

    fn coerce(&self, field_type: FieldType, value: &PostgresValue) -> Result<PostgresValue, QueryError> {
        field_type
            .coerce(value)
            .ok_or_else(|| QueryError::InvalidValue {
                field: self.field.clone(),
                expected: field_type,
                found: value.type_name(),
            })
    }
}
