//! Column descriptors
//!
//! A [`Field`] describes one column of a table model: whether it belongs to
//! the identity key, how it is written on insert and update, and whether it
//! binds a parameter.

use type_mapping::{FieldType, PostgresValue};

/// Placeholder token in insert/update templates, replaced by the field's
/// positional parameter marker (`$n`) at generation time
pub const VALUE: &str = "{value}";

#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    /// Column identifier
    pub name: String,
    /// Part of the identity (primary key) predicate
    pub identity: bool,
    /// Insert value template, empty when the column is not inserted
    pub insert: String,
    /// Update value template, empty when the column is not updated
    pub update: String,
    /// Presence means the field binds a parameter
    pub value: Option<PostgresValue>,
    /// Literal used when the column is projected through `COALESCE`
    pub null_default: Option<PostgresValue>,
    /// Column type, used to bind `NULL` values with the right parameter type
    pub column_type: Option<FieldType>,
}

impl Field {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            identity: false,
            insert: String::new(),
            update: String::new(),
            value: None,
            null_default: None,
            column_type: None,
        }
    }

    /// An identity column that binds a value
    pub fn id(name: impl Into<String>) -> Self {
        Self::new(name).identity().bind(PostgresValue::Null)
    }

    /// A regular column inserted and updated directly from its bound value
    pub fn column(name: impl Into<String>) -> Self {
        Self::new(name).insert(VALUE).update(VALUE).bind(PostgresValue::Null)
    }

    pub fn identity(mut self) -> Self {
        self.identity = true;
        self
    }

    pub fn insert(mut self, template: impl Into<String>) -> Self {
        self.insert = template.into();
        self
    }

    pub fn update(mut self, template: impl Into<String>) -> Self {
        self.update = template.into();
        self
    }

    /// Mark the field as binding a parameter. The value itself is only a
    /// sample at model-build time; call-time values come from the record.
    pub fn bind(mut self, value: impl Into<PostgresValue>) -> Self {
        self.value = Some(value.into());
        self
    }

    pub fn null_default(mut self, value: impl Into<PostgresValue>) -> Self {
        self.null_default = Some(value.into());
        self
    }

    pub fn typed(mut self, column_type: FieldType) -> Self {
        self.column_type = Some(column_type);
        self
    }

    /// Type for a `NULL` bound to this field: the declared type, else the
    /// type of the sample value
    pub(crate) fn null_type(&self) -> Option<FieldType> {
        self.column_type.or_else(|| self.value.as_ref().and_then(FieldType::of))
    }

    /// Whether the field consumes a parameter slot when referenced
    pub fn binds(&self) -> bool {
        self.value.is_some()
    }

    /// Name with surrounding identifier quotes removed, for aliases
    pub(crate) fn bare_name(&self) -> &str {
        self.name.trim_matches('"')
    }
}
