//! Error types and driver error translation
//!
//! Storage failures are classified into a small closed set of [`ErrorKind`]s
//! so callers can branch on them without knowing driver error codes.

use crate::query::QueryError;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Domain error kinds callers branch on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    Duplicate,
    ForeignKey,
    Incomplete,
    Invalid,
    Query,
    Unknown,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::Duplicate => "duplicate",
            ErrorKind::ForeignKey => "foreign key",
            ErrorKind::Incomplete => "incomplete",
            ErrorKind::Invalid => "invalid",
            ErrorKind::Query => "query",
            ErrorKind::Unknown => "unknown",
        };
        f.write_str(name)
    }
}

/// Failures while generating statements from a table model
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    #[error("Table name cannot be empty")]
    EmptyName,

    #[error("Table {table} has no identity field")]
    NoIdentity { table: String },

    #[error("Field {table}.{field} references the value placeholder but binds no value")]
    UnboundPlaceholder { table: String, field: String },

    #[error("Table {table} has no updatable field")]
    NoUpdateColumns { table: String },

    #[error("Table {table} has not been built")]
    NotBuilt { table: String },
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{operation} on {table} failed ({kind}): {source}")]
    Database {
        kind: ErrorKind,
        operation: &'static str,
        table: String,
        #[source]
        source: sqlx::Error,
    },

    #[error("Invalid query on {table}: {source}")]
    Query {
        table: String,
        #[source]
        source: QueryError,
    },

    #[error("{operation} on {table}: {message}")]
    InvalidArguments {
        operation: &'static str,
        table: String,
        message: String,
    },

    #[error("Record has no value for {table}.{column}")]
    MissingValue { table: String, column: String },

    #[error("Post process {hook} error on {table}: {source}")]
    PostProcess {
        hook: &'static str,
        table: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error(transparent)]
    Generate(#[from] GenerateError),
}

impl StoreError {
    /// Domain classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Database { kind, .. } => *kind,
            StoreError::Query { .. } | StoreError::Generate(_) => ErrorKind::Query,
            StoreError::InvalidArguments { .. } | StoreError::MissingValue { .. } => {
                ErrorKind::Invalid
            }
            StoreError::PostProcess { .. } => ErrorKind::Unknown,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    pub(crate) fn query(table: &str, source: QueryError) -> Self {
        StoreError::Query {
            table: table.to_string(),
            source,
        }
    }

    pub(crate) fn post_process(table: &str, hook: &'static str, source: anyhow::Error) -> Self {
        StoreError::PostProcess {
            hook,
            table: table.to_string(),
            source: source.into(),
        }
    }
}

/// Lookup of driver error codes to domain error kinds.
///
/// The default is the PostgreSQL SQLSTATE table. Other backends (or
/// deployments with custom constraint triggers) can supply their own codes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorMap {
    codes: HashMap<String, ErrorKind>,
}

impl ErrorMap {
    /// A map with no codes; only the no-rows sentinel is translated
    pub fn empty() -> Self {
        Self {
            codes: HashMap::new(),
        }
    }

    /// PostgreSQL integrity constraint violation codes
    pub fn postgres() -> Self {
        Self::empty()
            .with_code("23502", ErrorKind::Incomplete) // not_null_violation
            .with_code("23503", ErrorKind::ForeignKey) // foreign_key_violation
            .with_code("23505", ErrorKind::Duplicate) // unique_violation
            .with_code("23514", ErrorKind::Invalid) // check_violation
    }

    pub fn with_code(mut self, code: &str, kind: ErrorKind) -> Self {
        self.codes.insert(code.to_string(), kind);
        self
    }

    pub fn kind_for_code(&self, code: &str) -> Option<ErrorKind> {
        self.codes.get(code).copied()
    }

    /// Classify a driver error; unrecognised errors are `Unknown`
    pub fn classify(&self, err: &sqlx::Error) -> ErrorKind {
        match err {
            sqlx::Error::RowNotFound => ErrorKind::NotFound,
            sqlx::Error::Database(db_err) => db_err
                .code()
                .and_then(|code| self.kind_for_code(&code))
                .unwrap_or(ErrorKind::Unknown),
            _ => ErrorKind::Unknown,
        }
    }

    /// Wrap a driver error with its classification and call context
    pub fn translate(&self, err: sqlx::Error, operation: &'static str, table: &str) -> StoreError {
        let kind = self.classify(&err);
        crate::debug_log!("[{}] {} failed ({}): {}", table, operation, kind, err);
        StoreError::Database {
            kind,
            operation,
            table: table.to_string(),
            source: err,
        }
    }
}

impl Default for ErrorMap {
    fn default() -> Self {
        Self::postgres()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::borrow::Cow;

    /// Minimal driver error carrying a SQLSTATE code
    #[derive(Debug)]
    pub(crate) struct CodedError(pub &'static str);

    impl fmt::Display for CodedError {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "error with code {}", self.0)
        }
    }

    impl std::error::Error for CodedError {}

    impl sqlx::error::DatabaseError for CodedError {
        fn message(&self) -> &str {
            "coded error"
        }

        fn code(&self) -> Option<Cow<'_, str>> {
            Some(Cow::Borrowed(self.0))
        }

        fn as_error(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn as_error_mut(&mut self) -> &mut (dyn std::error::Error + Send + Sync + 'static) {
            self
        }

        fn into_error(self: Box<Self>) -> Box<dyn std::error::Error + Send + Sync + 'static> {
            self
        }

        fn kind(&self) -> sqlx::error::ErrorKind {
            sqlx::error::ErrorKind::Other
        }
    }

    pub(crate) fn coded(code: &'static str) -> sqlx::Error {
        sqlx::Error::Database(Box::new(CodedError(code)))
    }

    #[test]
    fn test_no_rows_is_not_found() {
        let map = ErrorMap::postgres();
        assert_eq!(map.classify(&sqlx::Error::RowNotFound), ErrorKind::NotFound);

        let err = map.translate(sqlx::Error::RowNotFound, "get", "users");
        assert!(err.is_not_found());
        assert!(err.to_string().contains("users"));
    }

    #[test]
    fn test_postgres_codes() {
        let map = ErrorMap::postgres();
        assert_eq!(map.classify(&coded("23502")), ErrorKind::Incomplete);
        assert_eq!(map.classify(&coded("23503")), ErrorKind::ForeignKey);
        assert_eq!(map.classify(&coded("23505")), ErrorKind::Duplicate);
        assert_eq!(map.classify(&coded("23514")), ErrorKind::Invalid);
    }

    #[test]
    fn test_unrecognised_code_passes_through() {
        let map = ErrorMap::postgres();
        let err = map.translate(coded("40P01"), "update", "users");
        assert_eq!(err.kind(), ErrorKind::Unknown);

        match err {
            StoreError::Database { source, .. } => {
                let code = source
                    .as_database_error()
                    .and_then(|e| e.code())
                    .map(|c| c.into_owned());
                assert_eq!(code.as_deref(), Some("40P01"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_injected_codes() {
        let map = ErrorMap::empty().with_code("P0001", ErrorKind::Invalid);
        assert_eq!(map.classify(&coded("P0001")), ErrorKind::Invalid);
        assert_eq!(map.classify(&coded("23505")), ErrorKind::Unknown);
        assert_eq!(map.classify(&sqlx::Error::RowNotFound), ErrorKind::NotFound);
    }

    #[test]
    fn test_non_database_errors_are_unknown() {
        let map = ErrorMap::default();
        assert_eq!(map.classify(&sqlx::Error::PoolTimedOut), ErrorKind::Unknown);
    }
}
