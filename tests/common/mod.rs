//! Shared test fixtures: a recording in-memory executor and a sample record

#![allow(dead_code)]

use async_trait::async_trait;
use pgtable::prelude::*;
use std::any::Any;
use std::borrow::Cow;
use std::collections::VecDeque;
use std::fmt;
use std::sync::Mutex;

/// One statement seen by the executor
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub sql: String,
    pub params: Vec<PostgresValue>,
}

type Response = Result<Box<dyn Any + Send>, sqlx::Error>;

/// Executor that records statements and replays queued responses in order.
///
/// `fetch_one` expects a queued `R`, `fetch_all` a `Vec<R>` and `execute`
/// a `u64`.
#[derive(Default)]
pub struct MockExecutor {
    calls: Mutex<Vec<Call>>,
    responses: Mutex<VecDeque<Response>>,
}

impl MockExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond<V: Any + Send>(self, value: V) -> Self {
        self.responses.lock().unwrap().push_back(Ok(Box::new(value)));
        self
    }

    pub fn fail(self, err: sqlx::Error) -> Self {
        self.responses.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, method: &'static str, sql: &str, params: &[PostgresValue]) {
        self.calls.lock().unwrap().push(Call {
            method,
            sql: sql.to_string(),
            params: params.to_vec(),
        });
    }

    fn next<V: Any>(&self) -> Result<V, sqlx::Error> {
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| sqlx::Error::Protocol("no response queued".to_string()))?;
        let value = response?;
        value
            .downcast::<V>()
            .map(|v| *v)
            .map_err(|_| sqlx::Error::Protocol("queued response has the wrong type".to_string()))
    }
}

#[async_trait]
impl Executor for MockExecutor {
    async fn fetch_one<R: FromPgRow>(&self, sql: &str, params: &[PostgresValue]) -> Result<R, sqlx::Error> {
        self.record("fetch_one", sql, params);
        self.next::<R>()
    }

    async fn fetch_all<R: FromPgRow>(&self, sql: &str, params: &[PostgresValue]) -> Result<Vec<R>, sqlx::Error> {
        self.record("fetch_all", sql, params);
        self.next::<Vec<R>>()
    }

    async fn execute(&self, sql: &str, params: &[PostgresValue]) -> Result<u64, sqlx::Error> {
        self.record("execute", sql, params);
        self.next::<u64>()
    }
}

#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
}

impl User {
    pub fn new(id: i64, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

impl Record for User {
    fn value(&self, column: &str) -> Option<PostgresValue> {
        match column {
            "id" => Some(self.id.into()),
            "name" => Some(self.name.clone().into()),
            _ => None,
        }
    }
}

pub fn users() -> Table<User> {
    Table::new("users", vec![Field::id("id"), Field::column("name")])
        .with_selector(
            Selector::default()
                .filter_field("users.name", FieldType::Text)
                .filter_field("users.id", FieldType::Integer)
                .sort_field("users.name")
                .sort_field("users.id"),
        )
        .build()
        .unwrap()
}

/// Driver error carrying a SQLSTATE code
#[derive(Debug)]
pub struct CodedError(pub &'static str);

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

pub fn coded(code: &'static str) -> sqlx::Error {
    sqlx::Error::Database(Box::new(CodedError(code)))
}
