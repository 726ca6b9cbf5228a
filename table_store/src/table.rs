//! Table model and single-row operations
//!
//! A [`Table`] is declared once at startup from an ordered list of
//! [`Field`]s, then [`Table::build`] generates its SQL. After that the model
//! is read-only and can be shared (`Arc<Table<T>>`) by any number of
//! concurrent callers; per-call values come from a [`Record`].

use crate::errors::{ErrorMap, GenerateError, StoreError};
use crate::executor::{Executor, FromPgRow};
use crate::field::Field;
use crate::query::QueryParameters;
use crate::selector::Selector;
use crate::sql_generation::{allocate, Operation};
use std::collections::{BTreeMap, HashMap};
use type_mapping::PostgresValue;

/// Source of per-call column values
pub trait Record {
    /// Value for `column` (identifier quotes removed), `None` when the record
    /// has no such column
    fn value(&self, column: &str) -> Option<PostgresValue>;
}

impl Record for HashMap<String, PostgresValue> {
    fn value(&self, column: &str) -> Option<PostgresValue> {
        self.get(column).cloned()
    }
}

impl Record for BTreeMap<String, PostgresValue> {
    fn value(&self, column: &str) -> Option<PostgresValue> {
        self.get(column).cloned()
    }
}

/// Per-call options for insert, update and upsert
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueryOptions {
    /// Execute without decoding the returned row
    pub ignore_return: bool,
}

impl QueryOptions {
    pub fn ignore_return(mut self, ignore: bool) -> Self {
        self.ignore_return = ignore;
        self
    }
}

#[derive(Debug, Clone)]
pub struct Table<T> {
    pub(crate) schema: String,
    pub(crate) name: String,
    pub(crate) fields: Vec<Field>,
    /// Raw fragment appended after the FROM clause
    pub(crate) joins: String,
    pub(crate) select_columns: String,
    pub(crate) select_additional_columns: String,
    pub(crate) get_by_id_query: String,
    pub(crate) delete_by_id_query: String,
    pub(crate) insert_query: String,
    pub(crate) update_query: String,
    pub(crate) upsert_query: String,
    pub(crate) selector: Selector<T>,
    pub(crate) error_map: ErrorMap,
    built: bool,
}

impl<T> Table<T> {
    pub fn new(name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            schema: String::new(),
            name: name.into(),
            fields,
            joins: String::new(),
            select_columns: String::new(),
            select_additional_columns: String::new(),
            get_by_id_query: String::new(),
            delete_by_id_query: String::new(),
            insert_query: String::new(),
            update_query: String::new(),
            upsert_query: String::new(),
            selector: Selector::default(),
            error_map: ErrorMap::default(),
            built: false,
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn joins(mut self, joins: impl Into<String>) -> Self {
        self.joins = joins.into();
        self
    }

    /// Replace the generated projection
    pub fn select_columns(mut self, columns: impl Into<String>) -> Self {
        self.select_columns = columns.into();
        self
    }

    /// Extra projection appended after the columns, usually another table's
    /// [`Table::additional_columns`]
    pub fn select_additional_columns(mut self, columns: impl Into<String>) -> Self {
        self.select_additional_columns = columns.into();
        self
    }

    pub fn get_by_id_override(mut self, sql: impl Into<String>) -> Self {
        self.get_by_id_query = sql.into();
        self
    }

    pub fn delete_by_id_override(mut self, sql: impl Into<String>) -> Self {
        self.delete_by_id_query = sql.into();
        self
    }

    pub fn insert_override(mut self, sql: impl Into<String>) -> Self {
        self.insert_query = sql.into();
        self
    }

    pub fn update_override(mut self, sql: impl Into<String>) -> Self {
        self.update_query = sql.into();
        self
    }

    pub fn upsert_override(mut self, sql: impl Into<String>) -> Self {
        self.upsert_query = sql.into();
        self
    }

    /// Configure listing. An empty selector query is filled by `build()`.
    pub fn with_selector(mut self, selector: Selector<T>) -> Self {
        self.selector = selector;
        self
    }

    /// Driver error translation for this table and its selector. `build()`
    /// hands the map to the selector, whichever order the builders ran in.
    pub fn with_error_map(mut self, error_map: ErrorMap) -> Self {
        self.error_map = error_map;
        self
    }

    /// Generate every SQL string not supplied by the caller.
    ///
    /// Tables without identity fields build, but their single-row
    /// statements stay empty and those operations fail with
    /// [`GenerateError::NoIdentity`]. Likewise a table with no update
    /// template leaves update and upsert empty, and they fail with
    /// [`GenerateError::NoUpdateColumns`].
    pub fn build(mut self) -> Result<Self, GenerateError> {
        if self.name.is_empty() {
            return Err(GenerateError::EmptyName);
        }
        if self.select_columns.is_empty() {
            self.select_columns = self.generate_select_fields();
        }

        if self.insert_query.is_empty() {
            self.insert_query = self.generate_insert_query()?;
        }
        if self.has_identity() {
            if self.get_by_id_query.is_empty() {
                self.get_by_id_query = self.generate_get_by_id_query();
            }
            if self.delete_by_id_query.is_empty() {
                self.delete_by_id_query = self.generate_delete_by_id_query();
            }
            if self.update_query.is_empty() && self.has_update_columns() {
                self.update_query = self.generate_update_query()?;
            }
            if self.upsert_query.is_empty() && self.has_update_columns() {
                self.upsert_query = self.generate_upsert_query()?;
            }
        }
        if self.selector.query.is_empty() {
            self.selector.query = self.generate_selector_query();
        }
        if self.selector.table.is_empty() {
            self.selector.table = self.name.clone();
        }
        self.selector.error_map = self.error_map.clone();

        crate::debug_log!("[{}] get_by_id: {}", self.name, self.get_by_id_query);
        crate::debug_log!("[{}] delete_by_id: {}", self.name, self.delete_by_id_query);
        crate::debug_log!("[{}] insert: {}", self.name, self.insert_query);
        crate::debug_log!("[{}] update: {}", self.name, self.update_query);
        crate::debug_log!("[{}] upsert: {}", self.name, self.upsert_query);
        crate::debug_log!("[{}] select: {}", self.name, self.selector.query);

        self.built = true;
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn schema_name(&self) -> &str {
        &self.schema
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    pub fn get_by_id_query(&self) -> &str {
        &self.get_by_id_query
    }

    pub fn delete_by_id_query(&self) -> &str {
        &self.delete_by_id_query
    }

    pub fn insert_query(&self) -> &str {
        &self.insert_query
    }

    pub fn update_query(&self) -> &str {
        &self.update_query
    }

    pub fn upsert_query(&self) -> &str {
        &self.upsert_query
    }

    pub fn selector(&self) -> &Selector<T> {
        &self.selector
    }

    fn has_identity(&self) -> bool {
        self.fields.iter().any(|f| f.identity)
    }

    fn identity_count(&self) -> usize {
        self.fields.iter().filter(|f| f.identity).count()
    }

    fn ensure_built(&self) -> Result<(), StoreError> {
        if !self.built {
            return Err(GenerateError::NotBuilt {
                table: self.name.clone(),
            }
            .into());
        }
        Ok(())
    }

    /// Cached SQL for `op`
    fn statement(&self, op: Operation) -> Result<&str, StoreError> {
        self.ensure_built()?;
        let sql = match op {
            Operation::GetById => &self.get_by_id_query,
            Operation::DeleteById => &self.delete_by_id_query,
            Operation::Insert => &self.insert_query,
            Operation::Update => &self.update_query,
            Operation::Upsert => &self.upsert_query,
        };
        if sql.is_empty() {
            let table = self.name.clone();
            let err = if self.has_identity() {
                GenerateError::NoUpdateColumns { table }
            } else {
                GenerateError::NoIdentity { table }
            };
            return Err(err.into());
        }
        Ok(sql)
    }

    /// Parameter list for `op` in slot order, read from `record` by column
    /// name. A `Null` for a field with a known type becomes a typed null.
    pub fn params<R: Record + ?Sized>(&self, op: Operation, record: &R) -> Result<Vec<PostgresValue>, StoreError> {
        let slots = allocate(&self.fields, op);
        let mut params = Vec::with_capacity(slots.len());
        for (field, slot) in self.fields.iter().zip(slots) {
            let Some(slot) = slot else {
                continue;
            };
            let value = record.value(field.bare_name()).ok_or_else(|| StoreError::MissingValue {
                table: self.name.clone(),
                column: field.name.clone(),
            })?;
            let value = match (value, field.null_type()) {
                (PostgresValue::Null, Some(ty)) => PostgresValue::TypedNull(ty),
                (value, _) => value,
            };
            params.push((slot, value));
        }
        params.sort_by_key(|(slot, _)| *slot);
        Ok(params.into_iter().map(|(_, value)| value).collect())
    }

    fn check_identity(&self, operation: &'static str, ids: &[PostgresValue]) -> Result<(), StoreError> {
        let expected = self.identity_count();
        if ids.len() != expected {
            return Err(StoreError::InvalidArguments {
                operation,
                table: self.name.clone(),
                message: format!("expected {} identity values, got {}", expected, ids.len()),
            });
        }
        Ok(())
    }

    fn post_process(&self, mut record: T) -> Result<T, StoreError> {
        if let Some(hook) = &self.selector.post_process_record {
            hook(&mut record).map_err(|e| StoreError::post_process(&self.name, "record", e))?;
        }
        Ok(record)
    }
}

impl<T: FromPgRow> Table<T> {
    /// Fetch one row by its identity values, in identity declaration order
    pub async fn get<E: Executor>(&self, exec: &E, ids: &[PostgresValue]) -> Result<T, StoreError> {
        let sql = self.statement(Operation::GetById)?;
        self.check_identity("get", ids)?;

        let record = exec
            .fetch_one(sql, ids)
            .await
            .map_err(|e| self.error_map.translate(e, "get", &self.name))?;
        self.post_process(record)
    }

    /// Fetch one row where each of `columns` equals the matching value
    pub async fn get_by_fields<E: Executor>(
        &self,
        exec: &E,
        columns: &[&str],
        values: &[PostgresValue],
    ) -> Result<T, StoreError> {
        self.ensure_built()?;
        if columns.is_empty() || columns.len() != values.len() {
            return Err(StoreError::InvalidArguments {
                operation: "get_by_fields",
                table: self.name.clone(),
                message: format!("{} columns for {} values", columns.len(), values.len()),
            });
        }

        let sql = self.generate_get_by_fields_query(columns);
        crate::trace_log!("[{}] get_by_fields: {}", self.name, sql);
        let record = exec
            .fetch_one(&sql, values)
            .await
            .map_err(|e| self.error_map.translate(e, "get_by_fields", &self.name))?;
        self.post_process(record)
    }

    /// Delete by identity values, returning the number of rows removed
    pub async fn delete<E: Executor>(&self, exec: &E, ids: &[PostgresValue]) -> Result<u64, StoreError> {
        let sql = self.statement(Operation::DeleteById)?;
        self.check_identity("delete", ids)?;

        exec.execute(sql, ids)
            .await
            .map_err(|e| self.error_map.translate(e, "delete", &self.name))
    }

    pub async fn insert<E, R>(&self, exec: &E, record: &R) -> Result<T, StoreError>
    where
        E: Executor,
        R: Record + Sync + ?Sized,
    {
        self.write(exec, Operation::Insert, record).await
    }

    pub async fn update<E, R>(&self, exec: &E, record: &R) -> Result<T, StoreError>
    where
        E: Executor,
        R: Record + Sync + ?Sized,
    {
        self.write(exec, Operation::Update, record).await
    }

    pub async fn upsert<E, R>(&self, exec: &E, record: &R) -> Result<T, StoreError>
    where
        E: Executor,
        R: Record + Sync + ?Sized,
    {
        self.write(exec, Operation::Upsert, record).await
    }

    /// Insert; `None` when `options.ignore_return` is set
    pub async fn insert_with<E, R>(&self, exec: &E, record: &R, options: &QueryOptions) -> Result<Option<T>, StoreError>
    where
        E: Executor,
        R: Record + Sync + ?Sized,
    {
        self.write_with(exec, Operation::Insert, record, options).await
    }

    pub async fn update_with<E, R>(&self, exec: &E, record: &R, options: &QueryOptions) -> Result<Option<T>, StoreError>
    where
        E: Executor,
        R: Record + Sync + ?Sized,
    {
        self.write_with(exec, Operation::Update, record, options).await
    }

    pub async fn upsert_with<E, R>(&self, exec: &E, record: &R, options: &QueryOptions) -> Result<Option<T>, StoreError>
    where
        E: Executor,
        R: Record + Sync + ?Sized,
    {
        self.write_with(exec, Operation::Upsert, record, options).await
    }

    /// List rows through the embedded selector
    pub async fn select<E: Executor>(
        &self,
        exec: &E,
        params: &QueryParameters,
    ) -> Result<(Vec<T>, Option<i64>), StoreError> {
        self.ensure_built()?;
        self.selector.select(exec, params).await
    }

    pub async fn select_first<E: Executor>(&self, exec: &E, params: &QueryParameters) -> Result<T, StoreError> {
        self.ensure_built()?;
        self.selector.select_first(exec, params).await
    }

    async fn write<E, R>(&self, exec: &E, op: Operation, record: &R) -> Result<T, StoreError>
    where
        E: Executor,
        R: Record + Sync + ?Sized,
    {
        let sql = self.statement(op)?;
        let params = self.params(op, record)?;
        crate::trace_log!("[{}] {}: {} ({} params)", self.name, op.as_str(), sql, params.len());

        let row = exec
            .fetch_one(sql, &params)
            .await
            .map_err(|e| self.error_map.translate(e, op.as_str(), &self.name))?;
        self.post_process(row)
    }

    async fn write_with<E, R>(
        &self,
        exec: &E,
        op: Operation,
        record: &R,
        options: &QueryOptions,
    ) -> Result<Option<T>, StoreError>
    where
        E: Executor,
        R: Record + Sync + ?Sized,
    {
        if !options.ignore_return {
            return self.write(exec, op, record).await.map(Some);
        }

        let sql = self.statement(op)?;
        let params = self.params(op, record)?;
        crate::trace_log!("[{}] {} (ignore return): {}", self.name, op.as_str(), sql);

        exec.execute(sql, &params)
            .await
            .map_err(|e| self.error_map.translate(e, op.as_str(), &self.name))?;
        Ok(None)
    }
}
