//! Filtered, sorted and paginated listing
//!
//! A [`Selector`] wraps a base `SELECT` and composes caller-supplied
//! [`QueryParameters`] onto it. Filters and sort fields are checked against
//! the selector's allow-lists before anything is sent to the database.

use crate::errors::{ErrorMap, StoreError};
use crate::executor::{Executor, FromPgRow};
use crate::query::{filter_query, sort_query, FilterFields, QueryParameters, SortField, SortFields};
use std::fmt;
use std::sync::Arc;
use type_mapping::{FieldType, PostgresValue};

/// Per-record transformation run after decoding
pub type RecordHook<T> = Arc<dyn Fn(&mut T) -> anyhow::Result<()> + Send + Sync>;

/// Whole-result transformation run after every record hook
pub type RecordsHook<T> = Arc<dyn Fn(&mut [T]) -> anyhow::Result<()> + Send + Sync>;

pub struct Selector<T> {
    pub(crate) table: String,
    /// The base query
    pub(crate) query: String,
    /// Skip the count query
    pub(crate) omit_count: bool,
    /// Query used for counts instead of the filtered base query. It receives
    /// the same filter parameters.
    pub(crate) count_query: String,
    pub(crate) filter_fields: FilterFields,
    pub(crate) sort_fields: SortFields,
    /// Used when the caller supplies no sort
    pub(crate) default_sort: Vec<SortField>,
    pub(crate) post_process_record: Option<RecordHook<T>>,
    pub(crate) post_process_records: Option<RecordsHook<T>>,
    pub(crate) error_map: ErrorMap,
}

impl<T> Clone for Selector<T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table.clone(),
            query: self.query.clone(),
            omit_count: self.omit_count,
            count_query: self.count_query.clone(),
            filter_fields: self.filter_fields.clone(),
            sort_fields: self.sort_fields.clone(),
            default_sort: self.default_sort.clone(),
            post_process_record: self.post_process_record.clone(),
            post_process_records: self.post_process_records.clone(),
            error_map: self.error_map.clone(),
        }
    }
}

impl<T> fmt::Debug for Selector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Selector")
            .field("table", &self.table)
            .field("query", &self.query)
            .field("omit_count", &self.omit_count)
            .field("count_query", &self.count_query)
            .field("filter_fields", &self.filter_fields)
            .field("sort_fields", &self.sort_fields)
            .field("default_sort", &self.default_sort)
            .field("has_post_process_record", &self.post_process_record.is_some())
            .field("has_post_process_records", &self.post_process_records.is_some())
            .finish()
    }
}

impl<T> Default for Selector<T> {
    fn default() -> Self {
        Self::new("")
    }
}

impl<T> Selector<T> {
    /// Selector over an explicit base query
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            table: String::new(),
            query: query.into(),
            omit_count: false,
            count_query: String::new(),
            filter_fields: FilterFields::new(),
            sort_fields: SortFields::new(),
            default_sort: Vec::new(),
            post_process_record: None,
            post_process_records: None,
            error_map: ErrorMap::default(),
        }
    }

    /// Name used in error context
    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = table.into();
        self
    }

    pub fn omit_count(mut self, omit: bool) -> Self {
        self.omit_count = omit;
        self
    }

    pub fn count_query(mut self, query: impl Into<String>) -> Self {
        self.count_query = query.into();
        self
    }

    /// Allow filtering on `field`, typechecked as `field_type`
    pub fn filter_field(mut self, field: impl Into<String>, field_type: FieldType) -> Self {
        self.filter_fields.insert(field.into(), field_type);
        self
    }

    /// Allow sorting on `field`
    pub fn sort_field(mut self, field: impl Into<String>) -> Self {
        self.sort_fields.insert(field.into());
        self
    }

    pub fn default_sort(mut self, sort: Vec<SortField>) -> Self {
        self.default_sort = sort;
        self
    }

    pub fn post_process_record<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut T) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.post_process_record = Some(Arc::new(hook));
        self
    }

    pub fn post_process_records<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut [T]) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.post_process_records = Some(Arc::new(hook));
        self
    }

    /// Driver error translation for a standalone selector. A table's own map
    /// replaces it when the table is built.
    pub fn with_error_map(mut self, error_map: ErrorMap) -> Self {
        self.error_map = error_map;
        self
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Base query plus ` WHERE <filters>` when any filter is present
    fn filtered(&self, params: &QueryParameters) -> Result<(String, Vec<PostgresValue>), StoreError> {
        let mut query = String::with_capacity(self.query.len() + 64);
        let mut values = Vec::new();
        query.push_str(&self.query);

        if !params.filter.is_empty() {
            let mut predicate = String::new();
            filter_query(&self.filter_fields, &params.filter, &mut predicate, &mut values)
                .map_err(|e| StoreError::query(&self.table, e))?;
            // Only empty groups
            if !predicate.is_empty() {
                query.push_str(" WHERE ");
                query.push_str(&predicate);
            }
        }
        Ok((query, values))
    }

    fn sorted(&self, params: &QueryParameters, query: &mut String) -> Result<(), StoreError> {
        let sort = if params.sort.is_empty() {
            &self.default_sort
        } else {
            &params.sort
        };
        sort_query(&self.sort_fields, sort, query).map_err(|e| StoreError::query(&self.table, e))
    }
}

impl<T: FromPgRow> Selector<T> {
    /// Fetch the records matching `params`.
    ///
    /// Unless counting is omitted, the total number of matching rows
    /// (ignoring pagination) is returned alongside them.
    pub async fn select<E: Executor>(
        &self,
        exec: &E,
        params: &QueryParameters,
    ) -> Result<(Vec<T>, Option<i64>), StoreError> {
        let (mut query, values) = self.filtered(params)?;

        // Validate the sort before any statement is issued
        let mut order = String::new();
        self.sorted(params, &mut order)?;

        let count = if self.omit_count {
            None
        } else {
            let mut count_query = String::from("SELECT COUNT(*) FROM (");
            if self.count_query.is_empty() {
                count_query.push_str(&query);
            } else {
                count_query.push_str(&self.count_query);
            }
            count_query.push_str(") AS _count_query");

            let (count,): (i64,) = exec
                .fetch_one(&count_query, &values)
                .await
                .map_err(|e| self.error_map.translate(e, "count", &self.table))?;
            Some(count)
        };

        query.push_str(&order);
        if params.limit > 0 {
            query.push_str(" LIMIT ");
            query.push_str(&params.limit.to_string());
        }
        if params.offset > 0 {
            query.push_str(" OFFSET ");
            query.push_str(&params.offset.to_string());
        }

        crate::debug_log!("[{}] select: {} ({} params)", self.table, query, values.len());
        let mut records: Vec<T> = exec
            .fetch_all(&query, &values)
            .await
            .map_err(|e| self.error_map.translate(e, "select", &self.table))?;

        if let Some(hook) = &self.post_process_record {
            for record in records.iter_mut() {
                hook(record).map_err(|e| StoreError::post_process(&self.table, "record", e))?;
            }
        }
        if let Some(hook) = &self.post_process_records {
            hook(&mut records).map_err(|e| StoreError::post_process(&self.table, "records", e))?;
        }

        Ok((records, count))
    }

    /// Fetch the first record matching `params`; never counts
    pub async fn select_first<E: Executor>(&self, exec: &E, params: &QueryParameters) -> Result<T, StoreError> {
        let (mut query, values) = self.filtered(params)?;
        self.sorted(params, &mut query)?;
        query.push_str(" LIMIT 1");

        crate::debug_log!("[{}] select_first: {} ({} params)", self.table, query, values.len());
        let mut record: T = exec
            .fetch_one(&query, &values)
            .await
            .map_err(|e| self.error_map.translate(e, "select_first", &self.table))?;

        if let Some(hook) = &self.post_process_record {
            hook(&mut record).map_err(|e| StoreError::post_process(&self.table, "record", e))?;
        }
        Ok(record)
    }
}
