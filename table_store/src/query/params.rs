//! Caller-supplied listing parameters

use super::filter::Filter;
use super::ordering::{SortField, SortOrder};
use serde::{Deserialize, Serialize};

/// Filter, sort and pagination for one listing call.
///
/// `limit` and `offset` are written into the SQL as integer literals when
/// positive; zero or negative values mean "not set".
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryParameters {
    /// Conditions ANDed together
    pub filter: Vec<Filter>,
    pub sort: Vec<SortField>,
    pub limit: i64,
    pub offset: i64,
}

impl QueryParameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a filter condition
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter.push(filter);
        self
    }

    /// Add ordering
    pub fn order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.sort.push(SortField::new(field, order));
        self
    }

    /// Add limit
    pub fn limit(mut self, limit: i64) -> Self {
        self.limit = limit;
        self
    }

    /// Add offset
    pub fn offset(mut self, offset: i64) -> Self {
        self.offset = offset;
        self
    }

    /// Cap the page size at `max`; an unset limit becomes `max`
    pub fn clamp_limit(mut self, max: Option<i64>) -> Self {
        if let Some(max) = max {
            if self.limit <= 0 || self.limit > max {
                self.limit = max;
            }
        }
        self
    }
}
