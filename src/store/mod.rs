//! Read-only access to the premium data store.
//!
//! Operations describe what they need as a [`Query`]; a [`PremiumStore`]
//! backend turns it into rows or a row count.

mod memory;
mod supabase;

pub use memory::MemoryStore;
pub use supabase::{StoreConfig, SupabaseStore};

use std::fmt;

use async_trait::async_trait;
use serde_json::Value as JsonValue;

use crate::error::Result;

/// Collections exposed by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    /// Premium rows
    Premiums,
    /// Insurer master data
    Insurers,
    /// Postal code / municipality entries
    Locations,
}

impl Table {
    /// Table name on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Table::Premiums => "premiums",
            Table::Insurers => "insurers",
            Table::Locations => "locations",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single column predicate. Values are kept in their textual form.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// column = value
    Eq(String, String),
    /// column in (values)
    In(String, Vec<String>),
    /// column >= value
    Gte(String, String),
    /// column <= value
    Lte(String, String),
}

impl Filter {
    /// Column the predicate applies to.
    pub fn column(&self) -> &str {
        match self {
            Filter::Eq(c, _) | Filter::In(c, _) | Filter::Gte(c, _) | Filter::Lte(c, _) => c,
        }
    }
}

/// Ordering on one column.
#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    /// Column to sort on
    pub column: String,
    /// Ascending when true
    pub ascending: bool,
}

/// Filtered, ordered and limited selection over one table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Query {
    /// Selected columns, `*` when empty
    pub columns: Vec<String>,
    /// Conjunction of predicates
    pub filters: Vec<Filter>,
    /// Optional ordering
    pub order: Option<Order>,
    /// Optional row limit
    pub limit: Option<usize>,
}

impl Query {
    /// Empty query (all rows, all columns).
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the selected columns.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Add an equality predicate.
    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push(Filter::Eq(column.to_string(), value.to_string()));
        self
    }

    /// Add a set-membership predicate.
    pub fn is_in<I, T>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: ToString,
    {
        self.filters.push(Filter::In(
            column.to_string(),
            values.into_iter().map(|v| v.to_string()).collect(),
        ));
        self
    }

    /// Add a lower bound predicate.
    pub fn gte(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push(Filter::Gte(column.to_string(), value.to_string()));
        self
    }

    /// Add an upper bound predicate.
    pub fn lte(mut self, column: &str, value: impl ToString) -> Self {
        self.filters
            .push(Filter::Lte(column.to_string(), value.to_string()));
        self
    }

    /// Order by one column.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    /// Cap the number of returned rows.
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// Read-only premium data backend.
#[async_trait]
pub trait PremiumStore: Send + Sync {
    /// Fetch the rows matching `query`.
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<JsonValue>>;

    /// Count the rows matching `query`; columns, order and limit are ignored.
    async fn count(&self, table: Table, query: &Query) -> Result<u64>;
}
