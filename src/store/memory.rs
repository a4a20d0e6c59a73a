//! In-process store evaluating queries over JSON rows.
//!
//! Backs the test suite and the `--fixture` mode of the binary.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};

use super::{Filter, PremiumStore, Query, Table};
use crate::error::{McpError, Result};

/// Fixture file layout: one array of row objects per table.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Fixture {
    premiums: Vec<JsonValue>,
    insurers: Vec<JsonValue>,
    locations: Vec<JsonValue>,
}

/// Store holding all rows in memory.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    tables: HashMap<Table, Vec<JsonValue>>,
    failure: Option<String>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load rows from a JSON fixture file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            McpError::Config(format!("cannot read fixture {}: {}", path.display(), e))
        })?;
        let fixture: Fixture = serde_json::from_str(&contents).map_err(|e| {
            McpError::Config(format!("invalid fixture {}: {}", path.display(), e))
        })?;

        Ok(Self::new()
            .with_rows(Table::Premiums, fixture.premiums)
            .with_rows(Table::Insurers, fixture.insurers)
            .with_rows(Table::Locations, fixture.locations))
    }

    /// Append rows to a table.
    pub fn with_rows(mut self, table: Table, rows: Vec<JsonValue>) -> Self {
        self.tables.entry(table).or_default().extend(rows);
        self
    }

    /// Make every request fail with a store error carrying `message`.
    pub fn failing(mut self, message: &str) -> Self {
        self.failure = Some(message.to_string());
        self
    }

    fn check_failure(&self) -> Result<()> {
        match &self.failure {
            Some(message) => Err(McpError::Store {
                code: "FIXTURE".to_string(),
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn matching<'a>(&'a self, table: Table, query: &'a Query) -> impl Iterator<Item = &'a JsonValue> {
        self.tables
            .get(&table)
            .into_iter()
            .flatten()
            .filter(move |row| query.filters.iter().all(|f| matches(row, f)))
    }
}

/// Textual form of a scalar cell, matching how filter values are written.
fn cell_text(value: &JsonValue) -> Option<String> {
    match value {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        JsonValue::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn compare_text(cell: &JsonValue, value: &str) -> Option<Ordering> {
    if let (Some(a), Ok(b)) = (cell.as_f64(), value.parse::<f64>()) {
        return a.partial_cmp(&b);
    }
    cell_text(cell).map(|a| a.as_str().cmp(value))
}

fn matches(row: &JsonValue, filter: &Filter) -> bool {
    let Some(cell) = row.get(filter.column()) else {
        return false;
    };
    match filter {
        Filter::Eq(_, value) => compare_text(cell, value) == Some(Ordering::Equal),
        Filter::In(_, values) => values
            .iter()
            .any(|v| compare_text(cell, v) == Some(Ordering::Equal)),
        Filter::Gte(_, value) => {
            matches!(compare_text(cell, value), Some(Ordering::Greater | Ordering::Equal))
        }
        Filter::Lte(_, value) => {
            matches!(compare_text(cell, value), Some(Ordering::Less | Ordering::Equal))
        }
    }
}

fn compare_cells(a: Option<&JsonValue>, b: Option<&JsonValue>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
            _ => cell_text(a).cmp(&cell_text(b)),
        },
        // nulls sort last
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn project(row: &JsonValue, columns: &[String]) -> JsonValue {
    if columns.is_empty() || columns.iter().any(|c| c == "*") {
        return row.clone();
    }
    let mut out = Map::new();
    for column in columns {
        if let Some(value) = row.get(column) {
            out.insert(column.clone(), value.clone());
        }
    }
    JsonValue::Object(out)
}

#[async_trait]
impl PremiumStore for MemoryStore {
    async fn select(&self, table: Table, query: &Query) -> Result<Vec<JsonValue>> {
        self.check_failure()?;

        let mut rows: Vec<&JsonValue> = self.matching(table, query).collect();
        if let Some(order) = &query.order {
            // stable sort keeps insertion order among equal keys
            rows.sort_by(|a, b| {
                let ord = compare_cells(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(rows
            .into_iter()
            .take(limit)
            .map(|row| project(row, &query.columns))
            .collect())
    }

    async fn count(&self, table: Table, query: &Query) -> Result<u64> {
        self.check_failure()?;
        Ok(self.matching(table, query).count() as u64)
    }
}
