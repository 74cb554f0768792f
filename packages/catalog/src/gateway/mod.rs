//! Remote data gateway: table-scoped queries against the hosted store.
//!
//! Queries are built with [`Query`] and rendered to PostgREST parameters by
//! [`Query::to_params`]. [`rest::RestGateway`] sends them over HTTP;
//! [`memory::MemoryGateway`] evaluates the same filters in-process.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{CatalogError, CatalogResult};

pub mod memory;
pub mod rest;

pub use memory::MemoryGateway;
pub use rest::RestGateway;

/// Table names used by the application
pub mod tables {
    pub const BENEFICIARIES: &str = "beneficiaries";
    pub const PARTNER_FUNDS: &str = "partner_funds";
    pub const PAYMENT_REQUESTS: &str = "kaspi_payment_requests";
}

/// Row predicate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `column = value`
    Eq { column: String, value: String },
    /// `column IN (values)`
    In { column: String, values: Vec<String> },
    /// `column IS NULL`
    IsNull { column: String },
    /// OR of equality clauses
    AnyOf(Vec<(String, String)>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl ToString) -> Self {
        Filter::Eq {
            column: column.into(),
            value: value.to_string(),
        }
    }

    pub fn is_null(column: impl Into<String>) -> Self {
        Filter::IsNull {
            column: column.into(),
        }
    }

    /// Render as a PostgREST query parameter
    pub fn to_param(&self) -> (String, String) {
        match self {
            Filter::Eq { column, value } => (column.clone(), format!("eq.{}", value)),
            Filter::In { column, values } => {
                let list: Vec<String> = values.iter().map(|v| quote_value(v)).collect();
                (column.clone(), format!("in.({})", list.join(",")))
            }
            Filter::IsNull { column } => (column.clone(), "is.null".to_string()),
            Filter::AnyOf(clauses) => {
                let list: Vec<String> = clauses
                    .iter()
                    .map(|(column, value)| format!("{}.eq.{}", column, quote_value(value)))
                    .collect();
                ("or".to_string(), format!("({})", list.join(",")))
            }
        }
    }
}

/// Values inside `in.(...)` and `or=(...)` lists must be quoted when they
/// contain list syntax.
fn quote_value(value: &str) -> String {
    let reserved = |c: char| matches!(c, ',' | '.' | ':' | '(' | ')' | '"' | '\\') || c.is_whitespace();
    if value.chars().any(reserved) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    } else {
        value.to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// Select query against one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub table: String,
    /// Projected columns; empty means every column
    pub columns: Vec<String>,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn table(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn eq(mut self, column: &str, value: impl ToString) -> Self {
        self.filters.push(Filter::eq(column, value));
        self
    }

    pub fn in_list(mut self, column: &str, values: &[&str]) -> Self {
        self.filters.push(Filter::In {
            column: column.to_string(),
            values: values.iter().map(|v| v.to_string()).collect(),
        });
        self
    }

    /// Match rows satisfying any of the `column = value` clauses
    pub fn or(mut self, clauses: &[(&str, &str)]) -> Self {
        self.filters.push(Filter::AnyOf(
            clauses
                .iter()
                .map(|(column, value)| (column.to_string(), value.to_string()))
                .collect(),
        ));
        self
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// PostgREST query string parameters, in a stable order
    pub fn to_params(&self) -> Vec<(String, String)> {
        let mut params = Vec::with_capacity(self.filters.len() + 3);
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };
        params.push(("select".to_string(), columns));
        params.extend(self.filters.iter().map(Filter::to_param));
        if !self.order.is_empty() {
            let order: Vec<String> = self
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect();
            params.push(("order".to_string(), order.join(",")));
        }
        if let Some(limit) = self.limit {
            params.push(("limit".to_string(), limit.to_string()));
        }
        params
    }
}

/// Contract of the hosted store. Every failure is reported through
/// [`CatalogError`]; gateway-side messages are carried verbatim in
/// [`CatalogError::Gateway`].
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataGateway: Send + Sync {
    async fn select(&self, query: &Query) -> CatalogResult<Vec<Value>>;

    /// Exact number of rows matching the query's filters
    async fn count(&self, query: &Query) -> CatalogResult<usize>;

    /// Insert rows and return them as stored
    async fn insert(&self, table: &str, rows: Vec<Value>) -> CatalogResult<Vec<Value>>;

    /// Patch every row matching `filters` and return the updated rows
    async fn update(&self, table: &str, filters: &[Filter], patch: Value)
        -> CatalogResult<Vec<Value>>;

    async fn delete(&self, table: &str, filters: &[Filter]) -> CatalogResult<()>;
}

/// Decode gateway rows into typed records
pub fn decode_rows<T: DeserializeOwned>(rows: Vec<Value>) -> CatalogResult<Vec<T>> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(CatalogError::from))
        .collect()
}

/// Unscoped writes are refused so a missing filter can never touch a whole table
pub(crate) fn require_filters(table: &str, filters: &[Filter]) -> CatalogResult<()> {
    if filters.is_empty() {
        return Err(CatalogError::validation(format!(
            "Refusing unfiltered write to {}",
            table
        )));
    }
    Ok(())
}
