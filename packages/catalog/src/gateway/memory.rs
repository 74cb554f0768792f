use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use super::{require_filters, DataGateway, Filter, Query};
use crate::error::{CatalogError, CatalogResult};

/// In-process gateway over JSON rows.
///
/// Filters, ordering and projection follow the hosted store's semantics
/// closely enough for fixtures and offline runs: descending order puts
/// nulls first, ascending puts them last.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    queries: Mutex<Vec<Query>>,
    pending_failure: Mutex<Option<String>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a table with rows, replacing anything already there
    pub fn with_rows(self, table: &str, rows: Vec<Value>) -> Self {
        self.lock_tables().insert(table.to_string(), rows);
        self
    }

    /// Make the next gateway call fail with `message`
    pub fn fail_next(&self, message: impl Into<String>) {
        *self
            .pending_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(message.into());
    }

    /// Select queries executed so far
    pub fn executed_queries(&self) -> Vec<Query> {
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    /// Snapshot of a table's rows
    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.lock_tables().get(table).cloned().unwrap_or_default()
    }

    fn lock_tables(&self) -> std::sync::MutexGuard<'_, HashMap<String, Vec<Value>>> {
        self.tables
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn take_failure(&self) -> CatalogResult<()> {
        let pending = self
            .pending_failure
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        match pending {
            Some(message) => Err(CatalogError::Gateway(message)),
            None => Ok(()),
        }
    }
}

/// Compare a stored value with the textual filter operand
fn value_matches(value: Option<&Value>, expected: &str) -> bool {
    match value {
        None | Some(Value::Null) => expected == "null",
        Some(Value::String(s)) => s == expected,
        Some(Value::Bool(b)) => b.to_string() == expected,
        Some(Value::Number(n)) => {
            n.to_string() == expected
                || matches!((n.as_f64(), expected.parse::<f64>()), (Some(a), Ok(b)) if a == b)
        }
        Some(_) => false,
    }
}

fn row_matches(row: &Value, filters: &[Filter]) -> bool {
    filters.iter().all(|filter| match filter {
        Filter::Eq { column, value } => value_matches(row.get(column), value),
        Filter::In { column, values } => values
            .iter()
            .any(|value| value_matches(row.get(column), value)),
        Filter::IsNull { column } => row.get(column).map_or(true, Value::is_null),
        Filter::AnyOf(clauses) => clauses
            .iter()
            .any(|(column, value)| value_matches(row.get(column), value)),
    })
}

fn compare_present(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => {
            // `Z` and `+00:00` spellings of the same instant differ as text
            match (DateTime::parse_from_rfc3339(x), DateTime::parse_from_rfc3339(y)) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                _ => x.cmp(y),
            }
        }
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => a.to_string().cmp(&b.to_string()),
    }
}

fn compare_rows(a: &Value, b: &Value, query: &Query) -> Ordering {
    for order in &query.order {
        let left = a.get(&order.column).filter(|v| !v.is_null());
        let right = b.get(&order.column).filter(|v| !v.is_null());
        let ordering = match (left, right) {
            (None, None) => Ordering::Equal,
            // nulls sort as if larger than any value
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
            (Some(x), Some(y)) => compare_present(x, y),
        };
        let ordering = if order.ascending {
            ordering
        } else {
            ordering.reverse()
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

fn project(row: &Value, columns: &[String]) -> Value {
    if columns.is_empty() {
        return row.clone();
    }
    let projected: Map<String, Value> = columns
        .iter()
        .map(|column| (column.clone(), row.get(column).cloned().unwrap_or(Value::Null)))
        .collect();
    Value::Object(projected)
}

#[async_trait]
impl DataGateway for MemoryGateway {
    async fn select(&self, query: &Query) -> CatalogResult<Vec<Value>> {
        self.take_failure()?;
        self.queries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(query.clone());

        let tables = self.lock_tables();
        let mut rows: Vec<&Value> = tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|row| row_matches(row, &query.filters)).collect())
            .unwrap_or_default();
        rows.sort_by(|a, b| compare_rows(a, b, query));

        let limit = query.limit.unwrap_or(usize::MAX);
        let result: Vec<Value> = rows
            .into_iter()
            .take(limit)
            .map(|row| project(row, &query.columns))
            .collect();
        debug!(table = %query.table, rows = result.len(), "memory select");
        Ok(result)
    }

    async fn count(&self, query: &Query) -> CatalogResult<usize> {
        self.take_failure()?;
        let tables = self.lock_tables();
        Ok(tables
            .get(&query.table)
            .map(|rows| rows.iter().filter(|row| row_matches(row, &query.filters)).count())
            .unwrap_or(0))
    }

    async fn insert(&self, table: &str, rows: Vec<Value>) -> CatalogResult<Vec<Value>> {
        self.take_failure()?;
        let now = Value::String(Utc::now().to_rfc3339());
        let mut stored = Vec::with_capacity(rows.len());
        for row in rows {
            let Value::Object(mut object) = row else {
                return Err(CatalogError::validation("Rows must be JSON objects"));
            };
            object
                .entry("id")
                .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
            object.entry("created_at").or_insert_with(|| now.clone());
            object.entry("updated_at").or_insert_with(|| now.clone());
            stored.push(Value::Object(object));
        }

        self.lock_tables()
            .entry(table.to_string())
            .or_default()
            .extend(stored.iter().cloned());
        Ok(stored)
    }

    async fn update(
        &self,
        table: &str,
        filters: &[Filter],
        patch: Value,
    ) -> CatalogResult<Vec<Value>> {
        require_filters(table, filters)?;
        self.take_failure()?;
        let Value::Object(patch) = patch else {
            return Err(CatalogError::validation("Patch must be a JSON object"));
        };

        let mut tables = self.lock_tables();
        let mut updated = Vec::new();
        if let Some(rows) = tables.get_mut(table) {
            for row in rows.iter_mut().filter(|row| row_matches(row, filters)) {
                if let Value::Object(object) = row {
                    for (key, value) in &patch {
                        object.insert(key.clone(), value.clone());
                    }
                }
                updated.push(row.clone());
            }
        }
        Ok(updated)
    }

    async fn delete(&self, table: &str, filters: &[Filter]) -> CatalogResult<()> {
        require_filters(table, filters)?;
        self.take_failure()?;
        if let Some(rows) = self.lock_tables().get_mut(table) {
            rows.retain(|row| !row_matches(row, filters));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn gateway() -> MemoryGateway {
        MemoryGateway::new().with_rows(
            "items",
            vec![
                json!({"id": "a", "rank": 2, "done_at": "2026-01-02T00:00:00Z", "tag": "x"}),
                json!({"id": "b", "rank": 10, "done_at": null, "tag": "y"}),
                json!({"id": "c", "rank": 1, "done_at": "2026-03-01T00:00:00Z", "tag": "x"}),
            ],
        )
    }

    fn ids(rows: &[Value]) -> Vec<&str> {
        rows.iter().map(|r| r["id"].as_str().unwrap()).collect()
    }

    #[tokio::test]
    async fn test_numeric_ordering_is_not_lexicographic() {
        let rows = gateway()
            .select(&Query::table("items").order("rank", true))
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec!["c", "a", "b"]);
    }

    #[tokio::test]
    async fn test_descending_puts_nulls_first() {
        let rows = gateway()
            .select(&Query::table("items").order("done_at", false))
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec!["b", "c", "a"]);
    }

    #[tokio::test]
    async fn test_timestamps_order_by_instant() {
        let gw = MemoryGateway::new().with_rows(
            "items",
            vec![
                json!({"id": "fixture", "created_at": "2026-02-01T10:00:00Z"}),
                json!({"id": "stamped", "created_at": "2026-02-01T10:00:00.250+00:00"}),
                json!({"id": "earlier", "created_at": "2026-02-01T09:59:59.900+00:00"}),
            ],
        );
        let rows = gw
            .select(&Query::table("items").order("created_at", false))
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec!["stamped", "fixture", "earlier"]);
    }

    #[tokio::test]
    async fn test_is_null_filter() {
        let rows = gateway()
            .select(&Query::table("items").filter(Filter::is_null("done_at")))
            .await
            .unwrap();
        assert_eq!(ids(&rows), vec!["b"]);
    }

    #[tokio::test]
    async fn test_projection_and_in_filter() {
        let rows = gateway()
            .select(&Query::table("items").select(&["id"]).in_list("id", &["a", "c"]))
            .await
            .unwrap();
        assert_eq!(rows, vec![json!({"id": "a"}), json!({"id": "c"})]);
    }

    #[tokio::test]
    async fn test_update_and_delete_are_scoped() {
        let gw = gateway();
        let updated = gw
            .update("items", &[Filter::eq("tag", "x")], json!({"tag": "z"}))
            .await
            .unwrap();
        assert_eq!(updated.len(), 2);
        assert_eq!(gw.count(&Query::table("items").eq("tag", "z")).await.unwrap(), 2);

        gw.delete("items", &[Filter::eq("id", "a")]).await.unwrap();
        assert_eq!(gw.rows("items").len(), 2);

        assert!(gw.delete("items", &[]).await.is_err());
    }

    #[tokio::test]
    async fn test_insert_assigns_id_and_timestamps() {
        let gw = MemoryGateway::new();
        let stored = gw.insert("items", vec![json!({"name": "n"})]).await.unwrap();
        assert!(stored[0]["id"].is_string());
        assert!(stored[0]["created_at"].is_string());
        assert_eq!(gw.rows("items").len(), 1);
    }

    #[tokio::test]
    async fn test_fail_next_affects_one_call() {
        let gw = gateway();
        gw.fail_next("permission denied for table items");
        let err = gw.select(&Query::table("items")).await.unwrap_err();
        assert_eq!(err.to_string(), "permission denied for table items");
        assert!(gw.select(&Query::table("items")).await.is_ok());
    }
}
