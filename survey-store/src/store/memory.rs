//! In-process store for testing and dry runs.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;

use super::traits::SurveyStore;
use crate::error::{Result, StoreError};
use crate::types::{Filter, RecordId, Table};

/// Store operation, as recorded in the call log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Query,
    QueryFirst,
    InsertMany,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Insert => "insert",
            Self::Query => "query",
            Self::QueryFirst => "query_first",
            Self::InsertMany => "insert_many",
        };
        f.write_str(name)
    }
}

/// One attempted call against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCall {
    pub op: Operation,
    pub table: Table,
}

#[derive(Default)]
struct Tables {
    rows: HashMap<Table, Vec<Value>>,
    next_id: HashMap<Table, i64>,
    calls: Vec<StoreCall>,
    failures: HashSet<(Table, Operation)>,
}

impl Tables {
    fn assign_id(&mut self, table: Table, row: &mut Value) -> Result<()> {
        let Value::Object(map) = row else {
            return Err(StoreError::InvalidResponse(format!(
                "{} rows must be JSON objects",
                table
            )));
        };
        let key = table.primary_key();
        if !map.contains_key(key) {
            let next = self.next_id.entry(table).or_insert(0);
            *next += 1;
            map.insert(key.to_string(), Value::from(*next));
        }
        Ok(())
    }

    fn check(&mut self, op: Operation, table: Table) -> Result<()> {
        self.calls.push(StoreCall { op, table });
        if self.failures.contains(&(table, op)) {
            return Err(StoreError::Unavailable(format!("{} on {} rejected", op, table)));
        }
        Ok(())
    }
}

/// Store keeping tables in memory.
///
/// Generates integer keys per table, evaluates filters, logs every attempted
/// call and can be told to fail specific operations.
pub struct MemoryStore {
    tables: Mutex<Tables>,
    latency: Option<Duration>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            tables: Mutex::new(Tables::default()),
            latency: None,
        }
    }

    /// Fail every `op` against `table` with [`StoreError::Unavailable`].
    pub fn with_failure(mut self, table: Table, op: Operation) -> Self {
        self.tables.get_mut().failures.insert((table, op));
        self
    }

    /// Delay every call, to keep submissions in flight for a while.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Insert a row directly, bypassing the call log and failure injection.
    pub async fn seed(&self, table: Table, mut row: Value) -> Result<RecordId> {
        let mut tables = self.tables.lock().await;
        tables.assign_id(table, &mut row)?;
        let id = RecordId::from_row(table, &row)?;
        tables.rows.entry(table).or_default().push(row);
        Ok(id)
    }

    /// Snapshot of a table's rows in insertion order.
    pub async fn rows(&self, table: Table) -> Vec<Value> {
        self.tables
            .lock()
            .await
            .rows
            .get(&table)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn count(&self, table: Table) -> usize {
        self.tables.lock().await.rows.get(&table).map_or(0, Vec::len)
    }

    /// Every call attempted so far, failed ones included.
    pub async fn calls(&self) -> Vec<StoreCall> {
        self.tables.lock().await.calls.clone()
    }

    async fn pause(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SurveyStore for MemoryStore {
    fn id(&self) -> &str {
        "memory"
    }

    async fn insert(&self, table: Table, mut row: Value) -> Result<Value> {
        self.pause().await;
        let mut tables = self.tables.lock().await;
        tables.check(Operation::Insert, table)?;
        tables.assign_id(table, &mut row)?;
        tables.rows.entry(table).or_default().push(row.clone());
        Ok(row)
    }

    async fn query(&self, table: Table, filters: &[Filter], limit: Option<usize>) -> Result<Vec<Value>> {
        self.pause().await;
        let mut tables = self.tables.lock().await;
        tables.check(Operation::Query, table)?;
        let matching = tables
            .rows
            .get(&table)
            .into_iter()
            .flatten()
            .filter(|row| filters.iter().all(|f| f.matches(row)))
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect();
        Ok(matching)
    }

    async fn query_page(
        &self,
        table: Table,
        filters: &[Filter],
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Value>> {
        self.pause().await;
        let mut tables = self.tables.lock().await;
        tables.check(Operation::Query, table)?;
        let page = tables
            .rows
            .get(&table)
            .into_iter()
            .flatten()
            .filter(|row| filters.iter().all(|f| f.matches(row)))
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok(page)
    }

    async fn query_first(&self, table: Table) -> Result<Option<Value>> {
        self.pause().await;
        let mut tables = self.tables.lock().await;
        tables.check(Operation::QueryFirst, table)?;
        Ok(tables.rows.get(&table).and_then(|rows| rows.first()).cloned())
    }

    async fn insert_many(&self, table: Table, mut rows: Vec<Value>) -> Result<()> {
        self.pause().await;
        let mut tables = self.tables.lock().await;
        tables.check(Operation::InsertMany, table)?;
        for row in rows.iter_mut() {
            tables.assign_id(table, row)?;
        }
        tables.rows.entry(table).or_default().extend(rows);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::traits::query_all_records;
    use serde_json::json;

    #[tokio::test]
    async fn test_insert_assigns_sequential_ids() {
        let store = MemoryStore::new();
        let first = store.insert(Table::Respondent, json!({"gender": "Outro"})).await.unwrap();
        let second = store.insert(Table::Respondent, json!({"gender": "Outro"})).await.unwrap();
        assert_eq!(first["respondent_id"], 1);
        assert_eq!(second["respondent_id"], 2);

        // Sequences are per table
        let event = store.insert(Table::Event, json!({"event_type": "tour"})).await.unwrap();
        assert_eq!(event["event_id"], 1);
    }

    #[tokio::test]
    async fn test_query_filters_and_limit() {
        let store = MemoryStore::new();
        for kind in ["tour", "futebol", "futebol"] {
            store.seed(Table::Event, json!({"event_type": kind})).await.unwrap();
        }

        let rows = store
            .query(Table::Event, &[Filter::eq("event_type", "futebol")], Some(1))
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["event_id"], 2);

        let all = store.query(Table::Event, &[], None).await.unwrap();
        assert_eq!(all.len(), 3);
    }

    #[tokio::test]
    async fn test_query_page_and_query_all() {
        let store = MemoryStore::new();
        for event_id in [1, 2, 3, 1, 2] {
            store
                .seed(Table::Response, json!({"event_id": event_id, "question_id": "nps"}))
                .await
                .unwrap();
        }
        let wanted = [Filter::one_of("event_id", ["1", "3"])];

        let page = store.query_page(Table::Response, &wanted, 2, 1).await.unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0]["response_id"], 3);
        assert_eq!(page[1]["response_id"], 4);

        let all: Vec<Value> = query_all_records(&store, Table::Response, &wanted, 2)
            .await
            .unwrap();
        let ids: Vec<_> = all.iter().map(|row| row["response_id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(3), json!(4)]);
        // Three more reads; paging stops on the empty one
        assert_eq!(store.calls().await.len(), 4);
    }

    #[tokio::test]
    async fn test_query_first_on_empty_table() {
        let store = MemoryStore::new();
        assert!(store.query_first(Table::Event).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failure_injection_is_logged() {
        let store = MemoryStore::new().with_failure(Table::Response, Operation::InsertMany);
        let result = store
            .insert_many(Table::Response, vec![json!({"question_id": "nps"})])
            .await;
        assert!(matches!(result, Err(StoreError::Unavailable(_))));
        assert_eq!(store.count(Table::Response).await, 0);
        assert_eq!(
            store.calls().await,
            vec![StoreCall {
                op: Operation::InsertMany,
                table: Table::Response
            }]
        );
    }

    #[tokio::test]
    async fn test_rejects_non_object_rows() {
        let store = MemoryStore::new();
        let result = store.insert(Table::Event, json!(["not", "a", "row"])).await;
        assert!(matches!(result, Err(StoreError::InvalidResponse(_))));
    }
}
