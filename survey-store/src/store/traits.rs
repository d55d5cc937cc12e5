//! Core trait for survey persistence.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::types::{Filter, RecordId, Table};

/// Row-oriented remote store.
///
/// Rows travel as JSON objects keyed by column name; the typed helpers below
/// convert to and from the shapes in [`crate::types`].
#[async_trait]
pub trait SurveyStore: Send + Sync {
    /// Identifier used in logs (e.g. "postgrest", "memory").
    fn id(&self) -> &str;

    /// Insert one row and return it as stored, generated columns included.
    async fn insert(&self, table: Table, row: Value) -> Result<Value>;

    /// Rows matching every filter, at most `limit` of them.
    async fn query(&self, table: Table, filters: &[Filter], limit: Option<usize>) -> Result<Vec<Value>>;

    /// One page of the rows matching every filter, in primary key order.
    ///
    /// The default fetches `offset + limit` rows and drops the head; stores
    /// that can page natively override it.
    async fn query_page(
        &self,
        table: Table,
        filters: &[Filter],
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Value>> {
        let rows = self
            .query(table, filters, Some(offset.saturating_add(limit)))
            .await?;
        Ok(rows.into_iter().skip(offset).collect())
    }

    /// Any single row of `table`, or `None` when the table is empty.
    async fn query_first(&self, table: Table) -> Result<Option<Value>> {
        Ok(self.query(table, &[], Some(1)).await?.into_iter().next())
    }

    /// Insert all rows as one batch; either all are written or an error is
    /// returned.
    async fn insert_many(&self, table: Table, rows: Vec<Value>) -> Result<()>;
}

/// Insert a typed row and return its generated key.
pub async fn insert_record<S, T>(store: &S, table: Table, row: &T) -> Result<RecordId>
where
    S: SurveyStore + ?Sized,
    T: Serialize + Sync,
{
    let stored = store.insert(table, serde_json::to_value(row)?).await?;
    RecordId::from_row(table, &stored)
}

/// Insert typed rows as one batch.
pub async fn insert_records<S, T>(store: &S, table: Table, rows: &[T]) -> Result<()>
where
    S: SurveyStore + ?Sized,
    T: Serialize + Sync,
{
    let values = rows
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    store.insert_many(table, values).await
}

/// Query and deserialize rows.
pub async fn query_records<S, T>(
    store: &S,
    table: Table,
    filters: &[Filter],
    limit: Option<usize>,
) -> Result<Vec<T>>
where
    S: SurveyStore + ?Sized,
    T: DeserializeOwned,
{
    store
        .query(table, filters, limit)
        .await?
        .into_iter()
        .map(|row| serde_json::from_value(row).map_err(Into::into))
        .collect()
}

/// Query and deserialize every matching row, `page_size` rows per request.
///
/// Paging continues until a page comes back empty, so a server-side row cap
/// smaller than `page_size` cannot truncate the result.
pub async fn query_all_records<S, T>(
    store: &S,
    table: Table,
    filters: &[Filter],
    page_size: usize,
) -> Result<Vec<T>>
where
    S: SurveyStore + ?Sized,
    T: DeserializeOwned,
{
    let page_size = page_size.max(1);
    let mut records = Vec::new();
    loop {
        let page = store
            .query_page(table, filters, page_size, records.len())
            .await?;
        if page.is_empty() {
            return Ok(records);
        }
        for row in page {
            records.push(serde_json::from_value(row)?);
        }
    }
}
