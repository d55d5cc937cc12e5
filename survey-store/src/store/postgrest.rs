//! PostgREST tables API client.
//!
//! Works with any PostgREST deployment, including Supabase projects
//! (`https://<project>.supabase.co/rest/v1/<table>`).

use async_trait::async_trait;
use reqwest::{header, Client};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use super::traits::SurveyStore;
use crate::config::StoreConfig;
use crate::error::{Result, StoreError};
use crate::types::{Filter, Table};

/// HTTP store for a PostgREST endpoint.
pub struct PostgrestStore {
    config: StoreConfig,
    client: Client,
}

impl PostgrestStore {
    /// Create a new store client
    pub fn new(config: StoreConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        if let Some(ref api_key) = config.api_key {
            let key = header::HeaderValue::from_str(api_key)
                .map_err(|e| StoreError::Config(format!("invalid API key: {}", e)))?;
            let bearer = header::HeaderValue::from_str(&format!("Bearer {}", api_key))
                .map_err(|e| StoreError::Config(format!("invalid API key: {}", e)))?;
            headers.insert("apikey", key);
            headers.insert(header::AUTHORIZATION, bearer);
        }

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    fn table_url(&self, table: Table) -> String {
        format!("{}/{}", self.config.rest_url(), table.name())
    }

    // ==================== Helper Methods ====================

    async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = response.text().await.unwrap_or_default();
        Err(StoreError::Server { status, message })
    }

    async fn rows_from(response: reqwest::Response) -> Result<Vec<Value>> {
        let response = Self::error_for_status(response).await?;
        match response.json::<Value>().await? {
            Value::Array(rows) => Ok(rows),
            other => Err(StoreError::InvalidResponse(format!(
                "expected an array of rows, got {}",
                other
            ))),
        }
    }
}

#[async_trait]
impl SurveyStore for PostgrestStore {
    fn id(&self) -> &str {
        "postgrest"
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value> {
        debug!(%table, "POST single row");
        let response = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=representation")
            .json(&row)
            .send()
            .await?;

        Self::rows_from(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::InvalidResponse(format!("insert into {} returned no row", table)))
    }

    async fn query(&self, table: Table, filters: &[Filter], limit: Option<usize>) -> Result<Vec<Value>> {
        let mut params = vec!["select=*".to_string()];
        params.extend(filters.iter().map(Filter::to_query_param));
        if let Some(limit) = limit {
            params.push(format!("limit={}", limit));
        }
        let url = format!("{}?{}", self.table_url(table), params.join("&"));

        debug!(%table, filters = filters.len(), ?limit, "GET rows");
        let response = self.client.get(&url).send().await?;
        Self::rows_from(response).await
    }

    async fn query_page(
        &self,
        table: Table,
        filters: &[Filter],
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Value>> {
        let mut params = vec!["select=*".to_string()];
        params.extend(filters.iter().map(Filter::to_query_param));
        params.push(format!("order={}.asc", table.primary_key()));
        params.push(format!("limit={}", limit));
        params.push(format!("offset={}", offset));
        let url = format!("{}?{}", self.table_url(table), params.join("&"));

        debug!(%table, filters = filters.len(), limit, offset, "GET page");
        let response = self.client.get(&url).send().await?;
        Self::rows_from(response).await
    }

    async fn insert_many(&self, table: Table, rows: Vec<Value>) -> Result<()> {
        debug!(%table, rows = rows.len(), "POST batch");
        let response = self
            .client
            .post(self.table_url(table))
            .header("Prefer", "return=minimal")
            .json(&rows)
            .send()
            .await?;

        Self::error_for_status(response).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_url() {
        let store = PostgrestStore::new(StoreConfig {
            base_url: "https://abc.supabase.co".into(),
            api_key: Some("anon".into()),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(
            store.table_url(Table::Response),
            "https://abc.supabase.co/rest/v1/fct_response"
        );
        assert_eq!(store.id(), "postgrest");
    }

    #[test]
    fn test_rejects_unprintable_api_key() {
        let result = PostgrestStore::new(StoreConfig {
            api_key: Some("bad\nkey".into()),
            ..Default::default()
        });
        assert!(matches!(result, Err(StoreError::Config(_))));
    }
}
