//! Persistence for survey submissions
//!
//! The survey writes to a hosted relational backend exposed as a row-oriented
//! tables API (PostgREST, as served by Supabase). This crate defines the
//! [`SurveyStore`] seam the submission workflow is written against, plus two
//! implementations:
//!
//! - [`PostgrestStore`]: HTTP client for `{base_url}/rest/v1/{table}`
//! - [`MemoryStore`]: in-process tables for tests and dry runs
//!
//! # Example
//!
//! ```rust,no_run
//! use survey_store::{Filter, PostgrestStore, StoreConfig, SurveyStore, Table};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = PostgrestStore::new(StoreConfig {
//!     base_url: "https://project.supabase.co".into(),
//!     api_key: Some("anon-key".into()),
//!     ..Default::default()
//! })?;
//!
//! let events = store
//!     .query(Table::Event, &[Filter::eq("event_type", "futebol")], Some(1))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod store;
pub mod types;

pub use config::StoreConfig;
pub use error::{Result, StoreError};
pub use store::{
    insert_record, insert_records, query_all_records, query_records, MemoryStore, Operation,
    PostgrestStore, StoreCall, SurveyStore,
};
pub use types::*;
