//! Store abstraction layer.
//!
//! - [`SurveyStore`]: the seam the submission workflow is written against
//! - [`PostgrestStore`]: hosted tables API over HTTP
//! - [`MemoryStore`]: in-process tables for tests and dry runs

pub mod memory;
pub mod postgrest;
pub mod traits;

pub use memory::{MemoryStore, Operation, StoreCall};
pub use postgrest::PostgrestStore;
pub use traits::{insert_record, insert_records, query_all_records, query_records, SurveyStore};
