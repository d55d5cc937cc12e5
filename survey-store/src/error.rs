//! Error types for survey persistence

use thiserror::Error;

/// Store error
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server returned an error
    #[error("Server error {status}: {message}")]
    Server { status: u16, message: String },

    /// Invalid response from server
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A written row came back without its generated key
    #[error("Row in {table} has no {column}")]
    MissingId { table: String, column: String },

    /// Store refused the operation
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// Client could not be configured
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for store operations
pub type Result<T> = std::result::Result<T, StoreError>;
