//! Error types shared by the provider, the ledger model and the engine

use thiserror::Error;

/// Every failure a tracer operation can surface.
///
/// A page-cap hit is not an error; it travels as the `incomplete` flag on
/// the successful result.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TracerError {
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("no block found for timestamp {timestamp}")]
    BlockNotFound { timestamp: i64 },

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("data source error: {0}")]
    DataSource(String),

    #[error("malformed amount '{value}' ({decimals} decimals)")]
    MalformedAmount { value: String, decimals: u32 },

    #[error("query cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for TracerError {
    fn from(err: reqwest::Error) -> Self {
        TracerError::DataSource(err.to_string())
    }
}

impl From<serde_json::Error> for TracerError {
    fn from(err: serde_json::Error) -> Self {
        TracerError::DataSource(format!("unexpected response body: {}", err))
    }
}

pub type TracerResult<T> = Result<T, TracerError>;
