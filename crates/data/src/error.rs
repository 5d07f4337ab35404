//! Aggregation-layer error types.

use thiserror::Error;

/// Errors surfaced through [`crate::resource::ResultState`].
///
/// Hard-dependency failures (base query, required secondary lookup,
/// count sub-query) end up here. Best-effort lookup failures are absorbed
/// into placeholder values and logged, never surfaced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DataError {
    /// The base record query failed.
    #[error("record fetch failed: {0}")]
    RecordFetch(String),

    /// A required secondary lookup failed.
    #[error("join failed: {0}")]
    Join(String),

    /// A row did not match the expected schema.
    #[error("malformed {table} record: {detail}")]
    Parse { table: String, detail: String },

    /// Zero rows where exactly one was expected.
    #[error("not found: {0}")]
    NotFound(String),
}

impl DataError {
    /// Wrap an adapter error from the base record fetch.
    pub fn record_fetch(err: impl std::fmt::Display) -> Self {
        DataError::RecordFetch(format!("{err:#}"))
    }

    /// Wrap an adapter error from a required secondary lookup.
    pub fn join(err: impl std::fmt::Display) -> Self {
        DataError::Join(format!("{err:#}"))
    }

    /// Build a parse error for a row of `table`.
    pub fn parse(table: &str, detail: impl std::fmt::Display) -> Self {
        DataError::Parse {
            table: table.to_string(),
            detail: detail.to_string(),
        }
    }
}

/// Result type alias using DataError.
pub type DataResult<T> = Result<T, DataError>;
