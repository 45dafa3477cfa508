//! Error types for data operations.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for data operations.
pub type Result<T> = std::result::Result<T, DataError>;

/// Errors that can occur while loading or cleaning the raw tables.
#[derive(Debug, Error)]
pub enum DataError {
    /// A source table could not be opened or parsed.
    #[error("Failed to read {path}: {source}")]
    Read {
        /// Path of the source table
        path: PathBuf,
        /// Underlying reader error
        source: polars::prelude::PolarsError,
    },

    /// The session events file could not be opened or parsed.
    #[error("Failed to read sessions from {path}: {source}")]
    Sessions {
        /// Path of the sessions file
        path: PathBuf,
        /// Underlying CSV error
        source: csv::Error,
    },

    /// An expected column is absent.
    #[error("Missing column '{column}' in {table} table")]
    MissingColumn {
        /// Column that was expected
        column: String,
        /// Table that was inspected
        table: &'static str,
    },

    /// A user row has no identifier.
    #[error("Row {row} of the {table} table has no identifier")]
    MissingId {
        /// Zero-based row number
        row: usize,
        /// Table that was inspected
        table: &'static str,
    },

    /// A timestamp did not match its fixed format.
    #[error("Unparseable timestamp '{value}' in column '{column}' (expected {format})")]
    Timestamp {
        /// Column holding the value
        column: &'static str,
        /// Raw value
        value: String,
        /// Expected chrono format
        format: &'static str,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
