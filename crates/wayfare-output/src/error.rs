//! Error types for checkpoint output.

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type for output operations.
pub type Result<T> = std::result::Result<T, OutputError>;

impl OutputError {
    /// Tag an I/O failure with the path being created.
    pub fn create(path: &Path) -> impl FnOnce(std::io::Error) -> Self + '_ {
        move |source| Self::Create {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Errors that can occur while writing checkpoints.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Identifiers of a partition were not found in the table being split.
    #[error("{missing} {partition} users are missing from the table (first: {first})")]
    MissingIds {
        /// Partition being split
        partition: &'static str,
        /// Number of identifiers not found
        missing: usize,
        /// First identifier not found
        first: String,
    },

    /// The table has no identifier column.
    #[error("Table has no '{0}' column")]
    MissingIdColumn(&'static str),

    /// A checkpoint file could not be written or read.
    #[error("Checkpoint file {path}: {source}")]
    File {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        source: polars::prelude::PolarsError,
    },

    /// A checkpoint file or directory could not be created.
    #[error("Cannot create {path}: {source}")]
    Create {
        /// Path that failed
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// JSON serialization error.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
