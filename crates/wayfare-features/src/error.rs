//! Error types for feature construction.

use thiserror::Error;

/// Result type for feature operations.
pub type Result<T> = std::result::Result<T, FeatureError>;

/// Errors that can occur while aggregating, merging or encoding features.
#[derive(Debug, Error)]
pub enum FeatureError {
    /// A session carried an elapsed time that is negative or not finite.
    #[error("Invalid secs_elapsed {value} for user {user_id}")]
    InvalidElapsed {
        /// User whose reduction failed
        user_id: String,
        /// Offending value
        value: f64,
    },

    /// A derived column name was not registered in the arena.
    #[error("Column '{0}' is not part of the session vocabulary")]
    UnknownColumn(String),

    /// An identifier occurs more than once in a table that must be keyed by it.
    #[error("Duplicate user identifiers in {table}: {unique} unique of {rows} rows")]
    DuplicateUser {
        /// Table that was inspected
        table: &'static str,
        /// Distinct identifiers
        unique: usize,
        /// Total rows
        rows: usize,
    },

    /// Two feature blocks produce the same column.
    #[error("Column '{column}' from the {block} block already exists")]
    ColumnCollision {
        /// Colliding column
        column: String,
        /// Block that introduced it
        block: &'static str,
    },

    /// An expected column is absent.
    #[error("Missing column '{0}'")]
    MissingColumn(String),

    /// The merged table lost or gained rows.
    #[error("Merged table has {actual} rows, expected {expected}")]
    RowCount {
        /// Rows of the user table
        expected: usize,
        /// Rows after merging
        actual: usize,
    },

    /// The worker pool could not be started.
    #[error("Worker pool error: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),
}
