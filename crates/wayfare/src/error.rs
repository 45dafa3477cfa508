//! Pipeline errors, tagged with the stage that failed.

use std::fmt;
use thiserror::Error;
use wayfare_data::DataError;
use wayfare_features::FeatureError;
use wayfare_output::OutputError;

/// Result type for pipeline runs.
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Pipeline stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Reading the user and session files
    Load,
    /// Sentinels, ages and calendar fields
    Clean,
    /// Per-user session reductions
    Aggregate,
    /// Joining feature blocks onto the users
    Merge,
    /// Indicator expansion
    Encode,
    /// Checkpoint files
    Write,
}

impl Stage {
    /// Lowercase stage name.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Load => "load",
            Self::Clean => "clean",
            Self::Aggregate => "aggregate",
            Self::Merge => "merge",
            Self::Encode => "encode",
            Self::Write => "write",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors that can occur while running the pipeline.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Loading or cleaning failed.
    #[error("{stage} stage failed: {source}")]
    Data {
        /// Failing stage
        stage: Stage,
        /// Underlying error
        source: DataError,
    },

    /// Aggregation, merging or encoding failed.
    #[error("{stage} stage failed: {source}")]
    Features {
        /// Failing stage
        stage: Stage,
        /// Underlying error
        source: FeatureError,
    },

    /// Writing a checkpoint failed.
    #[error("{stage} stage failed: {source}")]
    Output {
        /// Failing stage
        stage: Stage,
        /// Underlying error
        source: OutputError,
    },

    /// A table operation between stages failed.
    #[error("{stage} stage failed: {source}")]
    Polars {
        /// Failing stage
        stage: Stage,
        /// Underlying error
        source: polars::prelude::PolarsError,
    },
}

impl PipelineError {
    /// Stage that failed.
    pub const fn stage(&self) -> Stage {
        match self {
            Self::Data { stage, .. }
            | Self::Features { stage, .. }
            | Self::Output { stage, .. }
            | Self::Polars { stage, .. } => *stage,
        }
    }

    /// Tag a [`DataError`] with `stage`.
    pub fn data(stage: Stage) -> impl FnOnce(DataError) -> Self {
        move |source| Self::Data { stage, source }
    }

    /// Tag a [`FeatureError`] with `stage`.
    pub fn features(stage: Stage) -> impl FnOnce(FeatureError) -> Self {
        move |source| Self::Features { stage, source }
    }

    /// Tag an [`OutputError`] with `stage`.
    pub fn output(stage: Stage) -> impl FnOnce(OutputError) -> Self {
        move |source| Self::Output { stage, source }
    }

    /// Tag a polars error with `stage`.
    pub fn polars(stage: Stage) -> impl FnOnce(polars::prelude::PolarsError) -> Self {
        move |source| Self::Polars { stage, source }
    }
}
