//! Pipeline configuration.

use std::path::{Path, PathBuf};
use wayfare_data::{CleanConfig, LABEL_COLUMN};
use wayfare_features::ENCODED_COLUMNS;

/// Default directory of the raw input files.
pub const RAW_DIR: &str = "data/raw";

/// Default directory of the checkpoint files.
pub const PROCESSED_DIR: &str = "data/processed";

/// Columns dropped after the first checkpoint, before encoding.
pub const PRE_ENCODING_DROPS: [&str; 3] = [
    "date_account_created",
    "date_first_active",
    "timestamp_first_active",
];

/// Configuration for a pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Directory holding the three input files
    pub raw_dir: PathBuf,
    /// Directory the checkpoints are written to
    pub processed_dir: PathBuf,
    /// Labelled user file name
    pub train_file: String,
    /// Hold-out user file name
    pub test_file: String,
    /// Session log file name
    pub sessions_file: String,
    /// Label column, dropped from hold-out outputs
    pub label_column: String,
    /// Cleaner settings
    pub clean: CleanConfig,
    /// Columns replaced by indicator columns
    pub encoded_columns: Vec<String>,
    /// Columns removed before encoding, if present
    pub drop_before_encoding: Vec<String>,
    /// Aggregation workers, or `None` for one per available core
    pub threads: Option<usize>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from(RAW_DIR),
            processed_dir: PathBuf::from(PROCESSED_DIR),
            train_file: "train_users.csv".to_string(),
            test_file: "test_users.csv".to_string(),
            sessions_file: "sessions.csv".to_string(),
            label_column: LABEL_COLUMN.to_string(),
            clean: CleanConfig::default(),
            encoded_columns: ENCODED_COLUMNS.iter().map(|c| c.to_string()).collect(),
            drop_before_encoding: PRE_ENCODING_DROPS.iter().map(|c| c.to_string()).collect(),
            threads: None,
        }
    }
}

impl PipelineConfig {
    /// Default configuration reading from `raw_dir` and writing to `processed_dir`.
    pub fn with_dirs(raw_dir: impl AsRef<Path>, processed_dir: impl AsRef<Path>) -> Self {
        Self {
            raw_dir: raw_dir.as_ref().to_path_buf(),
            processed_dir: processed_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Path of the labelled user file.
    pub fn train_path(&self) -> PathBuf {
        self.raw_dir.join(&self.train_file)
    }

    /// Path of the hold-out user file.
    pub fn test_path(&self) -> PathBuf {
        self.raw_dir.join(&self.test_file)
    }

    /// Path of the session log.
    pub fn sessions_path(&self) -> PathBuf {
        self.raw_dir.join(&self.sessions_file)
    }
}
