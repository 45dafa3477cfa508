//! Schema manifest written beside each checkpoint.

use crate::error::{OutputError, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Column names and row counts of one checkpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointManifest {
    /// Checkpoint name (`processed` or `encoded`)
    pub stage: String,
    /// Columns of the training file, in file order
    pub train_columns: Vec<String>,
    /// Columns of the hold-out file, in file order
    pub test_columns: Vec<String>,
    /// Rows in the training file
    pub train_rows: usize,
    /// Rows in the hold-out file
    pub test_rows: usize,
    /// File names written, relative to the output directory
    pub files: Vec<String>,
}

impl CheckpointManifest {
    /// Whether both files have the same columns apart from `label`.
    pub fn schemas_match(&self, label: &str) -> bool {
        self.train_columns
            .iter()
            .filter(|column| column.as_str() != label)
            .eq(self.test_columns.iter())
    }

    /// Total rows over both files.
    pub const fn total_rows(&self) -> usize {
        self.train_rows + self.test_rows
    }

    /// Write as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let file = File::create(path).map_err(OutputError::create(path))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
        Ok(())
    }

    /// Read a manifest written by [`Self::save`].
    pub fn load(path: &Path) -> Result<Self> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest() -> CheckpointManifest {
        CheckpointManifest {
            stage: "encoded".to_string(),
            train_columns: vec!["id".into(), "age".into(), "country_destination".into()],
            test_columns: vec!["id".into(), "age".into()],
            train_rows: 2,
            test_rows: 1,
            files: vec!["encoded_train_users.csv".into(), "encoded_test_users.csv".into()],
        }
    }

    #[test]
    fn test_schemas_match_ignores_label() {
        let mut manifest = manifest();
        assert!(manifest.schemas_match("country_destination"));
        assert_eq!(manifest.total_rows(), 3);

        manifest.test_columns.push("extra".into());
        assert!(!manifest.schemas_match("country_destination"));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encoded_schema.json");

        manifest().save(&path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("\"train_rows\": 2"));
        assert_eq!(CheckpointManifest::load(&path).unwrap(), manifest());
    }
}
