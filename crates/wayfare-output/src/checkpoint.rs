//! Train/test checkpoint files.
//!
//! A checkpoint splits the merged feature table back into the users of each
//! source file, looked up by identifier, and writes one CSV per partition.
//! The label column is dropped from the hold-out file. A schema manifest is
//! written alongside.

use crate::error::{OutputError, Result};
use crate::manifest::CheckpointManifest;
use polars::prelude::*;
use std::collections::HashMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use wayfare_data::{ID_COLUMN, Partition, UserTables};

/// Point in the pipeline a checkpoint is taken at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CheckpointStage {
    /// After merging, before encoding
    Processed,
    /// After categorical encoding
    Encoded,
}

impl CheckpointStage {
    /// Prefix shared by the stage's files.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Processed => "processed",
            Self::Encoded => "encoded",
        }
    }

    /// File name of one partition at this stage.
    pub fn file_name(&self, partition: Partition) -> String {
        format!("{}_{}_users.csv", self.name(), partition.name())
    }

    /// File name of the stage's schema manifest.
    pub fn manifest_name(&self) -> String {
        format!("{}_schema.json", self.name())
    }
}

/// Rows of `df` whose identifier is in `ids`, in the order of `ids`.
///
/// Every identifier must be present; a user is never dropped silently.
pub fn split_partition(df: &DataFrame, ids: &[String], partition: Partition) -> Result<DataFrame> {
    let column = df
        .column(ID_COLUMN)
        .map_err(|_| OutputError::MissingIdColumn(ID_COLUMN))?
        .cast(&DataType::String)?;
    let rows: HashMap<&str, IdxSize> = column
        .as_materialized_series()
        .str()?
        .into_iter()
        .enumerate()
        .filter_map(|(row, id)| id.map(|id| (id, row as IdxSize)))
        .collect();

    let mut indices = Vec::with_capacity(ids.len());
    let mut missing = Vec::new();
    for id in ids {
        match rows.get(id.as_str()) {
            Some(&row) => indices.push(row),
            None => missing.push(id),
        }
    }
    if let Some(first) = missing.first() {
        return Err(OutputError::MissingIds {
            partition: partition.name(),
            missing: missing.len(),
            first: (*first).clone(),
        });
    }

    Ok(df.take(&IdxCa::from_vec("rows".into(), indices))?)
}

/// Write `df` as a delimited file with a header row.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).map_err(OutputError::create(path))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|source| OutputError::File {
            path: path.to_path_buf(),
            source,
        })
}

/// Read a checkpoint file back.
pub fn read_checkpoint(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|source| OutputError::File {
            path: path.to_path_buf(),
            source,
        })
}

/// Split `df` by the loaded partitions and write both files plus the manifest.
///
/// `label` is dropped from the hold-out file.
pub fn write_checkpoint(
    df: &DataFrame,
    users: &UserTables,
    stage: CheckpointStage,
    dir: &Path,
    label: &str,
) -> Result<CheckpointManifest> {
    std::fs::create_dir_all(dir).map_err(OutputError::create(dir))?;
    let mut manifest = CheckpointManifest {
        stage: stage.name().to_string(),
        ..Default::default()
    };

    for partition in Partition::all() {
        let mut table = id_first(split_partition(df, users.ids(partition), partition)?)?;
        if partition == Partition::Test && table.column(label).is_ok() {
            table = table.drop(label)?;
        }

        let file_name = stage.file_name(partition);
        let path: PathBuf = dir.join(&file_name);
        write_csv(&mut table, &path)?;
        debug!(
            stage = stage.name(),
            partition = partition.name(),
            rows = table.height(),
            columns = table.width(),
            path = %path.display(),
            "wrote checkpoint file"
        );

        let columns = table
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        match partition {
            Partition::Train => {
                manifest.train_columns = columns;
                manifest.train_rows = table.height();
            }
            Partition::Test => {
                manifest.test_columns = columns;
                manifest.test_rows = table.height();
            }
        }
        manifest.files.push(file_name);
    }

    manifest.save(&dir.join(stage.manifest_name()))?;
    info!(
        stage = stage.name(),
        train_rows = manifest.train_rows,
        test_rows = manifest.test_rows,
        columns = manifest.train_columns.len(),
        "wrote checkpoint"
    );
    Ok(manifest)
}

fn id_first(df: DataFrame) -> Result<DataFrame> {
    let mut order = vec![ID_COLUMN.to_string()];
    order.extend(
        df.get_column_names()
            .iter()
            .map(|name| name.to_string())
            .filter(|name| name != ID_COLUMN),
    );
    Ok(df.select(order)?)
}
