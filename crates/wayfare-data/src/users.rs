//! User table loading.
//!
//! The training and hold-out user files share one attribute schema except
//! for the label column. They are read with the polars CSV reader, unioned
//! row-wise (training rows first) and the identifiers of each file are kept
//! so the merged table can later be split back by original membership.

use crate::error::{DataError, Result};
use polars::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Identifier column of the user tables.
pub const ID_COLUMN: &str = "id";

/// Label column, present only in the training file.
pub const LABEL_COLUMN: &str = "country_destination";

/// Source file a user was loaded from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Partition {
    /// Labelled training users
    Train,
    /// Unlabelled hold-out users
    Test,
}

impl Partition {
    /// Both partitions, in union order.
    pub const fn all() -> [Self; 2] {
        [Self::Train, Self::Test]
    }

    /// Short lowercase name used in file names and logs.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Train => "train",
            Self::Test => "test",
        }
    }
}

/// The unified user table plus the membership of each source file.
#[derive(Debug, Clone)]
pub struct UserTables {
    /// Row-wise union of training and hold-out users.
    pub users: DataFrame,
    /// Training identifiers in file order.
    pub train_ids: Vec<String>,
    /// Hold-out identifiers in file order.
    pub test_ids: Vec<String>,
}

impl UserTables {
    /// Identifiers that were loaded from `partition`.
    pub fn ids(&self, partition: Partition) -> &[String] {
        match partition {
            Partition::Train => &self.train_ids,
            Partition::Test => &self.test_ids,
        }
    }

    /// Total number of users across both files.
    pub fn len(&self) -> usize {
        self.users.height()
    }

    /// Whether both files were empty.
    pub fn is_empty(&self) -> bool {
        self.users.height() == 0
    }
}

/// Read one delimited table with a header row.
pub fn read_table(path: &Path) -> Result<DataFrame> {
    CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .and_then(|reader| reader.finish())
        .map_err(|source| DataError::Read {
            path: path.to_path_buf(),
            source,
        })
}

/// Load both user files and union them.
///
/// The identifier column is coerced to a string so it joins against the
/// session `user_id` key regardless of what the reader inferred.
pub fn load_users(train_path: &Path, test_path: &Path) -> Result<UserTables> {
    let train = with_string_id(read_table(train_path)?, "train")?;
    let test = with_string_id(read_table(test_path)?, "test")?;
    debug!(
        train_rows = train.height(),
        test_rows = test.height(),
        "read user tables"
    );

    let train_ids = id_values(&train, "train")?;
    let test_ids = id_values(&test, "test")?;

    let users = concat_lf_diagonal(
        [train.lazy(), test.lazy()],
        UnionArgs {
            to_supertypes: true,
            ..Default::default()
        },
    )?
    .collect()?;

    info!(
        users = users.height(),
        columns = users.width(),
        "loaded user tables"
    );

    Ok(UserTables {
        users,
        train_ids,
        test_ids,
    })
}

/// Fail with a schema error unless every column in `columns` is present.
pub fn require_columns(df: &DataFrame, columns: &[&str], table: &'static str) -> Result<()> {
    let present = df.get_column_names();
    for column in columns {
        if !present.iter().any(|name| name.as_str() == *column) {
            return Err(DataError::MissingColumn {
                column: (*column).to_string(),
                table,
            });
        }
    }
    Ok(())
}

fn with_string_id(df: DataFrame, table: &'static str) -> Result<DataFrame> {
    require_columns(&df, &[ID_COLUMN], table)?;
    Ok(df
        .lazy()
        .with_column(col(ID_COLUMN).cast(DataType::String))
        .collect()?)
}

fn id_values(df: &DataFrame, table: &'static str) -> Result<Vec<String>> {
    let column = df.column(ID_COLUMN)?;
    let ids = column.as_materialized_series().str()?;
    ids.into_iter()
        .enumerate()
        .map(|(row, id)| {
            id.map(str::to_string)
                .ok_or(DataError::MissingId { row, table })
        })
        .collect()
}
