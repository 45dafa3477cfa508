//! Merging of the user table with the session feature blocks.
//!
//! Every block is left-joined onto the full user population by identifier,
//! so users without sessions keep their row. The merge refuses duplicate
//! identifiers and colliding column names, restores the original row order
//! explicitly and checks that no row was gained or lost.

use crate::error::{FeatureError, Result};
use polars::prelude::*;
use std::collections::HashSet;
use tracing::{debug, info};
use wayfare_data::ID_COLUMN;

const ROW_INDEX: &str = "__wayfare_row";

/// How absent rows of a block are filled after the join.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockFill {
    /// Numeric columns become 0, others stay missing
    ZeroNumeric,
    /// Every column stays missing
    Missing,
}

/// One keyed feature table to join onto the users.
#[derive(Debug, Clone)]
pub struct FeatureBlock {
    /// Name used in logs and errors
    pub name: &'static str,
    /// Table keyed by [`ID_COLUMN`]
    pub table: DataFrame,
    /// Fill policy for users absent from the table
    pub fill: BlockFill,
}

impl FeatureBlock {
    /// Create a block.
    pub const fn new(name: &'static str, table: DataFrame, fill: BlockFill) -> Self {
        Self { name, table, fill }
    }
}

/// Left-join `blocks`, in order, onto `users`.
pub fn merge_features(users: DataFrame, blocks: Vec<FeatureBlock>) -> Result<DataFrame> {
    let expected = users.height();
    ensure_unique_ids(&users, "users")?;

    let mut seen: HashSet<String> = users
        .get_column_names()
        .iter()
        .map(|name| name.to_string())
        .collect();

    let mut lf = users.lazy().with_row_index(ROW_INDEX, None);
    let mut fills = Vec::new();

    for block in blocks {
        ensure_unique_ids(&block.table, block.name)?;

        for column in block.table.get_columns() {
            let name = column.name().as_str();
            if name == ID_COLUMN {
                continue;
            }
            if !seen.insert(name.to_string()) {
                return Err(FeatureError::ColumnCollision {
                    column: name.to_string(),
                    block: block.name,
                });
            }
            if block.fill == BlockFill::ZeroNumeric && column.dtype().is_primitive_numeric() {
                fills.push(col(name).fill_null(lit(0)));
            }
        }

        debug!(
            block = block.name,
            rows = block.table.height(),
            columns = block.table.width() - 1,
            "joining feature block"
        );
        lf = lf.join(
            block.table.lazy(),
            [col(ID_COLUMN)],
            [col(ID_COLUMN)],
            JoinArgs::new(JoinType::Left),
        );
    }

    let merged = lf
        .with_columns(fills)
        .sort([ROW_INDEX], SortMultipleOptions::default())
        .collect()?
        .drop(ROW_INDEX)?;

    if merged.height() != expected {
        return Err(FeatureError::RowCount {
            expected,
            actual: merged.height(),
        });
    }

    info!(
        users = merged.height(),
        columns = merged.width(),
        "merged feature table"
    );
    Ok(merged)
}

fn ensure_unique_ids(df: &DataFrame, table: &'static str) -> Result<()> {
    let ids = df
        .column(ID_COLUMN)
        .map_err(|_| FeatureError::MissingColumn(ID_COLUMN.to_string()))?;
    let unique = ids.n_unique()?;
    if unique != df.height() || ids.null_count() > 0 {
        return Err(FeatureError::DuplicateUser {
            table,
            unique,
            rows: df.height(),
        });
    }
    Ok(())
}
