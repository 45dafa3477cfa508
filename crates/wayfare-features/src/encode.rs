//! One-hot encoding of categorical user attributes.
//!
//! The vocabulary is fitted on the whole population (train and test users
//! together) so both partitions end up with identical indicator columns.

use crate::error::{FeatureError, Result};
use polars::prelude::*;
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, info};

/// Categorical columns replaced by indicators.
pub const ENCODED_COLUMNS: [&str; 11] = [
    "gender",
    "signup_method",
    "signup_flow",
    "language",
    "affiliate_channel",
    "affiliate_provider",
    "first_affiliate_tracked",
    "signup_app",
    "first_device_type",
    "first_browser",
    "most_used_device",
];

/// Indicator column name for one value of a categorical column.
pub fn indicator_column_name(column: &str, value: &str) -> String {
    format!("{column}_{value}")
}

/// Sorted distinct values of each encoded column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    columns: Vec<(String, Vec<String>)>,
}

impl Vocabulary {
    /// Collect the distinct non-missing values of `columns` in `df`.
    ///
    /// Non-string columns are encoded through their string form.
    pub fn fit(df: &DataFrame, columns: &[&str]) -> Result<Self> {
        let mut fitted = Vec::with_capacity(columns.len());
        for &name in columns {
            let column = df
                .column(name)
                .map_err(|_| FeatureError::MissingColumn(name.to_string()))?
                .cast(&DataType::String)?;
            let values: BTreeSet<String> = column
                .as_materialized_series()
                .str()?
                .into_iter()
                .flatten()
                .map(str::to_string)
                .collect();
            debug!(column = name, values = values.len(), "fitted vocabulary");
            fitted.push((name.to_string(), values.into_iter().collect()));
        }
        Ok(Self { columns: fitted })
    }

    /// Values of `column`, if it was fitted.
    pub fn values(&self, column: &str) -> Option<&[String]> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, values)| values.as_slice())
    }

    /// Fitted source columns.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }
}

/// Replace every fitted column of `df` with 0/1 indicator columns.
///
/// A missing value yields all zeros for its column.
pub fn one_hot_encode(df: DataFrame, vocabulary: &Vocabulary) -> Result<DataFrame> {
    let sources: HashSet<&str> = vocabulary.columns().collect();
    let mut taken: HashSet<String> = df
        .get_column_names()
        .iter()
        .map(|name| name.as_str())
        .filter(|name| !sources.contains(name))
        .map(str::to_string)
        .collect();

    let mut indicators = Vec::new();
    for (column, values) in &vocabulary.columns {
        if df.column(column).is_err() {
            return Err(FeatureError::MissingColumn(column.clone()));
        }
        for value in values {
            let name = indicator_column_name(column, value);
            if !taken.insert(name.clone()) {
                return Err(FeatureError::ColumnCollision {
                    column: name,
                    block: "encoded",
                });
            }
            indicators.push(
                when(col(column.as_str()).cast(DataType::String).eq(lit(value.as_str())))
                    .then(lit(1i32))
                    .otherwise(lit(0i32))
                    .alias(name),
            );
        }
    }

    let mut encoded = df.lazy().with_columns(indicators).collect()?;
    for column in &sources {
        encoded = encoded.drop(column)?;
    }
    Ok(encoded)
}

/// Fit a vocabulary over `columns` and encode them.
pub fn encode_categoricals(df: DataFrame, columns: &[&str]) -> Result<DataFrame> {
    let vocabulary = Vocabulary::fit(&df, columns)?;
    let before = df.width();
    let encoded = one_hot_encode(df, &vocabulary)?;
    info!(
        encoded_columns = columns.len(),
        columns_before = before,
        columns_after = encoded.width(),
        "encoded categorical columns"
    );
    Ok(encoded)
}
