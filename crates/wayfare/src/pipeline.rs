//! End-to-end pipeline orchestration.
//!
//! Load → clean → aggregate → merge → processed checkpoint → encode →
//! encoded checkpoint. Every stage is synchronous and in memory; only the
//! aggregation maps use the worker pool.

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result, Stage};
use indicatif::ProgressBar;
use polars::prelude::*;
use tracing::{debug, info};
use wayfare_data::{SessionTable, UserTables, clean_sessions, clean_users, load_users};
use wayfare_features::{
    BlockFill, FeatureBlock, WorkerPool, counts_table, elapsed_table, encode_categoricals,
    merge_features, profile_table,
};
use wayfare_output::{CheckpointManifest, CheckpointStage, write_checkpoint};

/// What a run produced.
#[derive(Debug, Clone)]
pub struct PipelineReport {
    /// Users loaded from both files
    pub users: usize,
    /// Session events loaded
    pub session_events: usize,
    /// Distinct users with at least one session
    pub session_users: usize,
    /// Aggregation workers used
    pub threads: usize,
    /// Schema of the merged checkpoint
    pub processed: CheckpointManifest,
    /// Schema of the encoded checkpoint
    pub encoded: CheckpointManifest,
}

/// Run every stage with `config`.
///
/// `progress` receives one tick per user and aggregation map.
pub fn run(config: &PipelineConfig, progress: Option<&ProgressBar>) -> Result<PipelineReport> {
    let (tables, sessions) = load(config)?;

    let users = clean_users(tables.users.clone(), &config.clean)
        .map_err(PipelineError::data(Stage::Clean))?;
    let sessions = clean_sessions(sessions, &config.clean.sentinel);

    let pool = WorkerPool::new(config.threads).map_err(PipelineError::features(Stage::Aggregate))?;
    let blocks = aggregate(&pool, &sessions, progress)?;

    let merged = merge_features(users, blocks).map_err(PipelineError::features(Stage::Merge))?;
    let processed = write_checkpoint(
        &merged,
        &tables,
        CheckpointStage::Processed,
        &config.processed_dir,
        &config.label_column,
    )
    .map_err(PipelineError::output(Stage::Write))?;

    let encoded = encode(merged, config)?;
    let encoded = write_checkpoint(
        &encoded,
        &tables,
        CheckpointStage::Encoded,
        &config.processed_dir,
        &config.label_column,
    )
    .map_err(PipelineError::output(Stage::Write))?;

    let report = PipelineReport {
        users: tables.len(),
        session_events: sessions.len(),
        session_users: sessions.user_ids().len(),
        threads: pool.threads(),
        processed,
        encoded,
    };
    info!(
        users = report.users,
        session_users = report.session_users,
        processed_columns = report.processed.train_columns.len(),
        encoded_columns = report.encoded.train_columns.len(),
        "pipeline finished"
    );
    Ok(report)
}

fn load(config: &PipelineConfig) -> Result<(UserTables, SessionTable)> {
    let tables = load_users(&config.train_path(), &config.test_path())
        .map_err(PipelineError::data(Stage::Load))?;
    let sessions = SessionTable::from_path(&config.sessions_path())
        .map_err(PipelineError::data(Stage::Load))?;
    info!(
        train_users = tables.train_ids.len(),
        test_users = tables.test_ids.len(),
        session_events = sessions.len(),
        "loaded raw tables"
    );
    Ok((tables, sessions))
}

fn aggregate(
    pool: &WorkerPool,
    sessions: &SessionTable,
    progress: Option<&ProgressBar>,
) -> Result<Vec<FeatureBlock>> {
    info!(
        users = sessions.user_ids().len(),
        threads = pool.threads(),
        "aggregating sessions"
    );
    let tag = PipelineError::features;

    let profile = profile_table(pool, sessions, progress).map_err(tag(Stage::Aggregate))?;
    let counts = counts_table(sessions).map_err(tag(Stage::Aggregate))?;
    let elapsed = elapsed_table(pool, sessions, progress).map_err(tag(Stage::Aggregate))?;

    Ok(vec![
        FeatureBlock::new("profile", profile, BlockFill::ZeroNumeric),
        FeatureBlock::new("counts", counts, BlockFill::ZeroNumeric),
        FeatureBlock::new("elapsed", elapsed, BlockFill::Missing),
    ])
}

fn encode(mut merged: DataFrame, config: &PipelineConfig) -> Result<DataFrame> {
    for name in &config.drop_before_encoding {
        if merged.column(name).is_ok() {
            debug!(column = %name, "dropping column before encoding");
            merged = merged
                .drop(name)
                .map_err(PipelineError::polars(Stage::Encode))?;
        }
    }

    let columns: Vec<&str> = config.encoded_columns.iter().map(String::as_str).collect();
    encode_categoricals(merged, &columns).map_err(PipelineError::features(Stage::Encode))
}
