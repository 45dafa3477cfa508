//! Worker-parallel session aggregation.
//!
//! Both per-user reductions are mapped over the distinct users of the
//! session table on a fixed-size rayon pool. Workers only read the shared
//! [`SessionTable`]; results come back in user order once every task has
//! finished, and the first failing user fails the whole map.

use crate::arena::ColumnArena;
use crate::elapsed::{ElapsedSummary, STATISTIC_COLUMNS, summarize_user};
use crate::error::Result;
use crate::profile::{
    MOST_USED_DEVICE_COLUMN, SESSION_LENGTH_COLUMN, SessionProfile, profile_user,
};
use indicatif::ProgressBar;
use polars::prelude::*;
use rayon::prelude::*;
use std::num::NonZeroUsize;
use tracing::{debug, info};
use wayfare_data::{ID_COLUMN, SessionTable};

/// Fixed-size pool that runs per-user reductions.
#[derive(Debug)]
pub struct WorkerPool {
    pool: rayon::ThreadPool,
}

impl WorkerPool {
    /// Create a pool with `threads` workers, or one per available core.
    pub fn new(threads: Option<usize>) -> Result<Self> {
        let threads = threads.filter(|&n| n > 0).unwrap_or_else(|| {
            std::thread::available_parallelism().map_or(1, NonZeroUsize::get)
        });
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("wayfare-worker-{i}"))
            .build()?;
        debug!(threads, "started worker pool");
        Ok(Self { pool })
    }

    /// Number of workers.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Apply `reduce` to every distinct user of `sessions`.
    ///
    /// Results are in the order of [`SessionTable::user_ids`].
    pub fn map_users<T, F>(
        &self,
        sessions: &SessionTable,
        progress: Option<&ProgressBar>,
        reduce: F,
    ) -> Result<Vec<T>>
    where
        T: Send,
        F: Fn(&str) -> Result<T> + Sync,
    {
        if let Some(pb) = progress {
            pb.set_length(sessions.user_ids().len() as u64);
            pb.set_position(0);
        }

        self.pool.install(|| {
            sessions
                .user_ids()
                .par_iter()
                .map(|user_id| {
                    let result = reduce(user_id.as_str());
                    if let Some(pb) = progress {
                        pb.inc(1);
                    }
                    result
                })
                .collect()
        })
    }
}

/// Time-allocation profiles of every session user, as a table.
///
/// Columns: `id`, `session_length`, one `<value>_secs_elapsed` column per
/// arena name (0 where the user never saw the value), `most_used_device`.
pub fn profile_table(
    pool: &WorkerPool,
    sessions: &SessionTable,
    progress: Option<&ProgressBar>,
) -> Result<DataFrame> {
    let arena = ColumnArena::from_sessions(sessions);
    if let Some(pb) = progress {
        pb.set_message("Profiling session time allocation...");
    }
    let profiles = pool.map_users(sessions, progress, |user_id| {
        profile_user(user_id, sessions, &arena)
    })?;

    let table = materialize_profiles(&profiles, &arena)?;
    info!(
        users = table.height(),
        elapsed_columns = arena.len(),
        "built session profile table"
    );
    Ok(table)
}

/// Elapsed-time statistics of every session user, as a table.
pub fn elapsed_table(
    pool: &WorkerPool,
    sessions: &SessionTable,
    progress: Option<&ProgressBar>,
) -> Result<DataFrame> {
    if let Some(pb) = progress {
        pb.set_message("Summarizing elapsed times...");
    }
    let summaries = pool.map_users(sessions, progress, |user_id| {
        summarize_user(user_id, sessions)
    })?;

    let table = materialize_elapsed(&summaries)?;
    info!(users = table.height(), "built elapsed statistics table");
    Ok(table)
}

/// Lay sparse profiles out as dense columns keyed by `arena`.
pub fn materialize_profiles(
    profiles: &[SessionProfile],
    arena: &ColumnArena,
) -> Result<DataFrame> {
    let rows = profiles.len();
    let mut elapsed = vec![vec![0.0_f64; rows]; arena.len()];
    let mut ids = Vec::with_capacity(rows);
    let mut lengths = Vec::with_capacity(rows);
    let mut devices = Vec::with_capacity(rows);

    for (row, profile) in profiles.iter().enumerate() {
        ids.push(profile.user_id.as_str());
        lengths.push(profile.session_length as i64);
        devices.push(profile.most_used_device.as_deref());
        for &(index, secs) in &profile.elapsed {
            elapsed[index][row] = secs;
        }
    }

    let mut columns = Vec::with_capacity(arena.len() + 3);
    columns.push(Column::new(ID_COLUMN.into(), ids));
    columns.push(Column::new(SESSION_LENGTH_COLUMN.into(), lengths));
    columns.extend(
        arena
            .names()
            .iter()
            .zip(elapsed)
            .map(|(name, values)| Column::new(name.as_str().into(), values)),
    );
    columns.push(Column::new(MOST_USED_DEVICE_COLUMN.into(), devices));
    Ok(DataFrame::new(columns)?)
}

/// Lay per-user statistics out as a table with nullable columns.
pub fn materialize_elapsed(summaries: &[ElapsedSummary]) -> Result<DataFrame> {
    let mut values: Vec<Vec<Option<f64>>> =
        vec![Vec::with_capacity(summaries.len()); STATISTIC_COLUMNS.len()];
    for summary in summaries {
        for (column, value) in values.iter_mut().zip(summary.stats.values()) {
            column.push(value);
        }
    }

    let ids: Vec<&str> = summaries.iter().map(|s| s.user_id.as_str()).collect();
    let mut columns = vec![Column::new(ID_COLUMN.into(), ids)];
    columns.extend(
        STATISTIC_COLUMNS
            .iter()
            .zip(values)
            .map(|(&name, column)| Column::new(name.into(), column)),
    );
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FeatureError;
    use wayfare_data::SessionEvent;

    fn event(user: &str, action: &str, device: &str, secs: f64) -> SessionEvent {
        SessionEvent {
            user_id: Some(user.to_string()),
            action: Some(action.to_string()),
            device_type: Some(device.to_string()),
            secs_elapsed: Some(secs),
            ..Default::default()
        }
    }

    fn sessions() -> SessionTable {
        SessionTable::new(vec![
            event("u1", "search", "iPhone", 10.0),
            event("u2", "show", "Mac Desktop", 3.0),
            event("u1", "show", "iPhone", 5.0),
            event("u3", "lookup", "iPad Tablet", 1.0),
        ])
    }

    #[test]
    fn test_map_users_preserves_user_order() {
        let pool = WorkerPool::new(Some(4)).unwrap();
        let sessions = sessions();

        let ids = pool
            .map_users(&sessions, None, |user_id| Ok(user_id.to_string()))
            .unwrap();
        assert_eq!(ids, vec!["u1", "u2", "u3"]);
    }

    #[test]
    fn test_map_users_fails_on_any_user() {
        let pool = WorkerPool::new(Some(2)).unwrap();
        let sessions = sessions();

        let result = pool.map_users(&sessions, None, |user_id| {
            if user_id == "u2" {
                Err(FeatureError::MissingColumn(user_id.to_string()))
            } else {
                Ok(())
            }
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_progress_counts_every_user() {
        let pool = WorkerPool::new(Some(2)).unwrap();
        let pb = ProgressBar::hidden();

        pool.map_users(&sessions(), Some(&pb), |_| Ok(())).unwrap();
        assert_eq!(pb.position(), 3);
    }

    #[test]
    fn test_profile_table_schema_is_union_of_users() {
        let pool = WorkerPool::new(Some(2)).unwrap();
        let table = profile_table(&pool, &sessions(), None).unwrap();

        let names: Vec<String> = table
            .get_column_names()
            .iter()
            .map(|name| name.to_string())
            .collect();
        assert_eq!(
            names,
            vec![
                "id",
                "session_length",
                "Mac Desktop_secs_elapsed",
                "iPad Tablet_secs_elapsed",
                "iPhone_secs_elapsed",
                "lookup_secs_elapsed",
                "search_secs_elapsed",
                "show_secs_elapsed",
                "most_used_device",
            ]
        );
        assert_eq!(table.height(), 3);

        // u2 never searched: the column exists and is zero for it.
        let search = table.column("search_secs_elapsed").unwrap();
        let search = search.as_materialized_series().f64().unwrap();
        assert_eq!(search.get(0), Some(10.0));
        assert_eq!(search.get(1), Some(0.0));
    }

    #[test]
    fn test_elapsed_table_keeps_missing_statistics() {
        let pool = WorkerPool::new(Some(2)).unwrap();
        let table = elapsed_table(&pool, &sessions(), None).unwrap();

        assert_eq!(table.shape(), (3, 11));
        let var = table.column("secs_elapsed_var").unwrap();
        let var = var.as_materialized_series().f64().unwrap();
        assert_eq!(var.get(0), Some(12.5));
        assert_eq!(var.get(1), None);
    }

    #[test]
    fn test_default_pool_size() {
        let pool = WorkerPool::new(None).unwrap();
        assert!(pool.threads() >= 1);
    }
}
