//! Per-user counts of non-missing session values.

use polars::prelude::*;
use wayfare_data::sessions::SECS_ELAPSED_COLUMN;
use wayfare_data::{ID_COLUMN, SessionField, SessionTable};

use crate::error::Result;

/// Suffix of every count column.
pub const COUNT_SUFFIX: &str = "_count";

/// Count columns, one per non-key session column.
pub fn count_columns() -> Vec<String> {
    SessionField::all()
        .iter()
        .map(SessionField::name)
        .chain(std::iter::once(SECS_ELAPSED_COLUMN))
        .map(|name| format!("{name}{COUNT_SUFFIX}"))
        .collect()
}

/// Non-missing value counts of one user, in [`count_columns`] order.
pub fn count_user(user_id: &str, sessions: &SessionTable) -> [i64; 5] {
    let mut counts = [0; 5];
    for event in sessions.user_events(user_id) {
        for (slot, field) in SessionField::all().into_iter().enumerate() {
            counts[slot] += i64::from(event.field(field).is_some());
        }
        counts[4] += i64::from(event.secs_elapsed.is_some());
    }
    counts
}

/// Count table over every user present in the sessions.
pub fn counts_table(sessions: &SessionTable) -> Result<DataFrame> {
    let user_ids = sessions.user_ids();
    let names = count_columns();
    let mut values: Vec<Vec<i64>> = vec![Vec::with_capacity(user_ids.len()); names.len()];

    for user_id in user_ids {
        for (column, count) in values.iter_mut().zip(count_user(user_id, sessions)) {
            column.push(count);
        }
    }

    let mut columns = vec![Column::new(ID_COLUMN.into(), user_ids)];
    columns.extend(
        names
            .into_iter()
            .zip(values)
            .map(|(name, column)| Column::new(name.into(), column)),
    );
    Ok(DataFrame::new(columns)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wayfare_data::SessionEvent;

    #[test]
    fn test_count_columns() {
        assert_eq!(
            count_columns(),
            vec![
                "action_count",
                "action_type_count",
                "action_detail_count",
                "device_type_count",
                "secs_elapsed_count"
            ]
        );
    }

    #[test]
    fn test_counts_skip_missing_values() {
        let sessions = SessionTable::new(vec![
            SessionEvent {
                user_id: Some("u1".to_string()),
                action: Some("show".to_string()),
                device_type: Some("iPhone".to_string()),
                secs_elapsed: Some(1.0),
                ..Default::default()
            },
            SessionEvent {
                user_id: Some("u1".to_string()),
                action: Some("search".to_string()),
                ..Default::default()
            },
            SessionEvent {
                user_id: Some("u2".to_string()),
                action_type: Some("click".to_string()),
                ..Default::default()
            },
        ]);

        assert_eq!(count_user("u1", &sessions), [2, 0, 0, 1, 1]);
        assert_eq!(count_user("absent", &sessions), [0; 5]);

        let table = counts_table(&sessions).unwrap();
        assert_eq!(table.shape(), (2, 6));
        let action_type = table.column("action_type_count").unwrap();
        assert_eq!(
            action_type.as_materialized_series().i64().unwrap().get(1),
            Some(1)
        );
    }
}
