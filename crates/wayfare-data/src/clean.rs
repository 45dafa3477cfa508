//! Cleaning of the raw user and session tables.
//!
//! - Sentinel normalization: the `-unknown-` marker becomes missing.
//! - Implausible ages outside the configured bounds become missing.
//! - Calendar fields (weekday, year, month, day) are derived from the
//!   account-creation date and the first-activity timestamp.

use crate::error::{DataError, Result};
use crate::sessions::{SessionEvent, SessionTable};
use crate::users::require_columns;
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::*;
use tracing::{debug, info};

/// Marker used by the raw files for an unknown value.
pub const UNKNOWN_SENTINEL: &str = "-unknown-";

const AGE_COLUMN: &str = "age";
const ACCOUNT_CREATED_COLUMN: &str = "date_account_created";
const TIMESTAMP_FIRST_ACTIVE_COLUMN: &str = "timestamp_first_active";
const FIRST_ACTIVE_COLUMN: &str = "date_first_active";

const ACCOUNT_CREATED_FORMAT: &str = "%Y-%m-%d";
const FIRST_ACTIVE_FORMAT: &str = "%Y%m%d%H%M%S";

/// Configuration for the cleaner.
#[derive(Debug, Clone)]
pub struct CleanConfig {
    /// Literal that marks an unknown value
    pub sentinel: String,
    /// User columns in which the sentinel is normalized
    pub sentinel_columns: Vec<String>,
    /// Smallest plausible age (inclusive)
    pub min_age: f64,
    /// Largest plausible age (inclusive)
    pub max_age: f64,
    /// User columns dropped right after loading, if present
    pub dropped_columns: Vec<String>,
}

impl Default for CleanConfig {
    fn default() -> Self {
        Self {
            sentinel: UNKNOWN_SENTINEL.to_string(),
            sentinel_columns: vec!["gender".to_string(), "language".to_string()],
            min_age: 14.0,
            max_age: 100.0,
            dropped_columns: vec!["date_first_booking".to_string()],
        }
    }
}

/// Clean the unified user table.
pub fn clean_users(users: DataFrame, config: &CleanConfig) -> Result<DataFrame> {
    let sentinel_columns: Vec<&str> = config
        .sentinel_columns
        .iter()
        .map(String::as_str)
        .collect();
    require_columns(&users, &sentinel_columns, "users")?;
    require_columns(
        &users,
        &[
            AGE_COLUMN,
            ACCOUNT_CREATED_COLUMN,
            TIMESTAMP_FIRST_ACTIVE_COLUMN,
        ],
        "users",
    )?;

    let mut users = users;
    for name in &config.dropped_columns {
        if users.column(name).is_ok() {
            debug!(column = %name, "dropping dead column");
            users = users.drop(name)?;
        }
    }

    let lf = users.lazy();
    let lf = normalize_sentinels(lf, &sentinel_columns, &config.sentinel);
    let lf = clamp_age(lf, config.min_age, config.max_age);
    let cleaned = derive_calendar(lf.collect()?)?;

    info!(
        users = cleaned.height(),
        columns = cleaned.width(),
        "cleaned user table"
    );
    Ok(cleaned)
}

/// Replace `sentinel` with missing in every named string column.
pub fn normalize_sentinels(lf: LazyFrame, columns: &[&str], sentinel: &str) -> LazyFrame {
    let exprs: Vec<Expr> = columns
        .iter()
        .map(|name| {
            when(col(*name).eq(lit(sentinel)))
                .then(lit(NULL).cast(DataType::String))
                .otherwise(col(*name))
                .alias(*name)
        })
        .collect();
    lf.with_columns(exprs)
}

/// Replace ages outside `[min_age, max_age]` with missing.
pub fn clamp_age(lf: LazyFrame, min_age: f64, max_age: f64) -> LazyFrame {
    let age = col(AGE_COLUMN).cast(DataType::Float64);
    lf.with_column(
        when(age.clone().lt(lit(min_age)).or(age.clone().gt(lit(max_age))))
            .then(lit(NULL).cast(DataType::Float64))
            .otherwise(age)
            .alias(AGE_COLUMN),
    )
}

/// Normalize the sentinel in every field of every session event.
///
/// Events whose user identifier is the sentinel lose their user and are
/// therefore orphaned.
pub fn clean_sessions(sessions: SessionTable, sentinel: &str) -> SessionTable {
    let normalize = |value: Option<String>| value.filter(|v| v != sentinel);
    let events: Vec<SessionEvent> = sessions
        .into_events()
        .into_iter()
        .map(|event| SessionEvent {
            user_id: normalize(event.user_id),
            action: normalize(event.action),
            action_type: normalize(event.action_type),
            action_detail: normalize(event.action_detail),
            device_type: normalize(event.device_type),
            secs_elapsed: event.secs_elapsed,
        })
        .collect();
    SessionTable::new(events)
}

/// Calendar fields of one date.
#[derive(Debug, Clone, Default)]
struct CalendarColumns {
    days: Vec<Option<i32>>,
    weekday: Vec<Option<String>>,
    year: Vec<Option<i32>>,
    month: Vec<Option<i32>>,
    day: Vec<Option<i32>>,
}

impl CalendarColumns {
    fn push(&mut self, date: Option<NaiveDate>) {
        self.days.push(date.map(|d| {
            d.signed_duration_since(NaiveDate::default()).num_days() as i32
        }));
        self.weekday.push(date.map(|d| d.format("%A").to_string()));
        self.year.push(date.map(|d| d.year()));
        self.month.push(date.map(|d| d.month() as i32));
        self.day.push(date.map(|d| d.day() as i32));
    }

    fn into_columns(self, suffix: &str) -> Vec<Column> {
        vec![
            Column::new(format!("weekday_{suffix}").into(), self.weekday),
            Column::new(format!("year_{suffix}").into(), self.year),
            Column::new(format!("month_{suffix}").into(), self.month),
            Column::new(format!("day_{suffix}").into(), self.day),
        ]
    }
}

/// Parse both activity dates and append their calendar fields.
///
/// `date_account_created` is replaced by a date column and
/// `date_first_active` is added as a datetime parsed from
/// `timestamp_first_active`.
pub fn derive_calendar(mut users: DataFrame) -> Result<DataFrame> {
    let created = string_values(&users, ACCOUNT_CREATED_COLUMN)?;
    let first_active = string_values(&users, TIMESTAMP_FIRST_ACTIVE_COLUMN)?;

    let mut created_fields = CalendarColumns::default();
    for value in &created {
        let date = value
            .as_deref()
            .map(|v| {
                NaiveDate::parse_from_str(v, ACCOUNT_CREATED_FORMAT).map_err(|_| {
                    DataError::Timestamp {
                        column: ACCOUNT_CREATED_COLUMN,
                        value: v.to_string(),
                        format: ACCOUNT_CREATED_FORMAT,
                    }
                })
            })
            .transpose()?;
        created_fields.push(date);
    }

    let mut active_fields = CalendarColumns::default();
    let mut active_millis = Vec::with_capacity(first_active.len());
    for value in &first_active {
        let timestamp = value
            .as_deref()
            .map(|v| {
                NaiveDateTime::parse_from_str(v, FIRST_ACTIVE_FORMAT).map_err(|_| {
                    DataError::Timestamp {
                        column: TIMESTAMP_FIRST_ACTIVE_COLUMN,
                        value: v.to_string(),
                        format: FIRST_ACTIVE_FORMAT,
                    }
                })
            })
            .transpose()?;
        active_millis.push(timestamp.map(|t| t.and_utc().timestamp_millis()));
        active_fields.push(timestamp.map(|t| t.date()));
    }

    let created_dates = Series::new(ACCOUNT_CREATED_COLUMN.into(), &created_fields.days)
        .cast(&DataType::Date)?;
    let active_dates = Series::new(FIRST_ACTIVE_COLUMN.into(), active_millis)
        .cast(&DataType::Datetime(TimeUnit::Milliseconds, None))?;

    users.with_column(created_dates)?;
    users.with_column(active_dates)?;
    for column in created_fields
        .into_columns("account_created")
        .into_iter()
        .chain(active_fields.into_columns("first_active"))
    {
        users.with_column(column)?;
    }

    Ok(users)
}

fn string_values(df: &DataFrame, name: &'static str) -> Result<Vec<Option<String>>> {
    let column = df.column(name)?.cast(&DataType::String)?;
    let values = column.as_materialized_series().str()?;
    Ok(values
        .into_iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn users() -> DataFrame {
        DataFrame::new(vec![
            Column::new("id".into(), ["u1", "u2", "u3"]),
            Column::new(
                "gender".into(),
                [Some("MALE"), Some("-unknown-"), None::<&str>],
            ),
            Column::new("language".into(), ["en", "-unknown-", "fr"]),
            Column::new("age".into(), [Some(30.0), Some(2014.0), None::<f64>]),
            Column::new(
                "date_account_created".into(),
                ["2010-06-28", "2011-05-25", "2014-01-01"],
            ),
            Column::new(
                "timestamp_first_active".into(),
                [20090319043255i64, 20110525185212, 20131231235959],
            ),
            Column::new(
                "date_first_booking".into(),
                [None::<&str>, None::<&str>, None::<&str>],
            ),
        ])
        .unwrap()
    }

    fn ages(values: &[Option<f64>]) -> Vec<Option<f64>> {
        let df = DataFrame::new(vec![Column::new("age".into(), values)]).unwrap();
        let clamped = clamp_age(df.lazy(), 14.0, 100.0).collect().unwrap();
        clamped
            .column("age")
            .unwrap()
            .as_materialized_series()
            .f64()
            .unwrap()
            .into_iter()
            .collect()
    }

    #[rstest]
    #[case(13.0, None)]
    #[case(14.0, Some(14.0))]
    #[case(35.0, Some(35.0))]
    #[case(100.0, Some(100.0))]
    #[case(101.0, None)]
    #[case(1985.0, None)]
    fn test_age_bounds(#[case] age: f64, #[case] expected: Option<f64>) {
        assert_eq!(ages(&[Some(age)]), vec![expected]);
    }

    #[test]
    fn test_missing_age_stays_missing() {
        assert_eq!(ages(&[None]), vec![None]);
    }

    #[test]
    fn test_clean_users() {
        let cleaned = clean_users(users(), &CleanConfig::default()).unwrap();

        assert_eq!(cleaned.height(), 3);
        assert!(cleaned.column("date_first_booking").is_err());

        let gender = cleaned.column("gender").unwrap();
        assert_eq!(gender.null_count(), 2);
        let language = cleaned.column("language").unwrap();
        assert_eq!(language.null_count(), 1);
        assert_eq!(cleaned.column("age").unwrap().null_count(), 2);
    }

    #[test]
    fn test_calendar_fields() {
        let cleaned = clean_users(users(), &CleanConfig::default()).unwrap();

        let weekday = cleaned.column("weekday_account_created").unwrap();
        assert_eq!(
            weekday.as_materialized_series().str().unwrap().get(0),
            Some("Monday")
        );
        let year = cleaned.column("year_first_active").unwrap();
        assert_eq!(year.as_materialized_series().i32().unwrap().get(0), Some(2009));
        let month = cleaned.column("month_first_active").unwrap();
        assert_eq!(month.as_materialized_series().i32().unwrap().get(0), Some(3));
        let day = cleaned.column("day_account_created").unwrap();
        assert_eq!(day.as_materialized_series().i32().unwrap().get(1), Some(25));
        let weekday_active = cleaned.column("weekday_first_active").unwrap();
        assert_eq!(
            weekday_active.as_materialized_series().str().unwrap().get(2),
            Some("Tuesday")
        );

        assert_eq!(
            cleaned.column("date_account_created").unwrap().dtype(),
            &DataType::Date
        );
        assert_eq!(
            cleaned.column("date_first_active").unwrap().dtype(),
            &DataType::Datetime(TimeUnit::Milliseconds, None)
        );
    }

    #[test]
    fn test_bad_timestamp_is_an_error() {
        let mut df = users();
        df.with_column(Column::new(
            "timestamp_first_active".into(),
            ["2009", "20110525185212", "20131231235959"],
        ))
        .unwrap();

        let err = clean_users(df, &CleanConfig::default()).unwrap_err();
        assert!(matches!(err, DataError::Timestamp { .. }));
    }

    #[test]
    fn test_missing_column_is_an_error() {
        let df = users().drop("age").unwrap();
        let err = clean_users(df, &CleanConfig::default()).unwrap_err();
        assert!(matches!(err, DataError::MissingColumn { .. }));
    }

    #[test]
    fn test_clean_sessions() {
        let sessions = SessionTable::new(vec![
            SessionEvent {
                user_id: Some("u1".to_string()),
                action: Some("-unknown-".to_string()),
                action_type: Some("click".to_string()),
                device_type: Some("-unknown-".to_string()),
                secs_elapsed: Some(5.0),
                ..Default::default()
            },
            SessionEvent {
                user_id: Some("-unknown-".to_string()),
                action: Some("show".to_string()),
                ..Default::default()
            },
        ]);

        let cleaned = clean_sessions(sessions, UNKNOWN_SENTINEL);
        let events = cleaned.events();
        assert_eq!(events[0].action, None);
        assert_eq!(events[0].action_type.as_deref(), Some("click"));
        assert_eq!(events[0].device_type, None);
        assert_eq!(events[1].user_id, None);
        assert_eq!(cleaned.user_ids(), ["u1".to_string()]);
    }
}
