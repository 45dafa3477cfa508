//! Session event loading.
//!
//! Session rows are deserialized into typed [`SessionEvent`]s and indexed by
//! user so that per-user reductions can select a user's rows without
//! scanning the whole table. The table is immutable once built and is shared
//! read-only by the aggregation workers.

use crate::error::{DataError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::info;

/// Key column of the sessions file.
pub const USER_ID_COLUMN: &str = "user_id";

/// Elapsed-seconds column of the sessions file.
pub const SECS_ELAPSED_COLUMN: &str = "secs_elapsed";

const REQUIRED_COLUMNS: [&str; 6] = [
    USER_ID_COLUMN,
    "action",
    "action_type",
    "action_detail",
    "device_type",
    SECS_ELAPSED_COLUMN,
];

/// The four categorical fields of a session event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionField {
    /// Top level of the action taxonomy
    Action,
    /// Middle level of the action taxonomy
    ActionType,
    /// Leaf level of the action taxonomy
    ActionDetail,
    /// Device the event was logged from
    DeviceType,
}

impl SessionField {
    /// All categorical fields in file order.
    pub const fn all() -> [Self; 4] {
        [
            Self::Action,
            Self::ActionType,
            Self::ActionDetail,
            Self::DeviceType,
        ]
    }

    /// Column name in the sessions file.
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Action => "action",
            Self::ActionType => "action_type",
            Self::ActionDetail => "action_detail",
            Self::DeviceType => "device_type",
        }
    }
}

/// One logged user-device interaction.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct SessionEvent {
    /// User the event belongs to
    pub user_id: Option<String>,
    /// Action name
    pub action: Option<String>,
    /// Action type
    pub action_type: Option<String>,
    /// Action detail
    pub action_detail: Option<String>,
    /// Device type
    pub device_type: Option<String>,
    /// Seconds elapsed since the previous event
    pub secs_elapsed: Option<f64>,
}

impl SessionEvent {
    /// Value of one categorical field.
    pub fn field(&self, field: SessionField) -> Option<&str> {
        match field {
            SessionField::Action => self.action.as_deref(),
            SessionField::ActionType => self.action_type.as_deref(),
            SessionField::ActionDetail => self.action_detail.as_deref(),
            SessionField::DeviceType => self.device_type.as_deref(),
        }
    }
}

/// All session events, indexed by user.
#[derive(Debug, Clone, Default)]
pub struct SessionTable {
    events: Vec<SessionEvent>,
    user_ids: Vec<String>,
    rows_by_user: HashMap<String, Vec<usize>>,
}

impl SessionTable {
    /// Build the per-user index over `events`.
    ///
    /// Distinct users are kept in order of first appearance. Events without
    /// a user identifier are retained but belong to no user.
    pub fn new(events: Vec<SessionEvent>) -> Self {
        let mut user_ids = Vec::new();
        let mut rows_by_user: HashMap<String, Vec<usize>> = HashMap::new();

        for (row, event) in events.iter().enumerate() {
            let Some(user_id) = event.user_id.as_deref() else {
                continue;
            };
            match rows_by_user.get_mut(user_id) {
                Some(rows) => rows.push(row),
                None => {
                    user_ids.push(user_id.to_string());
                    rows_by_user.insert(user_id.to_string(), vec![row]);
                }
            }
        }

        Self {
            events,
            user_ids,
            rows_by_user,
        }
    }

    /// Read and index a sessions file.
    ///
    /// Columns are matched by header name; extra columns are ignored and a
    /// missing required column is an error.
    pub fn from_path(path: &Path) -> Result<Self> {
        let to_error = |source| DataError::Sessions {
            path: path.to_path_buf(),
            source,
        };
        let mut reader = csv::Reader::from_path(path).map_err(to_error)?;

        // Optional fields would silently default to None for an absent column.
        let headers = reader.headers().map_err(to_error)?.clone();
        for column in REQUIRED_COLUMNS {
            if !headers.iter().any(|header| header == column) {
                return Err(DataError::MissingColumn {
                    column: column.to_string(),
                    table: "sessions",
                });
            }
        }

        let events = reader
            .deserialize()
            .collect::<std::result::Result<Vec<SessionEvent>, _>>()
            .map_err(to_error)?;

        let table = Self::new(events);
        info!(
            events = table.len(),
            users = table.user_ids().len(),
            "loaded sessions"
        );
        Ok(table)
    }

    /// All events in file order.
    pub fn events(&self) -> &[SessionEvent] {
        &self.events
    }

    /// Consume the table, returning its events.
    pub fn into_events(self) -> Vec<SessionEvent> {
        self.events
    }

    /// Distinct user identifiers in order of first appearance.
    pub fn user_ids(&self) -> &[String] {
        &self.user_ids
    }

    /// Events of one user, in file order. Empty for unknown users.
    pub fn user_events<'a>(&'a self, user_id: &str) -> impl Iterator<Item = &'a SessionEvent> {
        self.rows_by_user
            .get(user_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
            .iter()
            .map(|&row| &self.events[row])
    }

    /// Number of events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the table holds no events.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
