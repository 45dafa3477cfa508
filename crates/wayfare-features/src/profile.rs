//! Categorical time-allocation profile of one user.
//!
//! For each of the four categorical session fields the user's events are
//! grouped by value and their elapsed seconds summed into the value's
//! `<value>_secs_elapsed` column. Contributions from different fields that
//! land on the same column are added together.

use crate::arena::{ColumnArena, secs_elapsed_column};
use crate::error::{FeatureError, Result};
use std::collections::BTreeMap;
use wayfare_data::{SessionEvent, SessionField, SessionTable};

/// Column holding the number of session events of a user.
pub const SESSION_LENGTH_COLUMN: &str = "session_length";

/// Column holding the most frequent device type of a user.
pub const MOST_USED_DEVICE_COLUMN: &str = "most_used_device";

/// Time-allocation profile of one user.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionProfile {
    /// User identifier
    pub user_id: String,
    /// Number of session events
    pub session_length: usize,
    /// Summed seconds per arena column, sorted by arena index
    pub elapsed: Vec<(usize, f64)>,
    /// Most frequent device type, if any event has one
    pub most_used_device: Option<String>,
}

impl SessionProfile {
    /// Summed seconds for a column index, absent columns being zero.
    pub fn elapsed_at(&self, index: usize) -> f64 {
        self.elapsed
            .binary_search_by_key(&index, |&(i, _)| i)
            .map_or(0.0, |pos| self.elapsed[pos].1)
    }
}

/// Elapsed seconds of an event, rejecting negative and non-finite values.
///
/// A missing value is `None` and contributes nothing.
pub(crate) fn checked_elapsed(user_id: &str, event: &SessionEvent) -> Result<Option<f64>> {
    match event.secs_elapsed {
        Some(value) if !value.is_finite() || value < 0.0 => Err(FeatureError::InvalidElapsed {
            user_id: user_id.to_string(),
            value,
        }),
        other => Ok(other),
    }
}

/// Reduce one user's session events to a [`SessionProfile`].
///
/// A user without events yields a zero-length profile with no columns and
/// no device.
pub fn profile_user(
    user_id: &str,
    sessions: &SessionTable,
    arena: &ColumnArena,
) -> Result<SessionProfile> {
    let mut session_length = 0;
    let mut elapsed: BTreeMap<usize, f64> = BTreeMap::new();
    let mut devices: Vec<(&str, usize)> = Vec::new();

    for event in sessions.user_events(user_id) {
        session_length += 1;
        let secs = checked_elapsed(user_id, event)?.unwrap_or(0.0);

        for field in SessionField::all() {
            let Some(value) = event.field(field) else {
                continue;
            };
            let name = secs_elapsed_column(value);
            let index = arena
                .index_of(&name)
                .ok_or(FeatureError::UnknownColumn(name))?;
            *elapsed.entry(index).or_insert(0.0) += secs;
        }

        if let Some(device) = event.field(SessionField::DeviceType) {
            match devices.iter_mut().find(|(d, _)| *d == device) {
                Some((_, count)) => *count += 1,
                None => devices.push((device, 1)),
            }
        }
    }

    Ok(SessionProfile {
        user_id: user_id.to_string(),
        session_length,
        elapsed: elapsed.into_iter().collect(),
        most_used_device: most_frequent(&devices).map(str::to_string),
    })
}

/// Value with the highest count; ties go to the value seen first.
fn most_frequent<'a>(counts: &[(&'a str, usize)]) -> Option<&'a str> {
    let mut best: Option<(&str, usize)> = None;
    for &(value, count) in counts {
        if best.is_none_or(|(_, best_count)| count > best_count) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}
