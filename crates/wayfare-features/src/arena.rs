//! Vocabulary of the data-dependent elapsed-time columns.
//!
//! Every distinct value of every categorical session field becomes a column
//! named `<value>_secs_elapsed`. The full set is only known after a pass over
//! all sessions, so it is computed once up front and every per-user record is
//! keyed by an index into it. Names are kept sorted so the schema does not
//! depend on input order or on how users were scheduled across workers.

use std::collections::{BTreeSet, HashMap};
use wayfare_data::{SessionField, SessionTable};

/// Suffix of every time-allocation column.
pub const SECS_ELAPSED_SUFFIX: &str = "_secs_elapsed";

/// Column name for one categorical value.
pub fn secs_elapsed_column(value: &str) -> String {
    format!("{value}{SECS_ELAPSED_SUFFIX}")
}

/// Sorted, deduplicated column names with index lookup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnArena {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl ColumnArena {
    /// Build an arena from arbitrary names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let names: Vec<String> = names
            .into_iter()
            .map(Into::into)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        let index = names
            .iter()
            .enumerate()
            .map(|(i, name)| (name.clone(), i))
            .collect();
        Self { names, index }
    }

    /// Collect every `<value>_secs_elapsed` name produced by any user.
    ///
    /// Values from different fields that render to the same name share one
    /// column.
    pub fn from_sessions(sessions: &SessionTable) -> Self {
        let names = sessions
            .events()
            .iter()
            .filter(|event| event.user_id.is_some())
            .flat_map(|event| {
                SessionField::all()
                    .into_iter()
                    .filter_map(move |field| event.field(field).map(secs_elapsed_column))
            });
        Self::from_names(names)
    }

    /// Position of `name`, if registered.
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    /// All names in column order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether no column is registered.
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}
