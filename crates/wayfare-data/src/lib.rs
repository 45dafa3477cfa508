#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/wayfare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod clean;
pub mod error;
pub mod sessions;
pub mod users;

pub use clean::{CleanConfig, UNKNOWN_SENTINEL, clean_sessions, clean_users};
pub use error::{DataError, Result};
pub use sessions::{SessionEvent, SessionField, SessionTable};
pub use users::{ID_COLUMN, LABEL_COLUMN, Partition, UserTables, load_users};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
