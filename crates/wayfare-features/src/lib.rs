#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/wayfare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod aggregate;
pub mod arena;
pub mod counts;
pub mod elapsed;
pub mod encode;
pub mod error;
pub mod merge;
pub mod profile;

pub use aggregate::{WorkerPool, elapsed_table, profile_table};
pub use arena::{ColumnArena, SECS_ELAPSED_SUFFIX, secs_elapsed_column};
pub use counts::{COUNT_SUFFIX, count_columns, counts_table};
pub use elapsed::{ElapsedStats, ElapsedSummary, STATISTIC_COLUMNS, summarize_user};
pub use encode::{ENCODED_COLUMNS, Vocabulary, encode_categoricals, one_hot_encode};
pub use error::{FeatureError, Result};
pub use merge::{BlockFill, FeatureBlock, merge_features};
pub use profile::{MOST_USED_DEVICE_COLUMN, SESSION_LENGTH_COLUMN, SessionProfile, profile_user};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
