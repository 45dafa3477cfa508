#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/wayfare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::PipelineConfig;
pub use error::{PipelineError, Result, Stage};
pub use pipeline::{PipelineReport, run};

/// Raw table loading and cleaning.
pub use wayfare_data as data;
/// Session aggregation, merging and encoding.
pub use wayfare_features as features;
/// Checkpoint output.
pub use wayfare_output as output;

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
