#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/wayfare/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod checkpoint;
pub mod error;
pub mod manifest;

pub use checkpoint::{
    CheckpointStage, read_checkpoint, split_partition, write_checkpoint, write_csv,
};
pub use error::{OutputError, Result};
pub use manifest::CheckpointManifest;
