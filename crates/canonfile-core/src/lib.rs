//! Core types and configuration for canonfile.
//!
//! This crate provides the data structures shared by the scanning, organizing
//! and matching crates: content digests, per-file records, run configuration
//! and the error taxonomy.

mod config;
mod error;
mod record;

pub use config::{
    DEFAULT_BLOCK_SIZE, DEFAULT_THRESHOLD, DEFAULT_WORKERS, HashAlgorithm, MatchConfig,
    MatchConfigBuilder, OrganizeConfig, OrganizeConfigBuilder,
};
pub use error::{OperationError, OrganizeError, ScanError, ScanWarning, WarningKind};
pub use record::{ContentHash, FileRecord, MediaType};
