//! Concurrent organize-and-dedup pipeline for canonfile.
//!
//! Every media file under a source root is fingerprinted, given a canonical
//! name derived from its digest and capture time, and moved or copied into a
//! bucket directory under the destination root. The destination layout is
//! the only dedup ledger: a file whose content already sits under its
//! canonical name is recognized as a duplicate and optionally deleted.
//!
//! Work is shuffled and drained by a fixed pool of workers. Each bucket
//! directory has its own lock, held across the existence check and the
//! filesystem mutation, so two workers never race on the same name.
//!
//! # Example
//!
//! ```rust,no_run
//! use canonfile_organize::{OrganizeConfig, Organizer};
//!
//! let config = OrganizeConfig::builder()
//!     .source("/photos/inbox")
//!     .destination("/photos/library")
//!     .dry_run(false)
//!     .workers(4usize)
//!     .build()
//!     .unwrap();
//!
//! let report = Organizer::new(config).run().unwrap();
//! println!("{}", report.summary());
//! ```

mod dedup;
mod locks;
mod namer;
mod outcome;
mod pool;
mod progress;
mod transfer;

pub use dedup::Deduplicator;
pub use locks::{DirectoryLocks, KnownDirectories};
pub use namer::{
    CanonicalLocation, DATED_PREFIX_BYTES, Namer, UNDATED_BUCKET, UNDATED_PREFIX_BYTES,
    VIDEO_BUCKET,
};
pub use outcome::{ItemOutcome, ItemReport, OrganizeReport, OutcomeCounts, PlaceAction, SkipReason};
pub use pool::Organizer;
pub use progress::OrganizeProgress;
pub use transfer::{copy_file, move_file};

pub use canonfile_core::{OrganizeConfig, OrganizeConfigBuilder, OrganizeError};

/// Buffer size of the progress broadcast channel.
pub const PROGRESS_CHANNEL_SIZE: usize = 100;
