//! Per-item outcomes and the batch report.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use canonfile_core::{OperationError, OrganizeError, ScanWarning};

/// How a first instance was put into place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceAction {
    Move,
    Copy,
}

impl fmt::Display for PlaceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Move => write!(f, "move"),
            Self::Copy => write!(f, "copy"),
        }
    }
}

/// Why an item was not considered at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The sniffer did not recognize the file as media.
    NotMedia,
}

/// What happened to one source file.
///
/// In a dry run the outcome describes what would have happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ItemOutcome {
    /// First instance: moved or copied to its canonical path.
    Placed {
        destination: PathBuf,
        action: PlaceAction,
    },
    /// Same content already at the destination.
    Duplicate {
        existing: PathBuf,
        source_removed: bool,
    },
    /// The source is itself the canonical file.
    AlreadyInPlace { path: PathBuf },
    /// Short name taken by different content; the source was left alone.
    NameCollision { candidates: Vec<PathBuf> },
    Skipped { reason: SkipReason },
}

/// Outcome of a single item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemReport {
    pub source: PathBuf,
    pub outcome: ItemOutcome,
}

/// Tally of outcomes by kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutcomeCounts {
    pub placed: usize,
    pub duplicates: usize,
    pub removed: usize,
    pub already_in_place: usize,
    pub collisions: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Result of an organize batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizeReport {
    /// Whether the run was a dry run.
    pub dry_run: bool,
    /// Regular files found under the source root.
    pub files_found: usize,
    /// Total size of those files.
    pub bytes_found: u64,
    pub counts: OutcomeCounts,
    /// Every processed item, sorted by source path.
    pub items: Vec<ItemReport>,
    /// Items that failed.
    pub failures: Vec<OperationError>,
    /// Problems met while enumerating the source tree.
    pub warnings: Vec<ScanWarning>,
    /// Whether the batch stopped early.
    pub aborted: bool,
    /// Items never processed because the batch stopped early.
    pub unprocessed: usize,
    pub duration: Duration,
}

impl OrganizeReport {
    pub fn new(dry_run: bool, files_found: usize, bytes_found: u64) -> Self {
        Self {
            dry_run,
            files_found,
            bytes_found,
            ..Self::default()
        }
    }

    /// Record the result of one item.
    pub fn record(&mut self, source: PathBuf, result: Result<ItemOutcome, OrganizeError>) {
        let outcome = match result {
            Ok(outcome) => outcome,
            Err(err) => {
                self.counts.failed += 1;
                self.failures.push(OperationError::new(source, err.to_string()));
                return;
            }
        };

        let counts = &mut self.counts;
        match &outcome {
            ItemOutcome::Placed { .. } => counts.placed += 1,
            ItemOutcome::Duplicate { source_removed, .. } => {
                counts.duplicates += 1;
                if *source_removed {
                    counts.removed += 1;
                }
            }
            ItemOutcome::AlreadyInPlace { .. } => counts.already_in_place += 1,
            ItemOutcome::NameCollision { .. } => counts.collisions += 1,
            ItemOutcome::Skipped { .. } => counts.skipped += 1,
        }
        self.items.push(ItemReport { source, outcome });
    }

    /// Whether every item completed and the batch ran to the end.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty() && !self.aborted
    }

    /// One-line human summary.
    pub fn summary(&self) -> String {
        let verb = if self.dry_run { "Would place" } else { "Placed" };
        let mut line = format!(
            "{} {} files, {} duplicates ({} removed), {} already in place, {} name collisions, {} skipped",
            verb,
            self.counts.placed,
            self.counts.duplicates,
            self.counts.removed,
            self.counts.already_in_place,
            self.counts.collisions,
            self.counts.skipped,
        );
        if self.counts.failed > 0 {
            line.push_str(&format!(", {} failed", self.counts.failed));
        }
        if self.aborted {
            line.push_str(&format!(", aborted with {} unprocessed", self.unprocessed));
        }
        line
    }
}
