//! Progress reporting for organize runs.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Snapshot of a running organize batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrganizeProgress {
    /// Items finished so far, successful or not.
    pub files_completed: usize,
    /// Items in the batch.
    pub files_total: usize,
    /// Bytes of finished items.
    pub bytes_processed: u64,
    /// Bytes in the batch.
    pub bytes_total: u64,
    /// Item finished most recently.
    pub current_file: Option<PathBuf>,
    /// Failed items so far.
    pub failures: usize,
}

impl OrganizeProgress {
    pub fn new(files_total: usize, bytes_total: u64) -> Self {
        Self {
            files_total,
            bytes_total,
            ..Self::default()
        }
    }

    /// Progress as a percentage (0.0 to 100.0).
    pub fn percentage(&self) -> f64 {
        if self.bytes_total > 0 {
            (self.bytes_processed as f64 / self.bytes_total as f64) * 100.0
        } else if self.files_total > 0 {
            (self.files_completed as f64 / self.files_total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Mark one item finished.
    pub fn complete_file(&mut self, path: PathBuf, bytes: u64, failed: bool) {
        self.files_completed += 1;
        self.bytes_processed += bytes;
        self.current_file = Some(path);
        if failed {
            self.failures += 1;
        }
    }
}
