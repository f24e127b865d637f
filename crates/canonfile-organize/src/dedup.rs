//! Duplicate detection and placement inside a locked bucket.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use canonfile_core::{FileRecord, OrganizeConfig, OrganizeError};
use canonfile_scan::Fingerprinter;

use crate::namer::CanonicalLocation;
use crate::outcome::{ItemOutcome, PlaceAction};
use crate::transfer::{copy_file, move_file};

/// Decides between move, copy, delete-source and no-op for one record.
///
/// Callers must hold the directory lock of the record's bucket for the
/// whole call and must have made sure the bucket exists.
#[derive(Debug, Clone)]
pub struct Deduplicator {
    fingerprinter: Fingerprinter,
    dry_run: bool,
    copy: bool,
    delete_duplicates: bool,
}

impl Deduplicator {
    pub fn new(fingerprinter: Fingerprinter) -> Self {
        Self {
            fingerprinter,
            dry_run: true,
            copy: false,
            delete_duplicates: false,
        }
    }

    pub fn from_config(config: &OrganizeConfig) -> Self {
        Self::new(Fingerprinter::new(config.hash))
            .dry_run(config.dry_run)
            .copy(config.copy)
            .delete_duplicates(config.delete_duplicates)
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn copy(mut self, copy: bool) -> Self {
        self.copy = copy;
        self
    }

    pub fn delete_duplicates(mut self, delete: bool) -> Self {
        self.delete_duplicates = delete;
        self
    }

    /// Place `record` at `location`, or recognize it as already present.
    pub fn place(
        &self,
        record: &FileRecord,
        location: &CanonicalLocation,
    ) -> Result<ItemOutcome, OrganizeError> {
        let candidates = matching_paths(&location.glob_pattern())?;

        if candidates.is_empty() {
            return self.place_first_instance(record, location);
        }

        for candidate in &candidates {
            if is_same_file(&record.source, candidate) {
                debug!(path = %candidate.display(), "already in place");
                return Ok(ItemOutcome::AlreadyInPlace {
                    path: candidate.clone(),
                });
            }

            let digest = self.fingerprinter.identity_digest(candidate)?;
            if digest != record.digest {
                continue;
            }

            debug!(
                source = %record.source.display(),
                existing = %candidate.display(),
                "already exists"
            );

            let source_removed = if self.dry_run || !self.delete_duplicates {
                if self.delete_duplicates {
                    info!(path = %record.source.display(), "would delete duplicate");
                }
                false
            } else {
                info!(path = %record.source.display(), "deleting duplicate");
                fs::remove_file(&record.source).map_err(|source| OrganizeError::Remove {
                    path: record.source.clone(),
                    source,
                })?;
                true
            };

            return Ok(ItemOutcome::Duplicate {
                existing: candidate.clone(),
                source_removed,
            });
        }

        warn!(
            source = %record.source.display(),
            name = %location.short_name,
            "name taken by different content, leaving source in place"
        );
        Ok(ItemOutcome::NameCollision { candidates })
    }

    fn place_first_instance(
        &self,
        record: &FileRecord,
        location: &CanonicalLocation,
    ) -> Result<ItemOutcome, OrganizeError> {
        let destination = location.short_path();
        let action = if self.copy {
            PlaceAction::Copy
        } else {
            PlaceAction::Move
        };

        if self.dry_run {
            info!(
                from = %record.source.display(),
                to = %destination.display(),
                %action,
                "dry run"
            );
        } else {
            info!(
                from = %record.source.display(),
                to = %destination.display(),
                %action,
                "placing"
            );
            let result = match action {
                PlaceAction::Copy => copy_file(&record.source, &destination).map(|_| ()),
                PlaceAction::Move => move_file(&record.source, &destination),
            };
            result.map_err(|source| OrganizeError::Transfer {
                from: record.source.clone(),
                to: destination.clone(),
                source,
            })?;
        }

        Ok(ItemOutcome::Placed {
            destination,
            action,
        })
    }
}

/// Existing files matching `pattern`, in sorted order.
fn matching_paths(pattern: &str) -> Result<Vec<PathBuf>, OrganizeError> {
    let glob_error = |message: String| OrganizeError::Glob {
        pattern: pattern.to_string(),
        message,
    };

    let mut paths = Vec::new();
    for entry in glob::glob(pattern).map_err(|e| glob_error(e.to_string()))? {
        let path = entry.map_err(|e| glob_error(e.to_string()))?;
        if path.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

fn is_same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
