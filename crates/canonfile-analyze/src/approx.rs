//! Approximate duplicate detection by block digest match ratio.
//!
//! Large media files often differ only in a few container or metadata bytes,
//! so whole-file digests miss them. Instead:
//! 1. Index files by size (only equal sizes can match)
//! 2. Walk files in discovery order, comparing each with its later
//!    same-size peers by the share of equal-position block digests
//! 3. The first partner at or above the threshold pairs with the earlier
//!    file; that file is not compared again
//!
//! Block digests are computed lazily and at most once per file.

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use canonfile_core::{ContentHash, MatchConfig, OperationError, ScanError};
use canonfile_scan::{DiscoveredFile, FileEnumerator, Fingerprinter};

/// Percentage of equal-position block digests.
///
/// Sequences of different length, and empty sequences, have ratio 0.
pub fn match_ratio(a: &[ContentHash], b: &[ContentHash]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let equal = a.iter().zip(b).filter(|(x, y)| x == y).count();
    100.0 * equal as f64 / a.len() as f64
}

/// A file taking part in matching, with its block digests once computed.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub path: PathBuf,
    pub size: u64,
    blocks: Option<Vec<ContentHash>>,
}

impl Candidate {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
            blocks: None,
        }
    }

    /// Block digests, if already computed.
    pub fn blocks(&self) -> Option<&[ContentHash]> {
        self.blocks.as_deref()
    }

    /// Compute block digests unless cached. Returns `true` if work was done.
    fn ensure_blocks(&mut self, fingerprinter: &Fingerprinter) -> Result<bool, ScanError> {
        if self.blocks.is_some() {
            return Ok(false);
        }
        self.blocks = Some(fingerprinter.block_digests(&self.path)?);
        Ok(true)
    }
}

impl From<DiscoveredFile> for Candidate {
    fn from(file: DiscoveredFile) -> Self {
        Self::new(file.path, file.size)
    }
}

/// Two equal-size files whose ratio reached the threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DuplicatePair {
    /// Earlier file in discovery order; the one deleted when enabled.
    pub earlier: PathBuf,
    pub later: PathBuf,
    pub size: u64,
    pub ratio: f64,
    /// Whether `earlier` was deleted.
    pub deleted: bool,
}

/// Equal-size pair below the threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NearMiss {
    pub earlier: PathBuf,
    pub later: PathBuf,
    pub size: u64,
    pub ratio: f64,
}

/// Results from approximate matching.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MatchReport {
    /// Matched pairs in discovery order of their earlier member.
    pub pairs: Vec<DuplicatePair>,
    pub near_misses: Vec<NearMiss>,
    /// Sum of the sizes of every matched earlier file.
    pub potential_savings: u64,
    /// Number of files deleted.
    pub deleted: usize,
    /// Files that could not be read or deleted.
    pub errors: Vec<OperationError>,
    pub files_analyzed: usize,
    /// Files whose block digests were computed.
    pub files_fingerprinted: usize,
    pub duration: Duration,
}

impl MatchReport {
    pub fn has_matches(&self) -> bool {
        !self.pairs.is_empty()
    }

    /// Potential savings in MiB.
    pub fn potential_savings_mb(&self) -> f64 {
        self.potential_savings as f64 / 1024.0 / 1024.0
    }
}

/// Single-threaded pairwise matcher over a directory tree.
pub struct ApproximateMatcher {
    config: MatchConfig,
    fingerprinter: Fingerprinter,
}

impl ApproximateMatcher {
    pub fn new(config: MatchConfig) -> Self {
        let fingerprinter = Fingerprinter::new(config.hash).with_block_size(config.block_size);
        Self {
            config,
            fingerprinter,
        }
    }

    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Whether `ratio` counts as a match.
    pub fn is_match(&self, ratio: f64) -> bool {
        ratio >= self.config.threshold
    }

    /// Enumerate the configured root and match its files.
    pub fn run(&self) -> Result<MatchReport, ScanError> {
        let listing = FileEnumerator::new().enumerate(&self.config.root)?;
        for warning in &listing.warnings {
            warn!(path = %warning.path.display(), message = %warning.message, "skipped entry");
        }
        Ok(self.find_matches(listing.files.into_iter().map(Candidate::from).collect()))
    }

    /// Match `candidates`, given in discovery order.
    pub fn find_matches(&self, mut candidates: Vec<Candidate>) -> MatchReport {
        let start = Instant::now();
        let mut report = MatchReport {
            files_analyzed: candidates.len(),
            ..MatchReport::default()
        };
        let mut unreadable = vec![false; candidates.len()];
        let peers = later_peers_by_size(&candidates);

        for (i, later_peers) in peers.iter().enumerate() {
            if unreadable[i] {
                continue;
            }
            for &j in later_peers {
                if unreadable[j] {
                    continue;
                }
                if !self.load(&mut candidates[i], &mut report) {
                    unreadable[i] = true;
                    break;
                }
                if !self.load(&mut candidates[j], &mut report) {
                    unreadable[j] = true;
                    continue;
                }

                let (earlier, later) = (&candidates[i], &candidates[j]);
                let ratio = match_ratio(
                    earlier.blocks().unwrap_or_default(),
                    later.blocks().unwrap_or_default(),
                );

                if !self.is_match(ratio) {
                    debug!(
                        ratio,
                        earlier = %earlier.path.display(),
                        later = %later.path.display(),
                        "equal size, no content match"
                    );
                    report.near_misses.push(NearMiss {
                        earlier: earlier.path.clone(),
                        later: later.path.clone(),
                        size: earlier.size,
                        ratio,
                    });
                    continue;
                }

                info!(
                    ratio,
                    earlier = %earlier.path.display(),
                    later = %later.path.display(),
                    "match"
                );
                report.potential_savings += earlier.size;
                let deleted = self.config.delete_duplicates && delete(earlier, &mut report);
                report.pairs.push(DuplicatePair {
                    earlier: earlier.path.clone(),
                    later: later.path.clone(),
                    size: earlier.size,
                    ratio,
                    deleted,
                });
                break;
            }
        }

        report.duration = start.elapsed();
        info!(
            matches = report.pairs.len(),
            potential_savings = report.potential_savings,
            deleted = report.deleted,
            "approximate matching finished"
        );
        report
    }

    /// Make sure `candidate` has block digests; records failures.
    fn load(&self, candidate: &mut Candidate, report: &mut MatchReport) -> bool {
        match candidate.ensure_blocks(&self.fingerprinter) {
            Ok(computed) => {
                if computed {
                    report.files_fingerprinted += 1;
                }
                true
            }
            Err(err) => {
                warn!(path = %candidate.path.display(), %err, "cannot read candidate");
                report
                    .errors
                    .push(OperationError::new(&candidate.path, err.to_string()));
                false
            }
        }
    }
}

fn delete(candidate: &Candidate, report: &mut MatchReport) -> bool {
    info!(path = %candidate.path.display(), "deleting");
    match fs::remove_file(&candidate.path) {
        Ok(()) => {
            report.deleted += 1;
            true
        }
        Err(err) => {
            warn!(path = %candidate.path.display(), %err, "cannot delete");
            report
                .errors
                .push(OperationError::new(&candidate.path, err.to_string()));
            false
        }
    }
}

/// For each candidate, the indices of later candidates with the same size,
/// in discovery order.
fn later_peers_by_size(candidates: &[Candidate]) -> Vec<Vec<usize>> {
    let mut by_size: HashMap<u64, Vec<usize>> = HashMap::new();
    for (index, candidate) in candidates.iter().enumerate() {
        by_size.entry(candidate.size).or_default().push(index);
    }
    let mut peers = vec![Vec::new(); candidates.len()];
    for group in by_size.into_values() {
        for (pos, &index) in group.iter().enumerate() {
            peers[index] = group[pos + 1..].to_vec();
        }
    }
    peers
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hashes(values: &[u8]) -> Vec<ContentHash> {
        values.iter().map(|&v| ContentHash::new([v; 32])).collect()
    }

    #[test]
    fn test_ratio_identical() {
        let a = hashes(&[1, 2, 3, 4]);
        assert_eq!(match_ratio(&a, &a), 100.0);
    }

    #[test]
    fn test_ratio_length_mismatch_and_empty() {
        assert_eq!(match_ratio(&hashes(&[1, 2]), &hashes(&[1, 2, 3])), 0.0);
        assert_eq!(match_ratio(&[], &[]), 0.0);
    }

    #[test]
    fn test_ratio_partial_and_symmetric() {
        let a = hashes(&[1, 2, 3, 4]);
        let b = hashes(&[1, 9, 3, 9]);
        assert_eq!(match_ratio(&a, &b), 50.0);
        assert_eq!(match_ratio(&a, &b), match_ratio(&b, &a));
    }

    #[test]
    fn test_later_peers_keep_discovery_order() {
        let candidates = vec![
            Candidate::new("/v/a", 10),
            Candidate::new("/v/b", 20),
            Candidate::new("/v/c", 10),
            Candidate::new("/v/d", 30),
            Candidate::new("/v/e", 20),
            Candidate::new("/v/f", 10),
        ];
        assert_eq!(
            later_peers_by_size(&candidates),
            vec![vec![2, 5], vec![4], vec![5], vec![], vec![], vec![]]
        );
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let matcher = ApproximateMatcher::new(MatchConfig::new("/v"));
        assert!(matcher.is_match(95.0));
        assert!(!matcher.is_match(94.99));
    }
}
