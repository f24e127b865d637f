//! Organizer and matcher configuration types.

use std::fmt;
use std::path::PathBuf;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// Default number of organizer workers.
pub const DEFAULT_WORKERS: usize = 2;

/// Default match ratio threshold, in percent.
pub const DEFAULT_THRESHOLD: f64 = 95.0;

/// Default block size for block digests (32 KiB).
pub const DEFAULT_BLOCK_SIZE: usize = 32 * 1024;

/// Digest algorithm used for identity and block digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    /// SHA-256. Produces the same names as trees organized by earlier releases.
    #[default]
    Sha256,
    /// BLAKE3.
    Blake3,
}

impl fmt::Display for HashAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

/// Configuration for an organize run.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct OrganizeConfig {
    /// Root of the tree to organize.
    pub source: PathBuf,

    /// Root folder files are moved or copied into.
    pub destination: PathBuf,

    /// Compute and report every decision, mutate nothing.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub dry_run: bool,

    /// Copy instead of move. Does not affect duplicate deletion.
    #[builder(default = "false")]
    #[serde(default)]
    pub copy: bool,

    /// Delete source files whose content already exists at the destination.
    #[builder(default = "false")]
    #[serde(default)]
    pub delete_duplicates: bool,

    /// Number of workers draining the queue.
    #[builder(default = "DEFAULT_WORKERS")]
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Put undated videos into `Videos` instead of `Anarchs`.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub separate_videos: bool,

    /// Digest algorithm.
    #[builder(default)]
    #[serde(default)]
    pub hash: HashAlgorithm,

    /// Abort the whole batch on the first failed item.
    #[builder(default = "false")]
    #[serde(default)]
    pub fail_fast: bool,

    /// Seed for the work-list shuffle (None = seeded from the OS).
    #[builder(default)]
    #[serde(default)]
    pub shuffle_seed: Option<u64>,
}

fn default_true() -> bool {
    true
}

fn default_workers() -> usize {
    DEFAULT_WORKERS
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_block_size() -> usize {
    DEFAULT_BLOCK_SIZE
}

impl OrganizeConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.source {
            Some(ref source) if source.as_os_str().is_empty() => {
                return Err("Source path cannot be empty".to_string());
            }
            None => return Err("Source path is required".to_string()),
            _ => {}
        }
        match self.destination {
            Some(ref dst) if dst.as_os_str().is_empty() => {
                return Err("Destination path cannot be empty".to_string());
            }
            None => return Err("Destination path is required".to_string()),
            _ => {}
        }
        if self.workers == Some(0) {
            return Err("At least one worker is required".to_string());
        }
        Ok(())
    }
}

impl OrganizeConfig {
    /// Create a new organize config builder.
    pub fn builder() -> OrganizeConfigBuilder {
        OrganizeConfigBuilder::default()
    }

    /// Create a dry-run config with defaults for everything else.
    pub fn new(source: impl Into<PathBuf>, destination: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            destination: destination.into(),
            dry_run: true,
            copy: false,
            delete_duplicates: false,
            workers: DEFAULT_WORKERS,
            separate_videos: true,
            hash: HashAlgorithm::default(),
            fail_fast: false,
            shuffle_seed: None,
        }
    }
}

/// Configuration for approximate (block ratio) matching.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct MatchConfig {
    /// Root directory whose files are compared.
    pub root: PathBuf,

    /// Minimum match ratio, in percent, for a pair to count as a match.
    #[builder(default = "DEFAULT_THRESHOLD")]
    #[serde(default = "default_threshold")]
    pub threshold: f64,

    /// Delete the earlier member of each matched pair.
    #[builder(default = "false")]
    #[serde(default)]
    pub delete_duplicates: bool,

    /// Size of each hashed block in bytes.
    #[builder(default = "DEFAULT_BLOCK_SIZE")]
    #[serde(default = "default_block_size")]
    pub block_size: usize,

    /// Digest algorithm for block digests.
    #[builder(default)]
    #[serde(default)]
    pub hash: HashAlgorithm,
}

impl MatchConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            _ => {}
        }
        if let Some(threshold) = self.threshold {
            if !(0.0..=100.0).contains(&threshold) {
                return Err(format!("Threshold must be between 0 and 100, got {threshold}"));
            }
        }
        if self.block_size == Some(0) {
            return Err("Block size must be positive".to_string());
        }
        Ok(())
    }
}

impl MatchConfig {
    /// Create a new match config builder.
    pub fn builder() -> MatchConfigBuilder {
        MatchConfigBuilder::default()
    }

    /// Create a report-only config for a root directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            threshold: DEFAULT_THRESHOLD,
            delete_duplicates: false,
            block_size: DEFAULT_BLOCK_SIZE,
            hash: HashAlgorithm::default(),
        }
    }
}
