//! JWalk-based file enumeration.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use jwalk::{Parallelism, WalkDir};
use tracing::debug;

use canonfile_core::{ScanError, ScanWarning, WarningKind};

/// A regular file found under the enumeration root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredFile {
    /// Full path to the file.
    pub path: PathBuf,
    /// Size in bytes.
    pub size: u64,
}

/// All regular files under a root, in discovery order.
#[derive(Debug, Clone)]
pub struct Enumeration {
    /// Canonicalized root that was walked.
    pub root: PathBuf,
    /// Files in sorted, depth-first discovery order.
    pub files: Vec<DiscoveredFile>,
    /// Sum of all file sizes.
    pub total_bytes: u64,
    /// Entries that could not be read.
    pub warnings: Vec<ScanWarning>,
    /// Time spent walking.
    pub duration: Duration,
}

impl Enumeration {
    /// Number of files found.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether no files were found.
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

/// Enumerates every regular file below a root.
///
/// Directories and symbolic links are skipped; hidden files are included.
#[derive(Debug, Clone, Default)]
pub struct FileEnumerator {
    threads: usize,
}

impl FileEnumerator {
    /// Create an enumerator using the default rayon pool.
    pub fn new() -> Self {
        Self { threads: 0 }
    }

    /// Use a dedicated pool of `threads` threads (0 = default pool).
    pub fn with_threads(threads: usize) -> Self {
        Self { threads }
    }

    /// Walk `root` and collect its regular files.
    pub fn enumerate(&self, root: &Path) -> Result<Enumeration, ScanError> {
        let start = Instant::now();
        let root = root.canonicalize().map_err(|e| ScanError::io(root, e))?;

        if !root.is_dir() {
            return Err(ScanError::NotADirectory { path: root });
        }

        let parallelism = match self.threads {
            0 => Parallelism::RayonDefaultPool {
                busy_timeout: Duration::from_millis(100),
            },
            n => Parallelism::RayonNewPool(n),
        };

        let walker = WalkDir::new(&root)
            .parallelism(parallelism)
            .sort(true)
            .skip_hidden(false)
            .follow_links(false);

        let mut files = Vec::new();
        let mut warnings = Vec::new();
        let mut total_bytes = 0u64;

        for entry_result in walker {
            let entry = match entry_result {
                Ok(e) => e,
                Err(err) => {
                    let path = err.path().map(|p| p.to_path_buf()).unwrap_or_default();
                    let kind = if err
                        .io_error()
                        .is_some_and(|e| e.kind() == std::io::ErrorKind::PermissionDenied)
                    {
                        WarningKind::PermissionDenied
                    } else {
                        WarningKind::ReadError
                    };
                    warnings.push(ScanWarning::new(path, err.to_string(), kind));
                    continue;
                }
            };

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(err) => {
                    warnings.push(ScanWarning::new(
                        &path,
                        err.to_string(),
                        WarningKind::MetadataError,
                    ));
                    continue;
                }
            };

            total_bytes += metadata.len();
            files.push(DiscoveredFile {
                path,
                size: metadata.len(),
            });
        }

        debug!(
            root = %root.display(),
            files = files.len(),
            warnings = warnings.len(),
            "enumeration finished"
        );

        Ok(Enumeration {
            root,
            files,
            total_bytes,
            warnings,
            duration: start.elapsed(),
        })
    }
}
