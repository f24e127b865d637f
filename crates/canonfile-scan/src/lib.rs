//! File enumeration and content probing for canonfile.
//!
//! This crate provides everything the organizer and the matcher need to
//! learn about a file before deciding where it belongs:
//!
//! - **Enumeration** of every regular file below a root via jwalk
//! - **Fingerprinting**: whole-file identity digests and fixed-size
//!   block digest sequences (SHA-256 or BLAKE3)
//! - **Type sniffing**: JPEG/PNG by magic bytes, videos by extension
//! - **Capture time** from embedded EXIF metadata
//!
//! # Example
//!
//! ```rust,no_run
//! use std::path::Path;
//! use canonfile_scan::{FileEnumerator, Fingerprinter, HashAlgorithm};
//!
//! let listing = FileEnumerator::new().enumerate(Path::new("/photos")).unwrap();
//! let fp = Fingerprinter::new(HashAlgorithm::Sha256);
//! for file in &listing.files {
//!     let digest = fp.identity_digest(&file.path).unwrap();
//!     println!("{} {}", digest.to_hex(), file.path.display());
//! }
//! ```

mod capture;
mod fingerprint;
mod sniff;
mod walker;

pub use capture::{CaptureTimeReader, ExifCaptureTime, parse_exif_datetime};
pub use fingerprint::Fingerprinter;
pub use sniff::{
    HeaderSniffer, TypeSniffer, VIDEO_EXTENSIONS, is_video_extension, normalized_extension,
};
pub use walker::{DiscoveredFile, Enumeration, FileEnumerator};

// Re-export core types for convenience
pub use canonfile_core::{ContentHash, HashAlgorithm, MediaType, ScanError, ScanWarning, WarningKind};
