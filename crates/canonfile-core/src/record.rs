//! Digest and per-file record types.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use compact_str::CompactString;
use serde::{Deserialize, Serialize};

/// 256-bit content digest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContentHash(pub [u8; 32]);

impl ContentHash {
    /// Create a new ContentHash from raw bytes.
    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Get the hash as a lower-case hex string.
    pub fn to_hex(&self) -> String {
        self.prefix_hex(self.0.len())
    }

    /// Hex encoding of the first `bytes` bytes (clamped to the digest length).
    pub fn prefix_hex(&self, bytes: usize) -> String {
        self.0[..bytes.min(self.0.len())]
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect()
    }
}

/// Recognized media type of a file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaType {
    /// Type tag, also used as the canonical extension (`jpeg`, `png`, `mp4`, ...).
    pub tag: CompactString,
    /// Whether the file is a video.
    pub is_video: bool,
}

impl MediaType {
    /// An image type.
    pub fn image(tag: impl Into<CompactString>) -> Self {
        Self {
            tag: tag.into(),
            is_video: false,
        }
    }

    /// A video type.
    pub fn video(tag: impl Into<CompactString>) -> Self {
        Self {
            tag: tag.into(),
            is_video: true,
        }
    }
}

/// Everything the organizer knows about one source file.
///
/// Owned by exactly one worker from creation until the file is placed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileRecord {
    /// Where the file currently lives.
    pub source: PathBuf,
    /// Size in bytes.
    pub size: u64,
    /// Whole-file identity digest.
    pub digest: ContentHash,
    /// Sniffed media type.
    pub media: MediaType,
    /// Embedded capture time; `None` means undated.
    pub captured: Option<NaiveDateTime>,
}

impl FileRecord {
    /// Canonical extension (normalized, without dot).
    pub fn extension(&self) -> &str {
        self.media.tag.as_str()
    }

    /// Whether the record carries a capture time.
    pub fn is_dated(&self) -> bool {
        self.captured.is_some()
    }
}
