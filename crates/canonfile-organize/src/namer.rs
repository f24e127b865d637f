//! Canonical destination naming.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

use canonfile_core::{ContentHash, FileRecord};

/// Bucket for files without a capture time.
pub const UNDATED_BUCKET: &str = "Anarchs";

/// Bucket for undated videos when media kinds are separated.
pub const VIDEO_BUCKET: &str = "Videos";

const BUCKET_FORMAT: &str = "%Y%b";
const DAY_TIME_FORMAT: &str = "%d_%H%M";

/// Digest bytes kept in the short name of a dated file.
pub const DATED_PREFIX_BYTES: usize = 4;

/// Digest bytes kept in the short name of an undated file.
pub const UNDATED_PREFIX_BYTES: usize = 8;

/// Where a file belongs under the destination root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalLocation {
    /// Bucket directory, already joined onto the destination root.
    pub bucket: PathBuf,
    /// Base name using the truncated digest. This is the name written to disk.
    pub short_name: String,
    /// Base name using the full digest. Never written.
    pub long_name: String,
    /// Extension without the dot.
    pub extension: String,
}

impl CanonicalLocation {
    /// Full path of the file as it is stored.
    pub fn short_path(&self) -> PathBuf {
        self.bucket
            .join(format!("{}.{}", self.short_name, self.extension))
    }

    /// Glob matching every existing entry whose name starts with the short name.
    ///
    /// The bucket part is escaped, so destination roots containing `[`, `*`
    /// or `?` are matched literally.
    pub fn glob_pattern(&self) -> String {
        let dir = glob::Pattern::escape(&self.bucket.to_string_lossy());
        Path::new(&dir)
            .join(format!("{}*", self.short_name))
            .to_string_lossy()
            .into_owned()
    }
}

/// Maps digest, extension and capture time to a [`CanonicalLocation`].
#[derive(Debug, Clone)]
pub struct Namer {
    destination: PathBuf,
    separate_videos: bool,
}

impl Namer {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            separate_videos: true,
        }
    }

    /// Send undated videos to [`VIDEO_BUCKET`] instead of [`UNDATED_BUCKET`].
    pub fn with_separate_videos(mut self, separate: bool) -> Self {
        self.separate_videos = separate;
        self
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Bucket directory name (relative to the destination root).
    pub fn bucket_name(&self, captured: Option<NaiveDateTime>, is_video: bool) -> String {
        match captured {
            Some(time) => time.format(BUCKET_FORMAT).to_string(),
            None if is_video && self.separate_videos => VIDEO_BUCKET.to_string(),
            None => UNDATED_BUCKET.to_string(),
        }
    }

    pub fn locate(
        &self,
        digest: &ContentHash,
        extension: &str,
        captured: Option<NaiveDateTime>,
        is_video: bool,
    ) -> CanonicalLocation {
        let bucket = self.destination.join(self.bucket_name(captured, is_video));
        let full = digest.to_hex();

        let (short_name, long_name) = match captured {
            Some(time) => {
                let stamp = time.format(DAY_TIME_FORMAT);
                (
                    format!("{stamp}_{}", digest.prefix_hex(DATED_PREFIX_BYTES)),
                    format!("{stamp}_{full}"),
                )
            }
            None => (digest.prefix_hex(UNDATED_PREFIX_BYTES), full),
        };

        CanonicalLocation {
            bucket,
            short_name,
            long_name,
            extension: extension.to_string(),
        }
    }

    pub fn locate_record(&self, record: &FileRecord) -> CanonicalLocation {
        self.locate(
            &record.digest,
            record.extension(),
            record.captured,
            record.media.is_video,
        )
    }
}
