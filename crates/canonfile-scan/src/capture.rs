//! Capture-time extraction from embedded EXIF metadata.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use chrono::NaiveDateTime;
use exif::{In, Reader, Tag, Value};
use tracing::trace;

const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Source of a file's capture time.
///
/// Implementations return `None` whenever no usable time is available;
/// that is the normal "undated" case, not an error.
pub trait CaptureTimeReader: Send + Sync {
    fn capture_time(&self, path: &Path) -> Option<NaiveDateTime>;
}

/// Reads `DateTimeOriginal`, falling back to `DateTime`, from the primary IFD.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExifCaptureTime;

impl ExifCaptureTime {
    pub fn new() -> Self {
        Self
    }
}

impl CaptureTimeReader for ExifCaptureTime {
    fn capture_time(&self, path: &Path) -> Option<NaiveDateTime> {
        let file = File::open(path).ok()?;
        let mut reader = BufReader::new(file);

        let exif = match Reader::new().read_from_container(&mut reader) {
            Ok(exif) => exif,
            Err(err) => {
                trace!(path = %path.display(), %err, "no exif data");
                return None;
            }
        };

        [Tag::DateTimeOriginal, Tag::DateTime]
            .into_iter()
            .filter_map(|tag| exif.get_field(tag, In::PRIMARY))
            .find_map(|field| ascii_value(&field.value).and_then(|s| parse_exif_datetime(&s)))
    }
}

fn ascii_value(value: &Value) -> Option<String> {
    match value {
        Value::Ascii(parts) => parts
            .first()
            .map(|raw| String::from_utf8_lossy(raw).trim_end_matches('\0').to_string()),
        _ => None,
    }
}

/// Parse an EXIF `YYYY:MM:DD HH:MM:SS` timestamp.
///
/// The result carries no time zone; EXIF stores camera-local wall time.
pub fn parse_exif_datetime(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), EXIF_DATETIME_FORMAT).ok()
}
