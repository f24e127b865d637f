//! Media type detection from file headers and extensions.

use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use image::ImageFormat;
use tracing::trace;

use canonfile_core::MediaType;

/// Extensions treated as video, lower-case without the dot.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "m4v"];

/// Bytes read from the start of a file for header detection.
const HEADER_LEN: usize = 32;

/// Decides whether a file is a supported media file.
pub trait TypeSniffer: Send + Sync {
    /// `None` means "not media": the organizer skips the file.
    fn sniff(&self, path: &Path) -> Option<MediaType>;
}

/// Recognizes JPEG and PNG by magic bytes, videos by extension.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderSniffer;

impl HeaderSniffer {
    pub fn new() -> Self {
        Self
    }
}

impl TypeSniffer for HeaderSniffer {
    fn sniff(&self, path: &Path) -> Option<MediaType> {
        let header = match read_header(path) {
            Ok(header) => header,
            Err(err) => {
                trace!(path = %path.display(), %err, "cannot read header");
                return None;
            }
        };

        if let Some(tag) = image_tag(&header) {
            return Some(MediaType::image(tag));
        }

        normalized_extension(path)
            .filter(|ext| is_video_extension(ext))
            .map(MediaType::video)
    }
}

fn read_header(path: &Path) -> io::Result<Vec<u8>> {
    let file = File::open(path)?;
    let mut header = Vec::with_capacity(HEADER_LEN);
    file.take(HEADER_LEN as u64).read_to_end(&mut header)?;
    Ok(header)
}

fn image_tag(header: &[u8]) -> Option<&'static str> {
    match image::guess_format(header) {
        Ok(ImageFormat::Jpeg) => Some("jpeg"),
        Ok(ImageFormat::Png) => Some("png"),
        _ => None,
    }
}

/// Lower-cased extension of `path`, without the dot.
pub fn normalized_extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.to_ascii_lowercase())
}

/// Whether a normalized extension names a video container.
pub fn is_video_extension(ext: &str) -> bool {
    VIDEO_EXTENSIONS.contains(&ext)
}
