//! Moving and copying files into their canonical path.

use std::fs::{self, File};
use std::io::{self, ErrorKind};
use std::path::Path;

use tracing::{debug, warn};

/// Copy `source` to a new file at `dest` and flush it to disk.
///
/// Fails if `dest` already exists. A partially written `dest` is removed
/// before the error is returned. Returns the number of bytes copied.
pub fn copy_file(source: &Path, dest: &Path) -> io::Result<u64> {
    let mut reader = File::open(source)?;
    let mut writer = File::create_new(dest)?;
    let copied = io::copy(&mut reader, &mut writer).and_then(|bytes| {
        writer.sync_all()?;
        Ok(bytes)
    });
    if copied.is_err() {
        drop(writer);
        if let Err(err) = fs::remove_file(dest) {
            warn!(path = %dest.display(), %err, "cannot remove partial copy");
        }
    }
    copied
}

/// Move `source` to `dest`.
///
/// Renames when possible. When source and destination live on different
/// filesystems the file is copied, flushed, and the source removed.
pub fn move_file(source: &Path, dest: &Path) -> io::Result<()> {
    match fs::rename(source, dest) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::CrossesDevices => {
            debug!(
                from = %source.display(),
                to = %dest.display(),
                "rename crosses devices, copying"
            );
            copy_file(source, dest)?;
            fs::remove_file(source)
        }
        Err(e) => Err(e),
    }
}
