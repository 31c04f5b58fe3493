//! File permission probing

use std::fs::{File, OpenOptions};
use std::path::Path;

/// Whether a file can actually be opened for reading and writing.
///
/// Mode bits are not enough for `/proc/<pid>/mem`: it may look writable and
/// still refuse the open, so both opens are attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilePermission {
    pub readable: bool,
    pub writable: bool,
}

impl FilePermission {
    /// `None` if `path` is not an existing regular file
    pub fn probe(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        if !path.is_file() {
            return None;
        }
        let readable = File::open(path).is_ok();
        let writable = OpenOptions::new().write(true).open(path).is_ok();
        tracing::debug!(path = %path.display(), readable, writable, "probed permission");
        Some(Self { readable, writable })
    }
}
