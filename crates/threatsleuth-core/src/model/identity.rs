/// The deduplication key for a scanned file.
///
/// A file is identified by its full path plus its size in bytes at the time
/// it was observed. Two scans of an unchanged file produce equal identities,
/// so the registry can tell a rescan apart from a new file.
///
/// # Known limitation
///
/// There is no content hash. An in-place edit that keeps the size produces
/// the same identity and is not re-evaluated; a rename produces a new one.
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct FileIdentity {
    /// Full path of the file as reported by the walker.
    pub path: PathBuf,
    /// Logical size in bytes; `0` when the size could not be read.
    pub size: u64,
}

impl FileIdentity {
    pub fn new(path: impl Into<PathBuf>, size: u64) -> Self {
        Self {
            path: path.into(),
            size,
        }
    }

    /// Build an identity by stat-ing `path` now.
    ///
    /// Returns the identity together with a flag that is `false` when the
    /// metadata could not be read (the file vanished or is inaccessible),
    /// in which case the size is recorded as `0`.
    pub fn observe(path: &Path) -> (Self, bool) {
        match std::fs::metadata(path) {
            Ok(meta) => (Self::new(path, meta.len()), true),
            Err(_) => (Self::new(path, 0), false),
        }
    }
}
