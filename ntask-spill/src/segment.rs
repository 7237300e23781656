//! Spill file descriptors.

use std::fs;
use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::SpillError;

/// End offsets of one partition inside a spill file.
///
/// `uncompressed_end_offset` counts raw bytes, `real_end_offset` counts the
/// bytes actually on disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IFileSegment {
    pub uncompressed_end_offset: u64,
    pub real_end_offset: u64,
}

impl IFileSegment {
    pub fn new(uncompressed_end_offset: u64, real_end_offset: u64) -> Self {
        Self {
            uncompressed_end_offset,
            real_end_offset,
        }
    }
}

/// One spill file and its per-partition segments, in partition order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpillInfo {
    pub path: PathBuf,
    pub segments: Vec<IFileSegment>,
}

impl SpillInfo {
    pub fn new(path: impl Into<PathBuf>, segments: Vec<IFileSegment>) -> Self {
        Self {
            path: path.into(),
            segments,
        }
    }

    /// Bytes this spill occupies on disk.
    pub fn real_length(&self) -> u64 {
        self.segments.last().map_or(0, |s| s.real_end_offset)
    }

    /// Removes the spill file if it exists.
    ///
    /// Returns `true` when a file was removed. An empty path or a missing
    /// file is not an error.
    pub fn delete_file(&self) -> Result<bool, SpillError> {
        if self.path.as_os_str().is_empty() {
            return Ok(false);
        }
        match fs::metadata(&self.path) {
            Ok(_) => {
                fs::remove_file(&self.path)?;
                debug!(path = %self.path.display(), "spill file removed");
                Ok(true)
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_file_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spill0.out");
        fs::write(&path, b"records").unwrap();

        let spill = SpillInfo::new(&path, vec![IFileSegment::new(7, 7)]);
        assert!(spill.delete_file().unwrap());
        assert!(!path.exists());
        assert!(!spill.delete_file().unwrap());

        assert!(!SpillInfo::default().delete_file().unwrap());
    }

    #[test]
    fn real_length_is_last_segment_end() {
        let spill = SpillInfo::new(
            "spill1.out",
            vec![IFileSegment::new(100, 90), IFileSegment::new(250, 200)],
        );
        assert_eq!(spill.real_length(), 200);
        assert_eq!(SpillInfo::default().real_length(), 0);
    }
}
