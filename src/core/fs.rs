//! File-system surface consumed by the validator, applier and rollback stack.
//!
//! All failures are reported through [`PatchWardenError`], with `NotFound` and
//! `PermissionDenied` mapped onto their dedicated variants.

use crate::core::error::{PatchWardenError, Result};
use std::path::Path;

pub trait FileSystem: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
    fn read_all(&self, path: &Path) -> Result<Vec<u8>>;
    fn write_all(&self, path: &Path, bytes: &[u8]) -> Result<()>;

    /// Read a file and decode it as UTF-8 text
    fn read_text(&self, path: &Path) -> Result<String> {
        let bytes = self.read_all(path)?;
        String::from_utf8(bytes).map_err(|_| PatchWardenError::InvalidUtf8 {
            path: path.to_path_buf(),
        })
    }
}

/// [`FileSystem`] backed by `std::fs`
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFs;

impl FileSystem for LocalFs {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read_all(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|e| PatchWardenError::from_io(path, e))
    }

    fn write_all(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        std::fs::write(path, bytes).map_err(|e| PatchWardenError::from_io(path, e))
    }
}
