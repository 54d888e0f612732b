//! Native file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::path::Path;
use std::time::SystemTime;

/// A native OS file system implementation.
///
/// This wraps `std::fs` operations and provides the `VirtualFileSystem`
/// interface for local file access.
///
/// # Example
/// ```
/// use scriptpack_vfs::{NativeFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = NativeFileSystem::new();
/// assert!(fs.is_dir(Path::new(".")));
/// ```
#[derive(Debug, Clone, Default)]
pub struct NativeFileSystem;

impl NativeFileSystem {
    /// Create a new native file system.
    pub fn new() -> Self {
        Self
    }
}

impl VirtualFileSystem for NativeFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        std::fs::read(path).map_err(|e| VfsError::from_io(e, path))
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        std::fs::write(path, content).map_err(|e| VfsError::from_io(e, path))
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<String>> {
        if path.is_file() {
            return Err(VfsError::WrongKind {
                path: path.to_string_lossy().to_string(),
                expected: "directory",
            });
        }
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path).map_err(|e| VfsError::from_io(e, path))? {
            let entry = entry?;
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        names.sort();
        Ok(names)
    }

    fn modified(&self, path: &Path) -> VfsResult<SystemTime> {
        let metadata = std::fs::metadata(path).map_err(|e| VfsError::from_io(e, path))?;
        Ok(metadata.modified()?)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }
}
