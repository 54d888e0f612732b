//! VirtualFileSystem trait definition

use crate::error::VfsResult;
use std::path::Path;
use std::time::SystemTime;

/// Virtual File System trait
///
/// Provides a unified interface for file operations, decoupling module
/// discovery from a specific file system implementation.
///
/// # Implementations
/// - `MemoryFileSystem`: In-memory file system
/// - `NativeFileSystem`: Native OS file system
pub trait VirtualFileSystem: Send + Sync {
    /// Read file contents
    ///
    /// # Returns
    /// File contents as bytes, `VfsError::NotFound` if the file is absent
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>>;

    /// Write file contents
    ///
    /// Creates the file if it doesn't exist, truncates it if it does.
    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()>;

    /// List the entry names (files and sub-directories) directly inside `path`.
    ///
    /// Names are returned sorted so that callers iterate deterministically.
    fn read_dir(&self, path: &Path) -> VfsResult<Vec<String>>;

    /// Last modification time of a file
    fn modified(&self, path: &Path) -> VfsResult<SystemTime>;

    /// Check if path exists
    fn exists(&self, path: &Path) -> bool;

    /// Check if path exists and is a file
    fn is_file(&self, path: &Path) -> bool;

    /// Check if path exists and is a directory
    fn is_dir(&self, path: &Path) -> bool;
}

impl<T: VirtualFileSystem + ?Sized> VirtualFileSystem for Box<T> {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        (**self).read_file(path)
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        (**self).write_file(path, content)
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<String>> {
        (**self).read_dir(path)
    }

    fn modified(&self, path: &Path) -> VfsResult<SystemTime> {
        (**self).modified(path)
    }

    fn exists(&self, path: &Path) -> bool {
        (**self).exists(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        (**self).is_file(path)
    }

    fn is_dir(&self, path: &Path) -> bool {
        (**self).is_dir(path)
    }
}
