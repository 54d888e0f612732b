//! In-memory file system implementation

use crate::error::{VfsError, VfsResult};
use crate::VirtualFileSystem;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Component, Path};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;

#[derive(Debug, Clone)]
struct MemoryFile {
    content: Vec<u8>,
    modified: SystemTime,
}

/// An in-memory file system implementation.
///
/// Files are stored in a `BTreeMap` keyed by normalized path. Directories are
/// implicit: a path is a directory when at least one stored file lives below it.
/// New files get `UNIX_EPOCH` as modification time unless one is given, so
/// fixtures produce stable output.
///
/// # Example
/// ```
/// use scriptpack_vfs::{MemoryFileSystem, VirtualFileSystem};
/// use std::path::Path;
///
/// let fs = MemoryFileSystem::new();
/// fs.write_file(Path::new("/test.txt"), b"hello").unwrap();
/// let content = fs.read_file(Path::new("/test.txt")).unwrap();
/// assert_eq!(content, b"hello");
/// ```
#[derive(Debug, Clone)]
pub struct MemoryFileSystem {
    files: Arc<RwLock<BTreeMap<String, MemoryFile>>>,
}

impl MemoryFileSystem {
    /// Create a new empty memory file system.
    pub fn new() -> Self {
        Self {
            files: Arc::new(RwLock::new(BTreeMap::new())),
        }
    }

    /// Create a new memory file system pre-populated with files.
    ///
    /// # Arguments
    /// * `files` - Iterator of (path, content) tuples
    pub fn with_files<I, S>(files: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<u8>)>,
        S: AsRef<str>,
    {
        let fs = Self::new();
        if let Ok(mut map) = fs.files.write() {
            for (path, content) in files {
                map.insert(
                    normalize_path(Path::new(path.as_ref())),
                    MemoryFile {
                        content,
                        modified: SystemTime::UNIX_EPOCH,
                    },
                );
            }
        }
        fs
    }

    /// Write a file with an explicit modification time.
    pub fn write_file_at(&self, path: &Path, content: &[u8], modified: SystemTime) -> VfsResult<()> {
        let mut files = self.files.write().map_err(|_| poisoned())?;
        files.insert(
            normalize_path(path),
            MemoryFile {
                content: content.to_vec(),
                modified,
            },
        );
        Ok(())
    }

    /// Change the modification time of an existing file.
    pub fn set_modified(&self, path: &Path, modified: SystemTime) -> VfsResult<()> {
        let normalized = normalize_path(path);
        let mut files = self.files.write().map_err(|_| poisoned())?;
        match files.get_mut(&normalized) {
            Some(file) => {
                file.modified = modified;
                Ok(())
            }
            None => Err(VfsError::NotFound { path: normalized }),
        }
    }

    fn has_children(&self, normalized: &str) -> bool {
        let prefix = dir_prefix(normalized);
        match self.files.read() {
            Ok(files) => files
                .range(prefix.clone()..)
                .next()
                .is_some_and(|(key, _)| key.starts_with(&prefix)),
            Err(_) => false,
        }
    }
}

impl Default for MemoryFileSystem {
    fn default() -> Self {
        Self::new()
    }
}

/// Normalize a path for internal storage.
///
/// Forward slashes only, `.` components dropped, `..` pops the previous component.
fn normalize_path(path: &Path) -> String {
    let mut parts: Vec<String> = Vec::new();
    let mut absolute = false;
    for component in path.components() {
        match component {
            Component::RootDir => absolute = true,
            Component::CurDir | Component::Prefix(_) => {}
            Component::ParentDir => {
                parts.pop();
            }
            Component::Normal(part) => parts.push(part.to_string_lossy().replace('\\', "/")),
        }
    }
    let joined = parts.join("/");
    if absolute {
        format!("/{}", joined)
    } else {
        joined
    }
}

fn dir_prefix(normalized: &str) -> String {
    if normalized.is_empty() || normalized.ends_with('/') {
        normalized.to_string()
    } else {
        format!("{}/", normalized)
    }
}

fn poisoned() -> VfsError {
    VfsError::Custom {
        message: String::from("Lock poisoned"),
    }
}

impl VirtualFileSystem for MemoryFileSystem {
    fn read_file(&self, path: &Path) -> VfsResult<Vec<u8>> {
        let normalized = normalize_path(path);
        let files = self.files.read().map_err(|_| poisoned())?;

        files
            .get(&normalized)
            .map(|file| file.content.clone())
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn write_file(&self, path: &Path, content: &[u8]) -> VfsResult<()> {
        self.write_file_at(path, content, SystemTime::UNIX_EPOCH)
    }

    fn read_dir(&self, path: &Path) -> VfsResult<Vec<String>> {
        let normalized = normalize_path(path);
        let prefix = dir_prefix(&normalized);
        let files = self.files.read().map_err(|_| poisoned())?;

        if files.contains_key(&normalized) {
            return Err(VfsError::WrongKind {
                path: normalized,
                expected: "directory",
            });
        }

        let entries: BTreeSet<String> = files
            .range(prefix.clone()..)
            .take_while(|(key, _)| key.starts_with(&prefix))
            .filter_map(|(key, _)| key[prefix.len()..].split('/').next().map(str::to_string))
            .filter(|name| !name.is_empty())
            .collect();

        if entries.is_empty() {
            return Err(VfsError::NotFound { path: normalized });
        }
        Ok(entries.into_iter().collect())
    }

    fn modified(&self, path: &Path) -> VfsResult<SystemTime> {
        let normalized = normalize_path(path);
        let files = self.files.read().map_err(|_| poisoned())?;
        files
            .get(&normalized)
            .map(|file| file.modified)
            .ok_or(VfsError::NotFound { path: normalized })
    }

    fn exists(&self, path: &Path) -> bool {
        self.is_file(path) || self.is_dir(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        let normalized = normalize_path(path);
        match self.files.read() {
            Ok(files) => files.contains_key(&normalized),
            Err(_) => false,
        }
    }

    fn is_dir(&self, path: &Path) -> bool {
        self.has_children(&normalize_path(path))
    }
}
