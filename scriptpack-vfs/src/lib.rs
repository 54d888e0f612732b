//! Scriptpack Virtual File System
//!
//! A small file system abstraction with an in-memory and a native backend.
//! The resolver only ever reads through it, which keeps module discovery
//! testable against in-memory fixtures.
//!
//! # Usage
//! ```rust
//! use scriptpack_vfs::{MemoryFileSystem, VirtualFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.write_file(Path::new("/lib/0_core.js"), b"/* core */").unwrap();
//! assert!(fs.is_dir(Path::new("/lib")));
//! assert_eq!(fs.read_dir(Path::new("/lib")).unwrap(), vec!["0_core.js".to_string()]);
//! ```

mod error;
mod memory;
mod native;
mod r#trait;

pub use error::{VfsError, VfsResult};
pub use memory::MemoryFileSystem;
pub use native::NativeFileSystem;
pub use r#trait::VirtualFileSystem;

/// Create a new memory-based file system.
pub fn memory_fs() -> MemoryFileSystem {
    MemoryFileSystem::new()
}

/// Create a new native file system.
pub fn native_fs() -> NativeFileSystem {
    NativeFileSystem::new()
}
