//! Scriptpack Core - module resolution and bundling (no terminal output)
//!
//! Contains the literal decoder, metadata extraction, file discovery,
//! dependency graph, weight assignment, ordering and bundle emission.
//! All file access goes through an injected `VirtualFileSystem`.
//!
//! Configuration is passed explicitly via parameters, not via global state.
//!
//! # Usage
//! ```
//! use scriptpack_core::{Bundler, Convention};
//! use scriptpack_vfs::{MemoryFileSystem, VirtualFileSystem};
//! use std::path::Path;
//!
//! let fs = MemoryFileSystem::new();
//! fs.write_file(Path::new("/js/0_a.js"), b"((c, id, v, ver, Script) => {})();").unwrap();
//!
//! let bundler = Bundler::new(Box::new(fs), "/", Convention::default());
//! let bundle = bundler.bundle_path("js/1.js").unwrap();
//! assert!(bundle.text.ends_with("\n_jsUtilsLoader.exec();"));
//! ```

pub mod discovery;
pub mod emit;
pub mod error;
pub mod graph;
pub mod literal;
pub mod mask;
pub mod metadata;
pub mod module;
pub mod order;
pub mod reference;
pub mod request;
pub mod weight;

use std::path::{Path, PathBuf};

use scriptpack_vfs::VirtualFileSystem;
use tracing::instrument;

// Re-export common types
pub use discovery::{Discovery, FileDiscovery, Unresolved, UnresolvedSet};
pub use emit::{Bundle, BundleEmitter};
pub use error::{BundleError, BundleResult, MissingModule};
pub use graph::DependencyGraphBuilder;
pub use mask::BitMask;
pub use metadata::ModuleMetadata;
pub use module::{Dependencies, Module, ModuleKey, ModuleSet};
pub use reference::{DependencyKind, DependencySpec, ModuleId};
pub use request::{CategoryMask, Request};

// Re-export config types from scriptpack-config
pub use scriptpack_config::{Convention, Phase};

/// 打包入口：发现、建图、赋权、排序、输出
pub struct Bundler {
    vfs: Box<dyn VirtualFileSystem>,
    root: PathBuf,
    convention: Convention,
}

impl Bundler {
    /// # Arguments
    /// * `vfs` - 虚拟文件系统
    /// * `root` - 请求路径的根目录
    /// * `convention` - 命名与元数据约定
    pub fn new(vfs: Box<dyn VirtualFileSystem>, root: impl AsRef<Path>, convention: Convention) -> Self {
        Self {
            vfs,
            root: root.as_ref().to_path_buf(),
            convention,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn convention(&self) -> &Convention {
        &self.convention
    }

    /// 解析相对于根目录的请求路径
    pub fn request(&self, path: &str) -> BundleResult<Request> {
        Request::parse(&self.root, path, &self.convention)
    }

    /// 构建并排序模块集合
    #[instrument(target = "scriptpack::graph", level = "info", skip_all, fields(request = %request))]
    pub fn resolve(&self, request: &Request) -> BundleResult<ModuleSet> {
        let mut set = DependencyGraphBuilder::new(self.vfs.as_ref(), &self.convention).build(request)?;
        weight::assign(&mut set)?;
        order::sort(&mut set);
        Ok(set)
    }

    /// 生成打包结果
    pub fn bundle(&self, request: &Request) -> BundleResult<Bundle> {
        let set = self.resolve(request)?;
        BundleEmitter::new(self.vfs.as_ref(), &self.convention).emit(&set)
    }

    /// 解析请求路径并打包
    pub fn bundle_path(&self, path: &str) -> BundleResult<Bundle> {
        let request = self.request(path)?;
        self.bundle(&request)
    }
}
