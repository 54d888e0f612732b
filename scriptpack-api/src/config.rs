//! API 层配置
//!
//! 包含打包配置 BundleConfig 和全局单例（供 CLI 使用）

use once_cell::sync::OnceCell;
use scriptpack_config::{Convention, ScriptpackConfig};
use std::path::{Path, PathBuf};

use crate::error::ApiError;

/// Bundling configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleConfig {
    /// Directory request paths are resolved against
    pub root: PathBuf,
    /// Naming and metadata conventions
    pub convention: Convention,
}

impl Default for BundleConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            convention: Convention::default(),
        }
    }
}

impl BundleConfig {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ..Default::default()
        }
    }

    /// 从项目文件构建，相对的 `root` 以项目文件所在目录为基准
    pub fn from_project(project: &ScriptpackConfig, project_dir: &Path) -> Self {
        let root = match &project.root {
            Some(root) if root.is_absolute() => root.clone(),
            Some(root) => project_dir.join(root),
            None => project_dir.to_path_buf(),
        };
        Self {
            root,
            convention: project.convention.clone(),
        }
    }
}

// Global config singleton for CLI convenience
static GLOBAL_CONFIG: OnceCell<BundleConfig> = OnceCell::new();

/// Initialize global configuration (write-once)
pub fn init(config: BundleConfig) -> Result<(), ApiError> {
    GLOBAL_CONFIG
        .set(config)
        .map_err(|_| ApiError::ConfigAlreadyInitialized)
}

/// Get global config reference
pub fn config() -> Result<&'static BundleConfig, ApiError> {
    GLOBAL_CONFIG.get().ok_or(ApiError::ConfigNotInitialized)
}

/// Check if config is initialized
pub fn is_initialized() -> bool {
    GLOBAL_CONFIG.get().is_some()
}
