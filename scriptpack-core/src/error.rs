//! 打包错误类型

use std::path::PathBuf;

use scriptpack_vfs::VfsError;
use thiserror::Error;

use crate::reference::ModuleId;

/// 一个找不到的必需依赖及引用它的模块
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingModule {
    pub id: ModuleId,
    /// 引用方模块的显示名
    pub referrers: Vec<String>,
}

/// 打包过程中的致命错误
#[derive(Debug, Error)]
pub enum BundleError {
    /// 不动点之后仍有必需依赖未找到
    #[error("mandatory dependencies could not be found: {}", describe_missing(.missing))]
    MissingDependency { missing: Vec<MissingModule> },

    /// compile 依赖成环
    #[error("compile dependency cycle detected: {}", .modules.join(" -> "))]
    CompileDependencyCycle { modules: Vec<String> },

    /// 请求路径非法
    #[error("invalid request '{request}': {reason}")]
    InvalidRequest { request: String, reason: String },

    /// 请求没有匹配到任何文件
    #[error("nothing to bundle for request '{request}'")]
    NothingToBundle { request: String },

    /// 文件存在但读取失败（与“不存在”区分）
    #[error("failed to read '{}': {source}", .path.display())]
    Io { path: PathBuf, source: VfsError },

    /// 文件内容不是 UTF-8
    #[error("'{}' is not valid UTF-8", .path.display())]
    Encoding { path: PathBuf },
}

fn describe_missing(missing: &[MissingModule]) -> String {
    missing
        .iter()
        .map(|m| format!("{} (required by {})", m.id, m.referrers.join(", ")))
        .collect::<Vec<_>>()
        .join("; ")
}

pub type BundleResult<T> = Result<T, BundleError>;
