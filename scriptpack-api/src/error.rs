//! API 错误类型
//!
//! 提供统一的错误类型和结构化错误报告。

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

pub use scriptpack_core::{BundleError, MissingModule};

/// Scriptpack 错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    /// 打包错误
    #[error(transparent)]
    Bundle(#[from] BundleError),

    /// 项目文件读取或解析失败
    #[error("invalid project file '{}': {message}", .path.display())]
    Config { path: PathBuf, message: String },

    #[error("configuration already initialized")]
    ConfigAlreadyInitialized,

    #[error("configuration not initialized")]
    ConfigNotInitialized,
}

impl ApiError {
    /// 获取错误阶段名称
    pub fn phase(&self) -> &'static str {
        match self {
            ApiError::Bundle(err) => match err {
                BundleError::InvalidRequest { .. } => "request",
                BundleError::NothingToBundle { .. } => "discovery",
                BundleError::MissingDependency { .. } => "graph",
                BundleError::CompileDependencyCycle { .. } => "weight",
                BundleError::Io { .. } | BundleError::Encoding { .. } => "io",
            },
            ApiError::Config { .. }
            | ApiError::ConfigAlreadyInitialized
            | ApiError::ConfigNotInitialized => "config",
        }
    }

    /// 错误类型名（可用于程序化处理）
    pub fn kind(&self) -> &'static str {
        match self {
            ApiError::Bundle(err) => match err {
                BundleError::MissingDependency { .. } => "MissingDependency",
                BundleError::CompileDependencyCycle { .. } => "CompileDependencyCycle",
                BundleError::InvalidRequest { .. } => "InvalidRequest",
                BundleError::NothingToBundle { .. } => "NothingToBundle",
                BundleError::Io { .. } => "Io",
                BundleError::Encoding { .. } => "Encoding",
            },
            ApiError::Config { .. } => "InvalidConfig",
            ApiError::ConfigAlreadyInitialized => "ConfigAlreadyInitialized",
            ApiError::ConfigNotInitialized => "ConfigNotInitialized",
        }
    }

    /// 转换为结构化错误报告
    ///
    /// CLI 可以直接打印，上层应用可以序列化为 JSON。
    ///
    /// # Example
    /// ```ignore
    /// match scriptpack_api::bundle("js/*.js", &config) {
    ///     Err(e) => eprintln!("{}", e.to_report().to_json()),
    ///     Ok(output) => print!("{}", output.text),
    /// }
    /// ```
    pub fn to_report(&self) -> ErrorReport {
        let (modules, path) = match self {
            ApiError::Bundle(BundleError::MissingDependency { missing }) => {
                (missing.iter().map(|m| m.id.to_string()).collect(), None)
            }
            ApiError::Bundle(BundleError::CompileDependencyCycle { modules }) => {
                (modules.clone(), None)
            }
            ApiError::Bundle(BundleError::Io { path, .. })
            | ApiError::Bundle(BundleError::Encoding { path })
            | ApiError::Config { path, .. } => (Vec::new(), Some(path.display().to_string())),
            _ => (Vec::new(), None),
        };
        ErrorReport {
            phase: self.phase(),
            error_kind: self.kind().to_string(),
            message: self.to_string(),
            modules,
            path,
        }
    }
}

/// 结构化错误报告
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorReport {
    /// 错误阶段: request, discovery, graph, weight, io, config
    pub phase: &'static str,
    pub error_kind: String,
    /// 人类可读的错误消息
    pub message: String,
    /// 涉及的模块（缺失的依赖或成环路径）
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub modules: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl std::fmt::Display for ErrorReport {
    /// 默认的 CLI 友好格式
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.phase, self.error_kind, self.message)
    }
}

impl ErrorReport {
    /// 转换为 JSON 格式
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{{\"message\":{:?}}}", self.message))
    }

    /// 简洁格式（适合终端）
    pub fn to_short(&self) -> String {
        format!("{}: {}", self.phase, self.message)
    }
}
