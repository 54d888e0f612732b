//! API 类型定义
//!
//! 打包的输出类型。

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::SystemTime;

use scriptpack_core::{Bundle, Module};

/// 打包输出
#[derive(Debug, Clone, Serialize)]
pub struct BundleOutput {
    /// 拼接后的脚本
    pub text: String,
    /// 输出顺序下的模块名
    pub order: Vec<String>,
    #[serde(skip)]
    pub newest_mtime: SystemTime,
    /// 被前置的加载器脚本
    pub loader: Option<PathBuf>,
}

impl From<Bundle> for BundleOutput {
    fn from(bundle: Bundle) -> Self {
        Self {
            order: bundle.order.iter().map(ToString::to_string).collect(),
            text: bundle.text,
            newest_mtime: bundle.newest_mtime,
            loader: bundle.loader,
        }
    }
}

impl BundleOutput {
    /// HTTP `Last-Modified` 格式的最新修改时间
    pub fn last_modified(&self) -> String {
        DateTime::<Utc>::from(self.newest_mtime)
            .format("%a, %d %b %Y %H:%M:%S GMT")
            .to_string()
    }
}

/// 排序后的一个模块（`--order` 输出）
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderEntry {
    pub name: String,
    pub path: PathBuf,
    pub version: String,
    pub self_registering: bool,
    /// 元数据提取时被忽略的问题
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub diagnostics: Vec<String>,
}

impl From<&Module> for OrderEntry {
    fn from(module: &Module) -> Self {
        Self {
            name: module.key.to_string(),
            path: module.path.clone(),
            version: module.version.clone(),
            self_registering: module.is_self_registering,
            diagnostics: module.diagnostics.clone(),
        }
    }
}
