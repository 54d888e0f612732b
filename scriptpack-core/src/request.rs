//! 打包请求
//!
//! 请求路径 `dir/[name:]mask.js` 表示按位掩码（或通配符 `*`）选取 `dir` 默认分类下的模块；
//! 其他路径视为对单个文件的直接请求。

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Component, Path, PathBuf};

use scriptpack_config::Convention;

use crate::error::{BundleError, BundleResult};
use crate::mask::BitMask;
use crate::reference::ModuleId;

/// 某个分类的选取掩码
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryMask {
    /// 分类下全部模块
    All,
    /// 第 `sub_id` 位置位的模块（来自请求路径）
    Bits(BitMask),
    /// 明确列出的编号（来自未解析的依赖），编号可以很大
    Ids(BTreeSet<u32>),
}

impl CategoryMask {
    /// 解析十进制掩码或通配符
    pub fn parse(text: &str, convention: &Convention) -> Option<Self> {
        if text == convention.wildcard {
            Some(CategoryMask::All)
        } else {
            BitMask::from_decimal(text).map(CategoryMask::Bits)
        }
    }

    pub fn includes(&self, sub_id: u32) -> bool {
        match self {
            CategoryMask::All => true,
            CategoryMask::Bits(mask) => mask.contains(sub_id as usize),
            CategoryMask::Ids(ids) => ids.contains(&sub_id),
        }
    }
}

/// 发现请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// 单个文件
    File(PathBuf),
    /// 目录加按分类的掩码
    Masks {
        dir: PathBuf,
        /// 请求中的逻辑名，注入到加载器脚本
        name: Option<String>,
        masks: BTreeMap<String, CategoryMask>,
    },
}

impl Request {
    /// 解析相对于 `root` 的请求路径
    ///
    /// 路径中不允许出现 `..`。
    pub fn parse(root: &Path, request: &str, convention: &Convention) -> BundleResult<Self> {
        let invalid = |reason: &str| BundleError::InvalidRequest {
            request: request.to_string(),
            reason: reason.to_string(),
        };

        let relative = Path::new(request.trim_start_matches('/'));
        if relative.components().any(|c| matches!(c, Component::ParentDir)) {
            return Err(invalid("parent directory components are not allowed"));
        }
        let Some(file_name) = relative.file_name().and_then(|n| n.to_str()) else {
            return Err(invalid("request does not name a file"));
        };

        let dir = match relative.parent() {
            Some(parent) => root.join(parent),
            None => root.to_path_buf(),
        };

        match parse_mask_name(file_name, convention) {
            Some((name, mask)) => {
                let mut masks = BTreeMap::new();
                masks.insert(convention.default_category.clone(), mask);
                Ok(Request::Masks { dir, name, masks })
            }
            None => Ok(Request::File(root.join(relative))),
        }
    }

    /// 覆盖给定编号的请求
    pub fn for_ids<'a>(dir: &Path, ids: impl IntoIterator<Item = &'a ModuleId>) -> Self {
        let mut grouped: BTreeMap<String, BTreeSet<u32>> = BTreeMap::new();
        for id in ids {
            grouped.entry(id.category.clone()).or_default().insert(id.sub_id);
        }
        Request::Masks {
            dir: dir.to_path_buf(),
            name: None,
            masks: grouped
                .into_iter()
                .map(|(category, ids)| (category, CategoryMask::Ids(ids)))
                .collect(),
        }
    }

    /// 请求所在目录，依赖按此目录解析
    pub fn dir(&self) -> &Path {
        match self {
            Request::File(path) => path.parent().unwrap_or(Path::new("")),
            Request::Masks { dir, .. } => dir,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Request::File(_) => None,
            Request::Masks { name, .. } => name.as_deref(),
        }
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Request::File(path) => write!(f, "{}", path.display()),
            Request::Masks { dir, name, masks } => {
                write!(f, "{}", dir.display())?;
                if let Some(name) = name {
                    write!(f, " as '{}'", name)?;
                }
                for (category, mask) in masks {
                    match mask {
                        CategoryMask::All => write!(f, " {}:*", category)?,
                        CategoryMask::Bits(bits) => write!(f, " {}:{:?}", category, bits)?,
                        CategoryMask::Ids(ids) => write!(f, " {}:{:?}", category, ids)?,
                    }
                }
                Ok(())
            }
        }
    }
}

/// 匹配 `[name:]mask.ext`
fn parse_mask_name(file_name: &str, convention: &Convention) -> Option<(Option<String>, CategoryMask)> {
    let stem = file_name
        .strip_suffix(convention.extension.as_str())?
        .strip_suffix('.')?;
    let (name, mask) = match stem.rsplit_once(':') {
        Some((name, mask)) if !name.is_empty() && !name.contains(':') => (Some(name.to_string()), mask),
        Some(_) => return None,
        None => (None, stem),
    };
    let mask = CategoryMask::parse(mask, convention)?;
    Some((name, mask))
}
